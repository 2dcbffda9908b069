//! Request-to-struct decoding for the task form.
//!
//! The new and edit pages submit the same fields. Normalization happens
//! here, before validation: the title is trimmed, a whitespace-only
//! description becomes `None`, and the checkbox decodes to a plain bool.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw checkbox value — absent when unchecked, "on"/"true"/"1" when set.
    #[serde(default)]
    pub is_done: Option<String>,
    /// Anti-forgery token for the `task-form` intent.
    #[serde(rename = "_token", default)]
    pub token: Option<String>,
}

impl TaskForm {
    pub fn title(&self) -> &str {
        self.title.trim()
    }

    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    pub fn is_done(&self) -> bool {
        matches!(self.is_done.as_deref(), Some("true" | "on" | "1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed() {
        let form = TaskForm {
            title: "  Buy milk  ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.title(), "Buy milk");
    }

    #[test]
    fn blank_description_becomes_none() {
        for raw in [None, Some("".to_string()), Some("   ".to_string())] {
            let form = TaskForm {
                description: raw.clone(),
                ..Default::default()
            };
            assert_eq!(form.description(), None, "raw {raw:?}");
        }
        let form = TaskForm {
            description: Some("  details  ".to_string()),
            ..Default::default()
        };
        assert_eq!(form.description(), Some("details"));
    }

    #[test]
    fn checkbox_decodes_to_bool() {
        for (raw, expected) in [
            (None, false),
            (Some(""), false),
            (Some("off"), false),
            (Some("on"), true),
            (Some("true"), true),
            (Some("1"), true),
        ] {
            let form = TaskForm {
                is_done: raw.map(str::to_string),
                ..Default::default()
            };
            assert_eq!(form.is_done(), expected, "raw {raw:?}");
        }
    }
}
