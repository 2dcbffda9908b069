//! Task model: validation rules and the sort-key selector.
//!
//! A task is a flat record — no relationships, no state machine. The only
//! decision logic here is `TaskSort`, which maps the `?sort=` query token
//! to an `ORDER BY` clause over the full collection.

/// Minimum title length in characters.
pub const TITLE_MIN_CHARS: usize = 2;
/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Field-level validation messages, keyed by field.
///
/// Only `title` has rules today; the struct keeps the door open for more
/// fields without changing the store API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub title: Vec<String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
    }
}

/// Validate a task title against the persistence invariants.
///
/// Blank (empty or whitespace-only) short-circuits the length rules, so a
/// blank title reports exactly one message. Length is counted in Unicode
/// scalar values, not bytes.
pub fn validate_title(title: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if title.trim().is_empty() {
        errors.title.push("The title cannot be empty".to_string());
    } else {
        let len = title.chars().count();
        if len < TITLE_MIN_CHARS {
            errors.title.push(format!(
                "The title must contain at least {TITLE_MIN_CHARS} characters"
            ));
        } else if len > TITLE_MAX_CHARS {
            errors.title.push(format!(
                "The title cannot exceed {TITLE_MAX_CHARS} characters"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Ordering applied to the full task list.
///
/// Unrecognized or absent tokens fall back to `DateDesc` silently — a
/// permissive policy, not a validation gate. Sorting never filters: every
/// variant returns the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Oldest first.
    DateAsc,
    /// Newest first (default).
    #[default]
    DateDesc,
    /// Completed tasks first, newest first within each group.
    StatusDone,
    /// Pending tasks first, newest first within each group.
    StatusPending,
}

impl TaskSort {
    /// Map an optional query token to an ordering. Never fails.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("date_asc") => Self::DateAsc,
            Some("date_desc") => Self::DateDesc,
            Some("status_done") => Self::StatusDone,
            Some("status_pending") => Self::StatusPending,
            _ => Self::default(),
        }
    }

    /// Canonical token for this ordering, used to render sort links.
    pub fn token(self) -> &'static str {
        match self {
            Self::DateAsc => "date_asc",
            Self::DateDesc => "date_desc",
            Self::StatusDone => "status_done",
            Self::StatusPending => "status_pending",
        }
    }

    /// Static `ORDER BY` fragment for this ordering.
    ///
    /// `created_at` is an RFC 3339 UTC string, so lexicographic order is
    /// chronological order. `id` breaks timestamp ties in creation order
    /// (ids are monotonic).
    pub fn order_clause(self) -> &'static str {
        match self {
            Self::DateAsc => "created_at ASC, id ASC",
            Self::DateDesc => "created_at DESC, id DESC",
            Self::StatusDone => "is_done DESC, created_at DESC, id DESC",
            Self::StatusPending => "is_done ASC, created_at DESC, id DESC",
        }
    }

    /// Human label for the sort links on the index page.
    pub fn label(self) -> &'static str {
        match self {
            Self::DateAsc => "Oldest first",
            Self::DateDesc => "Newest first",
            Self::StatusDone => "Done first",
            Self::StatusPending => "Pending first",
        }
    }

    /// All orderings, in the order they appear in the UI.
    pub fn all() -> [TaskSort; 4] {
        [
            Self::DateDesc,
            Self::DateAsc,
            Self::StatusDone,
            Self::StatusPending,
        ]
    }
}
