//! Server-rendered HTML pages.
//!
//! Plain string building over an `escape` helper — the UI is five small
//! pages, not worth a template engine. Every user-sourced value goes
//! through `escape` before it reaches markup.

use crate::storage::TaskRow;
use crate::task::TaskSort;
use crate::web::csrf::{self, TokenSigner};

/// Escape a value for inclusion in HTML text or attribute position.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Map a `notice` query code (carried across redirects) to its banner text.
/// Unknown codes render nothing — the parameter is user-controlled.
fn notice_message(code: &str) -> Option<&'static str> {
    match code {
        "created" => Some("Task created successfully."),
        "updated" => Some("Task updated successfully."),
        "deleted" => Some("Task deleted successfully."),
        "completed" => Some("Task marked as done."),
        "reopened" => Some("Task marked as pending."),
        _ => None,
    }
}

fn layout(title: &str, notice: Option<&str>, body: &str) -> String {
    let banner = notice
        .and_then(notice_message)
        .map(|msg| format!("<p class=\"notice\">{msg}</p>"))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} — taskboard</title>\n</head>\n<body>\n\
         <header><h1><a href=\"/task\">taskboard</a></h1></header>\n\
         {banner}\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn status_badge(task: &TaskRow) -> &'static str {
    if task.is_done {
        "<span class=\"badge done\">done</span>"
    } else {
        "<span class=\"badge pending\">pending</span>"
    }
}

pub fn index(tasks: &[TaskRow], sort: TaskSort, notice: Option<&str>) -> String {
    let mut body = String::new();

    body.push_str("<nav class=\"sort\">Sort: ");
    for option in TaskSort::all() {
        if option == sort {
            body.push_str(&format!("<strong>{}</strong> ", option.label()));
        } else {
            body.push_str(&format!(
                "<a href=\"/task?sort={}\">{}</a> ",
                option.token(),
                option.label()
            ));
        }
    }
    body.push_str("</nav>\n");

    body.push_str("<p><a href=\"/task/new\">New task</a></p>\n");

    if tasks.is_empty() {
        body.push_str("<p>No tasks yet.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Status</th><th>Title</th><th>Created</th><th></th></tr>\n");
        for task in tasks {
            body.push_str(&format!(
                "<tr><td>{badge}</td>\
                 <td><a href=\"/task/{id}\">{title}</a></td>\
                 <td>{created}</td>\
                 <td><a href=\"/task/{id}/toggle\">{action}</a></td></tr>\n",
                badge = status_badge(task),
                id = task.id,
                title = escape(&task.title),
                created = escape(&task.created_at),
                action = if task.is_done { "reopen" } else { "done" },
            ));
        }
        body.push_str("</table>\n");
    }

    layout("Tasks", notice, &body)
}

pub fn detail(task: &TaskRow, notice: Option<&str>, signer: &TokenSigner) -> String {
    let description = task
        .description
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "<em>no description</em>".to_string());
    let delete_token = signer.issue(&csrf::delete_intent(task.id));

    let body = format!(
        "<h2>{title} {badge}</h2>\n\
         <p>{description}</p>\n\
         <p>Created: {created}</p>\n\
         <p>\
         <a href=\"/task/{id}/toggle\">{toggle}</a> · \
         <a href=\"/task/{id}/edit\">Edit</a>\
         </p>\n\
         <form method=\"post\" action=\"/task/{id}/delete\">\
         <input type=\"hidden\" name=\"_token\" value=\"{delete_token}\">\
         <button type=\"submit\">Delete</button>\
         </form>\n\
         <p><a href=\"/task\">Back to list</a></p>\n",
        title = escape(&task.title),
        badge = status_badge(task),
        created = escape(&task.created_at),
        id = task.id,
        toggle = if task.is_done {
            "Mark as pending"
        } else {
            "Mark as done"
        },
    );

    layout(&task.title, notice, &body)
}

/// Shared new/edit form. `action` is the POST target, `heading` the page
/// title. On validation failure the submitted values come back pre-filled
/// with the field errors rendered inline.
#[allow(clippy::too_many_arguments)]
pub fn task_form(
    action: &str,
    heading: &str,
    title: &str,
    description: &str,
    is_done: bool,
    title_errors: &[String],
    form_error: Option<&str>,
    signer: &TokenSigner,
) -> String {
    let token = signer.issue(csrf::FORM_INTENT);

    let mut body = format!("<h2>{}</h2>\n", escape(heading));
    if let Some(err) = form_error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(err)));
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"{action}\">\n",
        action = escape(action)
    ));
    body.push_str(&format!(
        "<label>Title\n<input type=\"text\" name=\"title\" value=\"{}\">\n</label>\n",
        escape(title)
    ));
    for err in title_errors {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(err)));
    }
    body.push_str(&format!(
        "<label>Description\n<textarea name=\"description\">{}</textarea>\n</label>\n",
        escape(description)
    ));
    body.push_str(&format!(
        "<label><input type=\"checkbox\" name=\"is_done\" value=\"on\"{}> Done</label>\n",
        if is_done { " checked" } else { "" }
    ));
    body.push_str(&format!(
        "<input type=\"hidden\" name=\"_token\" value=\"{token}\">\n"
    ));
    body.push_str("<button type=\"submit\">Save</button>\n</form>\n");
    body.push_str("<p><a href=\"/task\">Back to list</a></p>\n");

    layout(heading, None, &body)
}

pub fn not_found() -> String {
    layout(
        "Not found",
        None,
        "<h2>Task not found</h2>\n<p><a href=\"/task\">Back to list</a></p>\n",
    )
}

pub fn internal_error() -> String {
    layout(
        "Server error",
        None,
        "<h2>Something went wrong</h2>\n<p><a href=\"/task\">Back to list</a></p>\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::csrf::TokenSigner;

    fn sample_task() -> TaskRow {
        TaskRow {
            id: 1,
            title: "Buy <milk> & \"eggs\"".to_string(),
            description: None,
            is_done: false,
            created_at: "2026-08-30T12:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn index_escapes_titles() {
        let html = index(&[sample_task()], TaskSort::DateDesc, None);
        assert!(html.contains("Buy &lt;milk&gt; &amp; &quot;eggs&quot;"));
        assert!(!html.contains("Buy <milk>"));
    }

    #[test]
    fn unknown_notice_codes_render_no_banner() {
        let html = index(&[], TaskSort::DateDesc, Some("<script>alert(1)</script>"));
        assert!(!html.contains("script>alert"));
        assert!(!html.contains("class=\"notice\""));
    }

    #[test]
    fn detail_embeds_a_delete_token_scoped_to_the_id() {
        let signer = TokenSigner::from_secret("0123456789abcdef0123456789abcdef");
        let html = detail(&sample_task(), Some("created"), &signer);
        assert!(html.contains(&signer.issue(&crate::web::csrf::delete_intent(1))));
        assert!(html.contains("Task created successfully."));
    }

    #[test]
    fn form_renders_inline_errors_and_prefills_values() {
        let signer = TokenSigner::from_secret("0123456789abcdef0123456789abcdef");
        let html = task_form(
            "/task/new",
            "New task",
            "a",
            "details",
            true,
            &["The title must contain at least 2 characters".to_string()],
            None,
            &signer,
        );
        assert!(html.contains("at least 2 characters"));
        assert!(html.contains("value=\"a\""));
        assert!(html.contains(">details</textarea>"));
        assert!(html.contains("checked"));
    }
}
