//! Route handlers — five user intents (list, show, new, edit, delete,
//! toggle) translated into store calls.
//!
//! Two cross-cutting checks live here and nowhere else: the referenced
//! task must exist (404 page otherwise), and destructive actions require
//! the id-scoped anti-forgery token. Everything else is store + render.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::storage::StoreError;
use crate::task::TaskSort;
use crate::web::csrf;
use crate::web::forms::TaskForm;
use crate::web::pages;
use crate::AppContext;

/// Error surface for page handlers. NotFound renders the 404 page; any
/// store fault becomes a logged 500.
pub enum PageError {
    NotFound,
    Internal(anyhow::Error),
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
            }
            Self::Internal(err) => {
                error!(err = %err, "request failed");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::internal_error()),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub notice: Option<String>,
}

#[derive(Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub async fn root() -> Redirect {
    Redirect::to("/task")
}

/// JSON liveness probe.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Result<Json<Value>, PageError> {
    let tasks = ctx.storage.count_tasks().await?;
    Ok(Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": ctx.started_at.elapsed().as_secs(),
        "tasks": tasks,
    })))
}

pub async fn index(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let sort = TaskSort::from_token(query.sort.as_deref());
    let tasks = ctx.storage.list_tasks(sort).await?;
    Ok(Html(pages::index(&tasks, sort, query.notice.as_deref())))
}

pub async fn show(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let task = ctx.storage.get_task(id).await?.ok_or(PageError::NotFound)?;
    Ok(Html(pages::detail(
        &task,
        query.notice.as_deref(),
        &ctx.signer,
    )))
}

pub async fn new_form(State(ctx): State<Arc<AppContext>>) -> Html<String> {
    Html(pages::task_form(
        "/task/new",
        "New task",
        "",
        "",
        false,
        &[],
        None,
        &ctx.signer,
    ))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    Form(form): Form<TaskForm>,
) -> Result<Response, PageError> {
    if !form_token_ok(&ctx, &form) {
        return Ok(
            render_form(&ctx, "/task/new", "New task", &form, &[], stale_token_error())
                .into_response(),
        );
    }

    match ctx
        .storage
        .create_task(form.title(), form.description(), form.is_done())
        .await
    {
        Ok(task) => Ok(Redirect::to(&format!("/task/{}?notice=created", task.id)).into_response()),
        Err(StoreError::Invalid(errors)) => {
            Ok(render_form(&ctx, "/task/new", "New task", &form, &errors.title, None).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn edit_form(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let task = ctx.storage.get_task(id).await?.ok_or(PageError::NotFound)?;
    Ok(Html(pages::task_form(
        &format!("/task/{id}/edit"),
        "Edit task",
        &task.title,
        task.description.as_deref().unwrap_or(""),
        task.is_done,
        &[],
        None,
        &ctx.signer,
    )))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> Result<Response, PageError> {
    // Existence first: a stale form for a deleted task is a 404, not a
    // silent re-create.
    ctx.storage.get_task(id).await?.ok_or(PageError::NotFound)?;

    let action = format!("/task/{id}/edit");
    if !form_token_ok(&ctx, &form) {
        return Ok(
            render_form(&ctx, &action, "Edit task", &form, &[], stale_token_error())
                .into_response(),
        );
    }

    match ctx
        .storage
        .update_task(id, form.title(), form.description(), form.is_done())
        .await
    {
        Ok(task) => Ok(Redirect::to(&format!("/task/{}?notice=updated", task.id)).into_response()),
        Err(StoreError::Invalid(errors)) => {
            Ok(render_form(&ctx, &action, "Edit task", &form, &errors.title, None).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

#[derive(Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "_token", default)]
    pub token: Option<String>,
}

pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, PageError> {
    ctx.storage.get_task(id).await?.ok_or(PageError::NotFound)?;

    let token = form.token.as_deref().unwrap_or("");
    if ctx.signer.verify(&csrf::delete_intent(id), token) {
        ctx.storage.delete_task(id).await?;
        Ok(Redirect::to("/task?notice=deleted"))
    } else {
        // Invalid token: the request succeeds but nothing is deleted.
        warn!(task_id = id, "delete rejected: anti-forgery token mismatch");
        Ok(Redirect::to("/task"))
    }
}

pub async fn toggle(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    let task = ctx.storage.get_task(id).await?.ok_or(PageError::NotFound)?;
    let updated = ctx.storage.set_done(id, !task.is_done).await?;
    let notice = if updated.is_done { "completed" } else { "reopened" };
    Ok(Redirect::to(&format!("/task/{id}?notice={notice}")))
}

fn form_token_ok(ctx: &AppContext, form: &TaskForm) -> bool {
    ctx.signer
        .verify(csrf::FORM_INTENT, form.token.as_deref().unwrap_or(""))
}

fn stale_token_error() -> Option<&'static str> {
    Some("The form has expired. Please submit it again.")
}

fn render_form(
    ctx: &AppContext,
    action: &str,
    heading: &str,
    form: &TaskForm,
    title_errors: &[String],
    form_error: Option<&str>,
) -> Html<String> {
    // Re-render with the raw (untrimmed) submission so the user sees what
    // they typed.
    Html(pages::task_form(
        action,
        heading,
        &form.title,
        form.description.as_deref().unwrap_or(""),
        form.is_done(),
        title_errors,
        form_error,
        &ctx.signer,
    ))
}
