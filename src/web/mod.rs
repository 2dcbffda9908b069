// web/mod.rs — HTTP server for the task pages.
//
// Axum router over Arc<AppContext>. Server-rendered HTML, redirect after
// every successful POST, JSON health probe at /health.
//
// Routes:
//   GET  /                      → redirect to /task
//   GET  /health
//   GET  /task?sort={token}
//   GET  /task/new
//   POST /task/new
//   GET  /task/{id}
//   GET  /task/{id}/edit
//   POST /task/{id}/edit
//   POST /task/{id}/delete     (anti-forgery token required)
//   GET  /task/{id}/toggle

pub mod csrf;
pub mod forms;
pub mod handlers;
pub mod pages;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("taskboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/task", get(handlers::index))
        // Literal /task/new wins over the /task/{id} capture.
        .route("/task/new", get(handlers::new_form).post(handlers::create))
        .route("/task/{id}", get(handlers::show))
        .route(
            "/task/{id}/edit",
            get(handlers::edit_form).post(handlers::update),
        )
        .route("/task/{id}/delete", post(handlers::delete))
        .route("/task/{id}/toggle", get(handlers::toggle))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Resolve on SIGTERM (Unix) or Ctrl-C (all platforms).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
