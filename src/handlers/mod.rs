mod classes;
mod tasks;

use crate::api::ApiError;
use crate::cache::ReadMode;
use crate::pages::home;
use crate::{session, AppState};
use axum::{
    middleware,
    response::Html,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Admin pages and their form actions, each browser with its own page state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_home))
        .route("/health", get(health_check))
        .route("/classes", get(classes::show).post(classes::create))
        .route("/classes/cancel", post(classes::cancel))
        .route("/classes/:id/edit", post(classes::edit))
        .route("/classes/:id/update", post(classes::update))
        .route("/classes/:id/delete", post(classes::delete))
        .route("/tasks", get(tasks::show).post(tasks::create))
        .route("/tasks/cancel", post(tasks::cancel))
        .route("/tasks/:id/edit", post(tasks::edit))
        .route("/tasks/:id/update", post(tasks::update))
        .route("/tasks/:id/delete", post(tasks::delete))
        .route("/tasks/:id/close", post(tasks::close))
        .route("/tasks/:id/open", post(tasks::open))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), session::attach))
        .with_state(state)
}

/// Page query string. Actions redirect with `cached=true` so the page that
/// follows them renders from the cache; a plain load asks the API again.
#[derive(Debug, Default, Deserialize)]
pub struct View {
    #[serde(default)]
    cached: bool,
}

impl View {
    fn mode(&self) -> ReadMode {
        if self.cached {
            ReadMode::Cached
        } else {
            ReadMode::Refetch
        }
    }
}

fn log_failure(action: &str, err: &ApiError) {
    match err.status() {
        Some(status) => tracing::error!("Failed to {} ({}): {}", action, status, err),
        None => tracing::error!("Failed to {}: {}", action, err),
    }
}

async fn show_home() -> Html<String> {
    Html(home::render())
}

async fn health_check() -> &'static str {
    "OK"
}
