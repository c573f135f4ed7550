use super::{log_failure, View};
use crate::forms::{Submission, TaskFields};
use crate::pages::tasks::CACHED_VIEW;
use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Extension, Form,
};
use std::sync::Arc;

pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(view): Query<View>,
) -> Html<String> {
    Html(session.tasks.render(&state.records, view.mode()).await)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Form(fields): Form<TaskFields>,
) -> Redirect {
    match session.tasks.create(&state.records, fields).await {
        Ok(Submission::Submitted(task)) => tracing::info!("Created task {} in class {}", task.id, task.class_id),
        Ok(Submission::Rejected) => tracing::debug!("Task form incomplete, nothing sent"),
        Err(e) => {
            log_failure("create task", &e);
            session.tasks.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
) -> Redirect {
    session.tasks.begin_edit(&state.records, &id);
    Redirect::to(CACHED_VIEW)
}

pub async fn cancel(Extension(session): Extension<Arc<Session>>) -> Redirect {
    session.tasks.cancel_edit();
    Redirect::to(CACHED_VIEW)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
    Form(fields): Form<TaskFields>,
) -> Redirect {
    match session.tasks.update(&state.records, &id, fields).await {
        Ok(Submission::Submitted(task)) => tracing::info!("Updated task {}", task.id),
        Ok(Submission::Rejected) => tracing::debug!("Task {} not updated", id),
        Err(e) => {
            log_failure(&format!("update task {}", id), &e);
            session.tasks.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
) -> Redirect {
    match session.tasks.delete(&state.records, &id).await {
        Ok(_) => tracing::info!("Deleted task {}", id),
        Err(e) => {
            log_failure(&format!("delete task {}", id), &e);
            session.tasks.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}

pub async fn close(state: State<Arc<AppState>>, session: Extension<Arc<Session>>, id: Path<String>) -> Redirect {
    set_closed(state, session, id, true).await
}

pub async fn open(state: State<Arc<AppState>>, session: Extension<Arc<Session>>, id: Path<String>) -> Redirect {
    set_closed(state, session, id, false).await
}

async fn set_closed(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
    closed: bool,
) -> Redirect {
    match session.tasks.set_closed(&state.records, &id, closed).await {
        Ok(task) => tracing::info!("Task {} is now {}", task.id, if task.is_closed { "closed" } else { "open" }),
        Err(e) => {
            log_failure(&format!("change task {}", id), &e);
            session.tasks.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}
