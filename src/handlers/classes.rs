use super::{log_failure, View};
use crate::forms::{ClassFields, Submission};
use crate::pages::classes::CACHED_VIEW;
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
    Html(session.classes.render(&state.records, view.mode()).await)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Form(fields): Form<ClassFields>,
) -> Redirect {
    match session.classes.create(&state.records, fields).await {
        Ok(Submission::Submitted(class)) => tracing::info!("Created class {} ({})", class.id, class.class_name),
        Ok(Submission::Rejected) => tracing::debug!("Class form incomplete, nothing sent"),
        Err(e) => {
            log_failure("create class", &e);
            session.classes.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
) -> Redirect {
    session.classes.begin_edit(&state.records, &id);
    Redirect::to(CACHED_VIEW)
}

pub async fn cancel(Extension(session): Extension<Arc<Session>>) -> Redirect {
    session.classes.cancel_edit();
    Redirect::to(CACHED_VIEW)
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
    Form(fields): Form<ClassFields>,
) -> Redirect {
    match session.classes.update(&state.records, &id, fields).await {
        Ok(Submission::Submitted(class)) => tracing::info!("Updated class {}", class.id),
        Ok(Submission::Rejected) => tracing::debug!("Class {} not updated", id),
        Err(e) => {
            log_failure(&format!("update class {}", id), &e);
            session.classes.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<String>,
) -> Redirect {
    match session.classes.delete(&state.records, &id).await {
        Ok(_) => tracing::info!("Deleted class {}", id),
        Err(e) => {
            log_failure(&format!("delete class {}", id), &e);
            session.classes.report(&e);
        }
    }
    Redirect::to(CACHED_VIEW)
}
