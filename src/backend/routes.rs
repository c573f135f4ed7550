use super::store::{Store, StoreError, TaskInput};
use crate::models::{Class, ClassPayload, DeleteResponse, Task};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

pub fn router(store: Store) -> Router {
    Router::new()
        .route("/classes", get(list_classes).post(create_class))
        .route("/classes/:id", get(get_class).put(update_class).delete(delete_class))
        .route("/classes/:id/tasks", get(tasks_of_class))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/tasks/:id/close", patch(close_task))
        .route("/tasks/:id/open", patch(open_task))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Error body: `{"error": <status text>, "message": <detail>}`
struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<StoreError> for ApiFailure {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection);
        Self::bad_request("invalid JSON body")
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

#[derive(Debug, Deserialize)]
struct TaskBody {
    #[serde(default)]
    class_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due_at: Option<String>,
}

impl TaskBody {
    fn into_input(self) -> ApiResult<TaskInput> {
        let due_at = parse_due_at(self.due_at.as_deref())?;
        Ok(TaskInput {
            class_id: self.class_id,
            title: self.title,
            description: self.description,
            due_at,
        })
    }
}

/// Blank means no due date
fn parse_due_at(raw: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| ApiFailure::bad_request("invalid due_at (use RFC3339)")),
    }
}

async fn list_classes(State(store): State<Store>) -> Json<Vec<Class>> {
    Json(store.list_classes())
}

async fn get_class(State(store): State<Store>, Path(id): Path<String>) -> ApiResult<Json<Class>> {
    Ok(Json(store.get_class(&id)?))
}

async fn create_class(
    State(store): State<Store>,
    body: Result<Json<ClassPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Class>)> {
    let Json(payload) = body?;
    let class = store.create_class(payload)?;
    tracing::info!("Created class {} ({})", class.id, class.class_name);
    Ok((StatusCode::CREATED, Json(class)))
}

async fn update_class(
    State(store): State<Store>,
    Path(id): Path<String>,
    body: Result<Json<ClassPayload>, JsonRejection>,
) -> ApiResult<Json<Class>> {
    let Json(payload) = body?;
    Ok(Json(store.update_class(&id, payload)?))
}

async fn delete_class(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    store.delete_class(&id)?;
    tracing::info!("Deleted class {}", id);
    Ok(Json(DeleteResponse {
        message: "Class deleted successfully".to_string(),
    }))
}

async fn tasks_of_class(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(store.tasks_of_class(&id)?))
}

async fn list_tasks(State(store): State<Store>) -> Json<Vec<Task>> {
    Json(store.list_tasks())
}

async fn get_task(State(store): State<Store>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    Ok(Json(store.get_task(&id)?))
}

async fn create_task(
    State(store): State<Store>,
    body: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(body) = body?;
    let task = store.create_task(body.into_input()?)?;
    tracing::info!("Created task {} in class {}", task.id, task.class_id);
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(store): State<Store>,
    Path(id): Path<String>,
    body: Result<Json<TaskBody>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(body) = body?;
    Ok(Json(store.update_task(&id, body.into_input()?)?))
}

async fn delete_task(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    store.delete_task(&id)?;
    tracing::info!("Deleted task {}", id);
    Ok(Json(DeleteResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

async fn close_task(State(store): State<Store>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    Ok(Json(store.set_task_closed(&id, true)?))
}

async fn open_task(State(store): State<Store>, Path(id): Path<String>) -> ApiResult<Json<Task>> {
    Ok(Json(store.set_task_closed(&id, false)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;

    async fn api() -> (String, reqwest::Client) {
        (spawn(router(Store::default())).await, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_create_returns_created_status() {
        let (base, http) = api().await;
        let response = http
            .post(format!("{}/classes", base))
            .json(&json!({ "class_name": "Math", "teacher": "Ms. Lee" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let class: Class = response.json().await.unwrap();
        assert_eq!(class.class_name, "Math");
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (base, http) = api().await;
        let response = http
            .post(format!("{}/classes", base))
            .json(&json!({ "class_name": "Math" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], "class_name and teacher are required");
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let (base, http) = api().await;
        let response = http
            .post(format!("{}/tasks", base))
            .header("content-type", "application/json")
            .body("{oops")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "invalid JSON body");
    }

    #[tokio::test]
    async fn test_due_at_must_be_rfc3339() {
        let (base, http) = api().await;
        let class: Class = http
            .post(format!("{}/classes", base))
            .json(&json!({ "class_name": "Math", "teacher": "Ms. Lee" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let response = http
            .post(format!("{}/tasks", base))
            .json(&json!({ "class_id": class.id, "title": "Read", "due_at": "next week" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "invalid due_at (use RFC3339)");

        let task: Task = http
            .post(format!("{}/tasks", base))
            .json(&json!({ "class_id": class.id, "title": "Read", "due_at": "2025-01-31T09:00:00+07:00" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(task.due_at.unwrap().to_rfc3339(), "2025-01-31T02:00:00+00:00");
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let (base, http) = api().await;
        let response = http
            .patch(format!("{}/tasks/nope/close", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "task not found");
    }
}
