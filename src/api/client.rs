use super::error::ApiError;
use crate::models::{Class, ClassPayload, DeleteResponse, Task, TaskPayload};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Typed client for the classes/tasks REST API
#[derive(Clone)]
pub struct RecordClient {
    client: Client,
    base_url: String,
}

impl RecordClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, ApiError> {
        self.send(Method::GET, "/classes", None::<&()>).await
    }

    pub async fn get_class(&self, id: &str) -> Result<Class, ApiError> {
        self.send(Method::GET, &format!("/classes/{}", segment(id)), None::<&()>).await
    }

    pub async fn create_class(&self, payload: &ClassPayload) -> Result<Class, ApiError> {
        self.send(Method::POST, "/classes", Some(payload)).await
    }

    pub async fn update_class(&self, id: &str, payload: &ClassPayload) -> Result<Class, ApiError> {
        self.send(Method::PUT, &format!("/classes/{}", segment(id)), Some(payload)).await
    }

    pub async fn delete_class(&self, id: &str) -> Result<DeleteResponse, ApiError> {
        self.send(Method::DELETE, &format!("/classes/{}", segment(id)), None::<&()>).await
    }

    /// Tasks belonging to one class
    pub async fn tasks_of_class(&self, class_id: &str) -> Result<Vec<Task>, ApiError> {
        self.send(Method::GET, &format!("/classes/{}/tasks", segment(class_id)), None::<&()>).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.send(Method::GET, "/tasks", None::<&()>).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.send(Method::GET, &format!("/tasks/{}", segment(id)), None::<&()>).await
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.send(Method::POST, "/tasks", Some(payload)).await
    }

    pub async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.send(Method::PUT, &format!("/tasks/{}", segment(id)), Some(payload)).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<DeleteResponse, ApiError> {
        self.send(Method::DELETE, &format!("/tasks/{}", segment(id)), None::<&()>).await
    }

    /// Mark a task closed. Closing a closed task is a no-op on the server.
    pub async fn close_task(&self, id: &str) -> Result<Task, ApiError> {
        self.send(Method::PATCH, &format!("/tasks/{}/close", segment(id)), None::<&()>).await
    }

    pub async fn open_task(&self, id: &str) -> Result<Task, ApiError> {
        self.send(Method::PATCH, &format!("/tasks/{}/open", segment(id)), None::<&()>).await
    }

    /// One JSON round trip. Responses are never served from an HTTP cache.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &bytes);
            tracing::warn!("{} {} returned {}: {}", method, url, status, err);
            return Err(err);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}
