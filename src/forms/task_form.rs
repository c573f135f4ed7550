use super::Submission;
use crate::models::{Class, TaskPayload};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;

/// Raw field values posted by the browser.
/// `class_id` is absent when the class selector has no options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFields {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub class_id: String,
    pub title: String,
    pub description: String,
    // not editable here, carried through so an update keeps it
    due_at: Option<DateTime<Utc>>,
}

impl TaskForm {
    /// Pre-filled from `initial`, or blank with the first class selected
    pub fn new(classes: &[Class], initial: Option<&TaskPayload>) -> Self {
        match initial {
            Some(p) => Self {
                class_id: p.class_id.clone(),
                title: p.title.clone(),
                description: p.description.clone(),
                due_at: p.due_at,
            },
            None => {
                let mut form = Self::default();
                form.sync_classes(classes);
                form
            }
        }
    }

    /// Select the first class if nothing is selected yet.
    /// The class list may arrive after the form was created.
    pub fn sync_classes(&mut self, classes: &[Class]) {
        if self.class_id.is_empty() {
            if let Some(first) = classes.first() {
                self.class_id = first.id.clone();
            }
        }
    }

    pub fn apply(&mut self, fields: TaskFields) {
        self.class_id = fields.class_id;
        self.title = fields.title;
        self.description = fields.description;
    }

    /// Trimmed payload, or `None` without a class or a title
    pub fn payload(&self) -> Option<TaskPayload> {
        let title = self.title.trim();
        if self.class_id.is_empty() || title.is_empty() {
            return None;
        }
        Some(TaskPayload {
            class_id: self.class_id.clone(),
            title: title.to_string(),
            description: self.description.trim().to_string(),
            due_at: self.due_at,
        })
    }

    /// Validate, then hand the payload to `on_submit`.
    /// On success title and description are cleared; the selected class stays.
    pub async fn submit<F, Fut, T, E>(&mut self, on_submit: F) -> Result<Submission<T>, E>
    where
        F: FnOnce(TaskPayload) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(payload) = self.payload() else {
            return Ok(Submission::Rejected);
        };
        let out = on_submit(payload).await?;
        self.title.clear();
        self.description.clear();
        Ok(Submission::Submitted(out))
    }
}
