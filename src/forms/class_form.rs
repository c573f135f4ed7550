use super::Submission;
use crate::models::ClassPayload;
use serde::Deserialize;
use std::future::Future;

/// Raw field values posted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassFields {
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub teacher: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassForm {
    pub class_name: String,
    pub teacher: String,
}

impl ClassForm {
    /// Blank for create, or pre-filled from the record being edited
    pub fn new(initial: Option<&ClassPayload>) -> Self {
        match initial {
            Some(p) => Self {
                class_name: p.class_name.clone(),
                teacher: p.teacher.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn apply(&mut self, fields: ClassFields) {
        self.class_name = fields.class_name;
        self.teacher = fields.teacher;
    }

    /// Trimmed payload, or `None` if a required field is blank
    pub fn payload(&self) -> Option<ClassPayload> {
        let class_name = self.class_name.trim();
        let teacher = self.teacher.trim();
        if class_name.is_empty() || teacher.is_empty() {
            return None;
        }
        Some(ClassPayload {
            class_name: class_name.to_string(),
            teacher: teacher.to_string(),
        })
    }

    /// Validate, then hand the payload to `on_submit`.
    ///
    /// Fields are cleared only after the callback succeeds, in edit mode as
    /// well; callers close the edit form at that point.
    pub async fn submit<F, Fut, T, E>(&mut self, on_submit: F) -> Result<Submission<T>, E>
    where
        F: FnOnce(ClassPayload) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(payload) = self.payload() else {
            return Ok(Submission::Rejected);
        };
        let out = on_submit(payload).await?;
        self.class_name.clear();
        self.teacher.clear();
        Ok(Submission::Submitted(out))
    }
}
