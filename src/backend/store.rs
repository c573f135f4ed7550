use crate::models::{Class, ClassPayload, Task};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
}

/// Field values for a task create or update, as received on the wire
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub class_id: String,
    pub title: String,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
}

/// Thread-safe record store. Records keep insertion order.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    classes: RwLock<Vec<Class>>,
    tasks: RwLock<Vec<Task>>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Store {
    fn classes(&self) -> RwLockReadGuard<'_, Vec<Class>> {
        self.inner.classes.read().unwrap()
    }

    fn classes_mut(&self) -> RwLockWriteGuard<'_, Vec<Class>> {
        self.inner.classes.write().unwrap()
    }

    fn tasks(&self) -> RwLockReadGuard<'_, Vec<Task>> {
        self.inner.tasks.read().unwrap()
    }

    fn tasks_mut(&self) -> RwLockWriteGuard<'_, Vec<Task>> {
        self.inner.tasks.write().unwrap()
    }

    fn class_exists(&self, id: &str) -> bool {
        self.classes().iter().any(|c| c.id == id)
    }

    pub fn list_classes(&self) -> Vec<Class> {
        self.classes().clone()
    }

    pub fn get_class(&self, id: &str) -> Result<Class, StoreError> {
        self.classes()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("class not found"))
    }

    pub fn create_class(&self, payload: ClassPayload) -> Result<Class, StoreError> {
        validate_class(&payload)?;
        let class = Class {
            id: new_id(),
            class_name: payload.class_name,
            teacher: payload.teacher,
        };
        self.classes_mut().push(class.clone());
        Ok(class)
    }

    pub fn update_class(&self, id: &str, payload: ClassPayload) -> Result<Class, StoreError> {
        validate_class(&payload)?;
        let mut classes = self.classes_mut();
        let class = classes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound("class not found"))?;
        class.class_name = payload.class_name;
        class.teacher = payload.teacher;
        Ok(class.clone())
    }

    /// Delete a class and every task that belongs to it
    pub fn delete_class(&self, id: &str) -> Result<(), StoreError> {
        {
            let mut classes = self.classes_mut();
            let before = classes.len();
            classes.retain(|c| c.id != id);
            if classes.len() == before {
                return Err(StoreError::NotFound("class not found"));
            }
        }
        self.tasks_mut().retain(|t| t.class_id != id);
        Ok(())
    }

    pub fn tasks_of_class(&self, class_id: &str) -> Result<Vec<Task>, StoreError> {
        if !self.class_exists(class_id) {
            return Err(StoreError::NotFound("class not found"));
        }
        Ok(self
            .tasks()
            .iter()
            .filter(|t| t.class_id == class_id)
            .cloned()
            .collect())
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.tasks().clone()
    }

    pub fn get_task(&self, id: &str) -> Result<Task, StoreError> {
        self.tasks()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("task not found"))
    }

    pub fn create_task(&self, input: TaskInput) -> Result<Task, StoreError> {
        self.validate_task(&input)?;
        let task = Task {
            id: new_id(),
            class_id: input.class_id,
            title: input.title,
            description: input.description,
            due_at: input.due_at,
            is_closed: false,
            closed_at: None,
        };
        self.tasks_mut().push(task.clone());
        Ok(task)
    }

    pub fn update_task(&self, id: &str, input: TaskInput) -> Result<Task, StoreError> {
        self.validate_task(&input)?;
        let mut tasks = self.tasks_mut();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound("task not found"))?;
        task.class_id = input.class_id;
        task.title = input.title;
        task.description = input.description;
        task.due_at = input.due_at;
        Ok(task.clone())
    }

    pub fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks_mut();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(StoreError::NotFound("task not found"));
        }
        Ok(())
    }

    /// Close or reopen a task. Setting the current state again changes nothing.
    pub fn set_task_closed(&self, id: &str, closed: bool) -> Result<Task, StoreError> {
        let mut tasks = self.tasks_mut();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound("task not found"))?;
        if task.is_closed != closed {
            task.is_closed = closed;
            task.closed_at = closed.then(Utc::now);
        }
        Ok(task.clone())
    }

    fn validate_task(&self, input: &TaskInput) -> Result<(), StoreError> {
        if input.class_id.trim().is_empty() || input.title.trim().is_empty() {
            return Err(StoreError::Invalid("class_id and title are required"));
        }
        if !self.class_exists(&input.class_id) {
            return Err(StoreError::Invalid("class_id not found"));
        }
        Ok(())
    }
}

fn validate_class(payload: &ClassPayload) -> Result<(), StoreError> {
    if payload.class_name.trim().is_empty() || payload.teacher.trim().is_empty() {
        return Err(StoreError::Invalid("class_name and teacher are required"));
    }
    Ok(())
}
