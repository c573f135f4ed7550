//! Editable form state for the two record types.
//!
//! A form validates its own fields, hands a trimmed payload to a caller
//! supplied async callback, and resets itself once the callback succeeds.

mod class_form;
mod task_form;

pub use class_form::{ClassFields, ClassForm};
pub use task_form::{TaskFields, TaskForm};

/// Outcome of a submit attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    /// Validation failed; the callback was not invoked.
    Rejected,
    Submitted(T),
}

impl<T> Submission<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Submission::Submitted(_))
    }
}
