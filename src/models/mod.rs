pub mod class;
pub mod task;

use serde::{Deserialize, Serialize};

pub use class::{Class, ClassPayload};
pub use task::{Task, TaskPayload};

/// Body returned by the API for a successful delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
