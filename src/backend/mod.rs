//! In-memory implementation of the classes/tasks REST API.
//!
//! Mounted under `/api` when `EMBED_BACKEND=true` so the admin can run
//! without an external service. The Record Client treats it like any other
//! remote backend.

mod routes;
mod store;

pub use routes::router;
pub use store::{Store, StoreError, TaskInput};
