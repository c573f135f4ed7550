pub mod client;
pub mod error;

pub use client::RecordClient;
pub use error::ApiError;
