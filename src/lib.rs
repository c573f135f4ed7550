pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod session;
#[cfg(test)]
mod test_support;

/// Shared state behind every admin route
pub struct AppState {
    pub records: pages::Records,
    pub sessions: session::Sessions,
}

impl AppState {
    pub fn new(records: pages::Records) -> Self {
        Self {
            records,
            sessions: session::Sessions::default(),
        }
    }
}
