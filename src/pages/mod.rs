pub mod classes;
pub mod home;
pub mod layout;
pub mod tasks;

pub use classes::ClassesPage;
pub use tasks::TasksPage;

use crate::api::RecordClient;
use crate::cache::{keys, QueryCache, QueryState, ReadMode};
use crate::models::{Class, Task};
use std::sync::Arc;
use std::time::Duration;

/// Which record, if any, a page is currently editing
#[derive(Debug, Clone)]
pub enum EditState<R, F> {
    Idle,
    Editing { record: R, form: F },
}

impl<R, F> Default for EditState<R, F> {
    fn default() -> Self {
        EditState::Idle
    }
}

impl<R, F> EditState<R, F> {
    pub fn record(&self) -> Option<&R> {
        match self {
            EditState::Idle => None,
            EditState::Editing { record, .. } => Some(record),
        }
    }
}

/// Everything a page needs to read and mutate records
#[derive(Clone)]
pub struct Records {
    pub client: RecordClient,
    pub cache: Arc<QueryCache>,
    /// How long a render waits for a query before showing "Loading..."
    pub render_wait: Duration,
}

impl Records {
    pub fn new(client: RecordClient, cache: Arc<QueryCache>, render_wait: Duration) -> Self {
        Self {
            client,
            cache,
            render_wait,
        }
    }

    pub async fn classes(&self, mode: ReadMode) -> QueryState<Vec<Class>> {
        let client = self.client.clone();
        self.cache
            .query_within(keys::CLASSES, mode, self.render_wait, move || {
                let client = client.clone();
                async move { client.list_classes().await }
            })
            .await
    }

    pub async fn tasks(&self, mode: ReadMode) -> QueryState<Vec<Task>> {
        let client = self.client.clone();
        self.cache
            .query_within(keys::TASKS, mode, self.render_wait, move || {
                let client = client.clone();
                async move { client.list_tasks().await }
            })
            .await
    }

    /// Classes as currently cached, without a fetch
    pub fn cached_classes(&self) -> Vec<Class> {
        cached(&self.cache.peek(keys::CLASSES))
    }

    pub fn cached_tasks(&self) -> Vec<Task> {
        cached(&self.cache.peek(keys::TASKS))
    }
}

fn cached<T: Clone>(state: &QueryState<Vec<T>>) -> Vec<T> {
    state.data.as_deref().cloned().unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend;
    use crate::models::ClassPayload;
    use crate::test_support::{spawn, RequestLog};

    /// A live embedded API with a request log, plus records pointed at it
    pub struct Harness {
        pub records: Records,
        pub store: backend::Store,
        pub log: RequestLog,
    }

    impl Harness {
        pub async fn start() -> Self {
            let store = backend::Store::default();
            let log = RequestLog::default();
            let base = spawn(log.wrap(backend::router(store.clone()))).await;
            let records = Records::new(
                RecordClient::new(base),
                Arc::new(QueryCache::new()),
                Duration::from_secs(5),
            );
            Self { records, store, log }
        }

        pub fn add_class(&self, name: &str) -> Class {
            self.store
                .create_class(ClassPayload {
                    class_name: name.to_string(),
                    teacher: "Ms. Lee".to_string(),
                })
                .unwrap()
        }
    }
}
