//! Keyed query cache shared by the page components.
//!
//! Each key owns one fetch function and one cached result. Readers of the
//! same key share a single in-flight fetch, and `invalidate` marks a key
//! stale and refetches it in the background, broadcasting the result to
//! every subscriber. A page load reads with [`ReadMode::Refetch`], so the
//! backend is asked again even when the cached copy looks fresh.

use crate::api::ApiError;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;

pub mod keys {
    pub const CLASSES: &str = "classes";
    pub const TASKS: &str = "tasks";
}

/// How a read treats data already in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Serve fresh cached data; fetch only when the key is stale or new
    Cached,
    /// Fetch again unless a fetch is already in flight (a page load)
    Refetch,
}

type Data = Arc<dyn Any + Send + Sync>;
type FetchFuture = Pin<Box<dyn Future<Output = Result<Data, String>> + Send>>;
type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

struct Snapshot {
    data: Option<Data>,
    error: Option<String>,
    fetching: bool,
    stale: bool,
    refetch_pending: bool,
    fetches: u64,
    closed: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetching: false,
            // never fetched
            stale: true,
            refetch_pending: false,
            fetches: 0,
            closed: false,
        }
    }
}

struct Entry {
    key: String,
    state: watch::Sender<Snapshot>,
    fetcher: FetchFn,
    task: Mutex<Option<AbortHandle>>,
}

impl Entry {
    /// Start the fetch loop unless one is already running
    fn start_fetch(self: &Arc<Self>) {
        let started = self.state.send_if_modified(|s| {
            if s.fetching || s.closed {
                false
            } else {
                s.fetching = true;
                true
            }
        });
        if !started {
            return;
        }

        let entry = Arc::clone(self);
        tokio::spawn(async move { entry.run_fetches().await });
    }

    /// Each fetch runs on its own task so a panic surfaces as a failed fetch
    /// and shutdown can abort the request itself.
    async fn run_fetches(&self) {
        loop {
            tracing::debug!("Fetching query '{}'", self.key);
            let fetch = tokio::spawn((self.fetcher)());
            *self.task.lock().unwrap() = Some(fetch.abort_handle());
            if self.state.borrow().closed {
                fetch.abort();
            }

            let result = match fetch.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => {
                    tracing::debug!("Query '{}' fetch aborted", self.key);
                    return;
                }
                Err(e) => {
                    tracing::error!("Query '{}' fetch panicked: {}", self.key, e);
                    Err("fetch failed unexpectedly".to_string())
                }
            };
            self.task.lock().unwrap().take();

            if let Err(e) = &result {
                tracing::warn!("Query '{}' failed: {}", self.key, e);
            }

            let mut again = false;
            self.state.send_modify(|s| {
                s.fetches += 1;
                match result {
                    Ok(data) => {
                        s.data = Some(data);
                        s.error = None;
                        s.stale = false;
                    }
                    // Keep the last good data; the next read tries again.
                    Err(message) => {
                        s.error = Some(message);
                        s.stale = true;
                    }
                }
                if s.refetch_pending && !s.closed {
                    s.refetch_pending = false;
                    s.stale = true;
                    again = true;
                } else {
                    s.fetching = false;
                }
                tracing::debug!("Query '{}' settled after {} fetches", self.key, s.fetches);
            });

            if !again {
                break;
            }
        }
    }
}

/// Result of a query as seen by one reader
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<String>,
    /// True while the first fetch for the key is in flight
    pub is_loading: bool,
    pub is_fetching: bool,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
        }
    }
}

impl<T: Send + Sync + 'static> QueryState<T> {
    fn from_snapshot(s: &Snapshot) -> Self {
        Self {
            data: s.data.clone().and_then(|d| d.downcast::<T>().ok()),
            error: s.error.clone(),
            is_loading: s.fetching && s.data.is_none(),
            is_fetching: s.fetching,
        }
    }
}

/// Live view of one key. Yields a new state after every fetch completes.
pub struct Subscription<T> {
    rx: watch::Receiver<Snapshot>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    /// Wait for the next change. Returns `None` once the cache is shut down.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.rx.changed().await.ok()?;
        let snapshot = self.rx.borrow_and_update();
        if snapshot.closed {
            return None;
        }
        Some(QueryState::from_snapshot(&snapshot))
    }
}

/// Must be used from within a tokio runtime: fetches run on spawned tasks.
#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<Arc<Entry>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Look up `key`, registering `fetch` as its fetch function if it is new.
    fn entry<T, F, Fut>(&self, key: &str, fetch: F) -> Arc<Entry>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.to_string()).or_insert_with(|| {
            let fetcher: FetchFn = Arc::new(move || -> FetchFuture {
                let pending = fetch();
                Box::pin(async move {
                    pending
                        .await
                        .map(|data| Arc::new(data) as Data)
                        .map_err(|e| e.to_string())
                })
            });
            Arc::new(Entry {
                key: key.to_string(),
                state: watch::channel(Snapshot::default()).0,
                fetcher,
                task: Mutex::new(None),
            })
        });
        Arc::clone(entry)
    }

    /// Read `key`, fetching it first if it has never been fetched or is stale.
    ///
    /// Waits for any fetch already in flight. With [`ReadMode::Cached`] fresh
    /// data is returned without touching the network; [`ReadMode::Refetch`]
    /// always sees a fetch that finished after the call began or joined it.
    pub async fn query<T, F, Fut>(&self, key: &str, mode: ReadMode, fetch: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut rx = {
            let entry = self.entry(key, fetch);
            let rx = entry.state.subscribe();
            let needs_fetch = {
                let s = rx.borrow();
                (s.stale || mode == ReadMode::Refetch) && !s.fetching
            };
            if needs_fetch {
                entry.start_fetch();
            }
            rx
        };

        if rx.wait_for(|s| !s.fetching || s.closed).await.is_err() {
            tracing::debug!("Query '{}' dropped while waiting", key);
        }
        let state = QueryState::from_snapshot(&rx.borrow());
        state
    }

    /// Like [`query`](Self::query) but stops waiting after `wait`.
    ///
    /// The fetch keeps running in the background; the returned state then
    /// reports whatever the cache holds, usually `is_loading`.
    pub async fn query_within<T, F, Fut>(&self, key: &str, mode: ReadMode, wait: Duration, fetch: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        match tokio::time::timeout(wait, self.query(key, mode, fetch)).await {
            Ok(state) => state,
            Err(_) => {
                tracing::debug!("Query '{}' still in flight after {:?}", key, wait);
                self.peek(key)
            }
        }
    }

    /// Current state of `key` without fetching
    pub fn peek<T: Send + Sync + 'static>(&self, key: &str) -> QueryState<T> {
        match self.get(key) {
            Some(entry) => QueryState::from_snapshot(&entry.state.borrow()),
            None => QueryState::default(),
        }
    }

    pub fn subscribe<T: Send + Sync + 'static>(&self, key: &str) -> Option<Subscription<T>> {
        self.get(key).map(|entry| Subscription {
            rx: entry.state.subscribe(),
            _marker: PhantomData,
        })
    }

    /// Mark `key` stale and refetch it in the background.
    ///
    /// Invalidations that arrive while a fetch is running collapse into a
    /// single follow-up fetch. Unknown keys are ignored.
    pub fn invalidate(&self, key: &str) {
        let Some(entry) = self.get(key) else {
            tracing::debug!("Invalidate of unknown query '{}'", key);
            return;
        };

        let mut start = false;
        entry.state.send_modify(|s| {
            s.stale = true;
            if s.fetching {
                s.refetch_pending = true;
            } else {
                start = true;
            }
        });
        tracing::debug!("Invalidated query '{}'", key);

        if start {
            entry.start_fetch();
        }
    }

    /// Abort in-flight fetches and drop every entry
    pub fn shutdown(&self) {
        let entries: Vec<Arc<Entry>> = self.entries.lock().unwrap().drain().map(|(_, e)| e).collect();
        for entry in &entries {
            if let Some(handle) = entry.task.lock().unwrap().take() {
                handle.abort();
            }
            entry.state.send_modify(|s| {
                s.closed = true;
                s.fetching = false;
            });
        }
        tracing::info!("Query cache shut down ({} keys)", entries.len());
    }
}
