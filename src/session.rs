//! Per-browser page state.
//!
//! Each browser gets a random session id in a cookie, and every session owns
//! its own classes and tasks page. Idle sessions are dropped when new ones
//! are created.

use crate::pages::{ClassesPage, TasksPage};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const COOKIE_NAME: &str = "gci_session";

const IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Page state for one browser
#[derive(Debug, Default)]
pub struct Session {
    pub classes: ClassesPage,
    pub tasks: TasksPage,
}

struct Slot {
    session: Arc<Session>,
    last_seen: Instant,
}

pub struct Resolved {
    pub id: String,
    pub session: Arc<Session>,
    /// True when no live session matched and a new one was made
    pub created: bool,
}

pub struct Sessions {
    slots: Mutex<HashMap<String, Slot>>,
    idle_timeout: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_idle_timeout(IDLE_TIMEOUT)
    }
}

impl Sessions {
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Session stored under `id`, or a fresh one
    pub fn resolve(&self, id: Option<&str>) -> Resolved {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();

        if let Some(id) = id {
            if let Some(slot) = slots.get_mut(id) {
                if now.duration_since(slot.last_seen) < self.idle_timeout {
                    slot.last_seen = now;
                    return Resolved {
                        id: id.to_string(),
                        session: Arc::clone(&slot.session),
                        created: false,
                    };
                }
            }
        }

        let idle_timeout = self.idle_timeout;
        slots.retain(|_, slot| now.duration_since(slot.last_seen) < idle_timeout);

        let id = uuid::Uuid::new_v4().simple().to_string();
        let session = Arc::new(Session::default());
        slots.insert(
            id.clone(),
            Slot {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        tracing::debug!("New session {} ({} live)", id, slots.len());

        Resolved {
            id,
            session,
            created: true,
        }
    }
}

/// Session id carried by the request's `Cookie` headers
fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == COOKIE_NAME).then(|| value.to_string())
        })
}

/// Middleware that puts the caller's [`Session`] into the request extensions
pub async fn attach(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    let resolved = state.sessions.resolve(session_id(request.headers()).as_deref());
    request.extensions_mut().insert(Arc::clone(&resolved.session));

    let mut response = next.run(request).await;
    if resolved.created {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, resolved.id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Could not set session cookie: {}", e),
        }
    }
    response
}
