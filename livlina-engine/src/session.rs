//! In-memory session store.
//!
//! Each entry sits behind its own async mutex, so a session handles one
//! call at a time while different sessions proceed in parallel. The map
//! itself is only locked long enough to look up, insert or remove an entry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use livlina_core::intake::IntakeSession;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::status::ResponseStatus;

/// Opaque identifier handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub(crate) session: IntakeSession,
    pub(crate) status: Option<ResponseStatus>,
    pub(crate) last_activity: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            session: IntakeSession::new(),
            status: None,
            last_activity: Instant::now(),
        }
    }
}

pub(crate) type EntryGuard = OwnedMutexGuard<SessionEntry>;

#[derive(Debug, Default)]
pub struct SessionStore {
    entries: Mutex<HashMap<SessionId, Arc<AsyncMutex<SessionEntry>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> SessionId {
        let id = SessionId::new();
        self.entries
            .lock()
            .insert(id, Arc::new(AsyncMutex::new(SessionEntry::new())));
        id
    }

    /// Waits for exclusive access to a session and marks it active.
    ///
    /// Returns `None` if the session was ended or purged while waiting.
    pub(crate) async fn lock(&self, id: SessionId) -> Option<EntryGuard> {
        let entry = self.entries.lock().get(&id).cloned()?;
        let mut guard = entry.clone().lock_owned().await;
        let still_stored = self
            .entries
            .lock()
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current, &entry));
        if !still_stored {
            debug!(session = %id, "Session removed while waiting for it");
            return None;
        }
        guard.last_activity = Instant::now();
        Some(guard)
    }

    pub fn end(&self, id: SessionId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops sessions idle for longer than `max_idle`. Sessions with a call
    /// in flight are never idle and are skipped.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|id, entry| match entry.try_lock() {
            Ok(guard) => {
                let keep = now.duration_since(guard.last_activity) <= max_idle;
                if !keep {
                    debug!(session = %id, "Purging idle session");
                }
                keep
            }
            Err(_) => true,
        });
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_round_trip_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[tokio::test]
    async fn start_and_end() {
        let store = SessionStore::new();
        let id = store.start();
        assert!(store.contains(id));
        assert!(store.lock(id).await.is_some());

        assert!(store.end(id));
        assert!(!store.end(id));
        assert!(store.lock(id).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn waiter_sees_session_ended_while_queued() {
        let store = Arc::new(SessionStore::new());
        let id = store.start();
        let guard = store.lock(id).await.unwrap();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.lock(id).await.is_some() }
        });
        tokio::task::yield_now().await;

        assert!(store.end(id));
        drop(guard);
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_idle_sessions() {
        let store = SessionStore::new();
        let stale = store.start();
        tokio::time::advance(Duration::from_secs(120)).await;
        let fresh = store.start();

        assert_eq!(store.purge_idle(Duration::from_secs(60)), 1);
        assert!(!store.contains(stale));
        assert!(store.contains(fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_sessions_survive_purge() {
        let store = SessionStore::new();
        let id = store.start();
        let guard = store.lock(id).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;

        assert_eq!(store.purge_idle(Duration::from_secs(60)), 0);
        drop(guard);
        assert_eq!(store.purge_idle(Duration::from_secs(60)), 1);
    }
}
