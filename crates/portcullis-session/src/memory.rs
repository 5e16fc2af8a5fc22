//! In-process session store.

use crate::error::SessionError;
use crate::store::{SessionId, SessionStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Longest gap between two sweeps of expired sessions.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Entry {
    values: HashMap<String, Value>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A [`SessionStore`] backed by a concurrent hash map.
///
/// Each write restarts the session's lifetime. Expired sessions behave as if
/// they never existed and are removed the next time they are touched. Writes
/// also sweep the whole map once the sweep interval (the lifetime, at most
/// five minutes) has passed, so abandoned sessions do not accumulate.
///
/// # Example
///
/// ```
/// use portcullis_session::{MemorySessionStore, SessionId, SessionStore};
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = MemorySessionStore::new(Duration::from_secs(60));
/// let id = SessionId::generate();
///
/// store.put(&id, "flash", "hello".into()).await.unwrap();
/// assert!(store.exists(&id, "flash").await.unwrap());
/// assert_eq!(store.pop(&id, "flash").await.unwrap(), Some("hello".into()));
/// assert!(!store.exists(&id, "flash").await.unwrap());
/// # });
/// ```
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, Entry>,
    lifetime: Duration,
    sweep_interval: Duration,
    next_sweep: Mutex<Instant>,
}

impl MemorySessionStore {
    /// Creates a store whose sessions live for `lifetime` after their last write.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        let sweep_interval = lifetime.min(MAX_SWEEP_INTERVAL);
        Self {
            sessions: DashMap::new(),
            lifetime,
            sweep_interval,
            next_sweep: Mutex::new(Instant::now() + sweep_interval),
        }
    }

    /// The configured session lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Number of sessions currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            tracing::debug!(purged, "purged expired sessions");
        }
        purged
    }

    /// Purges expired sessions if a sweep is due. A sweep already running on
    /// another thread counts.
    fn sweep_if_due(&self) {
        let now = Instant::now();
        {
            let Ok(mut next) = self.next_sweep.try_lock() else {
                return;
            };
            if now < *next {
                return;
            }
            *next = now + self.sweep_interval;
        }
        self.purge_expired();
    }

    /// Removes `id` if it has expired. Returns `true` if the session is live.
    fn evict_if_expired(&self, id: &SessionId) -> bool {
        let now = Instant::now();
        let removed = self
            .sessions
            .remove_if(id, |_, entry| entry.is_expired(now))
            .is_some();
        !removed && self.sessions.contains_key(id)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.evict_if_expired(id))
    }

    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<Value>, SessionError> {
        if !self.evict_if_expired(id) {
            return Ok(None);
        }
        Ok(self
            .sessions
            .get(id)
            .and_then(|entry| entry.values.get(key).cloned()))
    }

    async fn put(&self, id: &SessionId, key: &str, value: Value) -> Result<(), SessionError> {
        self.sweep_if_due();
        self.evict_if_expired(id);
        let expires_at = Instant::now() + self.lifetime;
        let mut entry = self.sessions.entry(id.clone()).or_insert_with(|| Entry {
            values: HashMap::new(),
            expires_at,
        });
        entry.values.insert(key.to_string(), value);
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn remove(&self, id: &SessionId, key: &str) -> Result<Option<Value>, SessionError> {
        if !self.evict_if_expired(id) {
            return Ok(None);
        }
        Ok(self
            .sessions
            .get_mut(id)
            .and_then(|mut entry| entry.values.remove(key)))
    }

    async fn renew(&self, id: &SessionId) -> Result<SessionId, SessionError> {
        let fresh = SessionId::generate();
        self.evict_if_expired(id);
        if let Some((_, mut entry)) = self.sessions.remove(id) {
            entry.expires_at = Instant::now() + self.lifetime;
            self.sessions.insert(fresh.clone(), entry);
        }
        Ok(fresh)
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemorySessionStore::new(LIFETIME);
        let id = SessionId::generate();

        assert!(!store.load(&id).await.unwrap());
        store.put(&id, "authenticated_user_id", 7.into()).await.unwrap();

        assert!(store.load(&id).await.unwrap());
        assert_eq!(
            store.get(&id, "authenticated_user_id").await.unwrap(),
            Some(Value::from(7))
        );
        assert_eq!(store.get(&id, "flash").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_and_exists() {
        let store = MemorySessionStore::new(LIFETIME);
        let id = SessionId::generate();
        store.put(&id, "flash", "hi".into()).await.unwrap();

        assert!(store.exists(&id, "flash").await.unwrap());
        assert_eq!(store.remove(&id, "flash").await.unwrap(), Some("hi".into()));
        assert!(!store.exists(&id, "flash").await.unwrap());
        assert_eq!(store.remove(&id, "flash").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_expire_after_lifetime() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = SessionId::generate();
        store.put(&id, "flash", "hi".into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.load(&id).await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.load(&id).await.unwrap());
        assert_eq!(store.get(&id, "flash").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_restarts_lifetime() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = SessionId::generate();
        store.put(&id, "a", 1.into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        store.put(&id, "b", 2.into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(store.get(&id, "a").await.unwrap(), Some(Value::from(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemorySessionStore::new(Duration::from_secs(10));
        for _ in 0..3 {
            store.put(&SessionId::generate(), "k", 1.into()).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(store.purge_expired(), 3);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_abandoned_sessions() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        for _ in 0..500 {
            store.put(&SessionId::generate(), "csrf_token", "tok".into()).await.unwrap();
        }
        assert_eq!(store.len(), 500);

        tokio::time::advance(Duration::from_secs(3600)).await;
        let live = SessionId::generate();
        store.put(&live, "csrf_token", "tok".into()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.load(&live).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_live_sessions() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let stale = SessionId::generate();
        store.put(&stale, "k", 1.into()).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let recent = SessionId::generate();
        store.put(&recent, "k", 1.into()).await.unwrap();

        tokio::time::advance(Duration::from_secs(40)).await;
        store.put(&SessionId::generate(), "k", 1.into()).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.load(&recent).await.unwrap());
        assert!(!store.load(&stale).await.unwrap());
    }

    #[tokio::test]
    async fn test_renew_moves_data() {
        let store = MemorySessionStore::new(LIFETIME);
        let id = SessionId::generate();
        store.put(&id, "csrf_token", "tok".into()).await.unwrap();

        let renewed = store.renew(&id).await.unwrap();

        assert_ne!(renewed, id);
        assert!(!store.load(&id).await.unwrap());
        assert_eq!(
            store.get(&renewed, "csrf_token").await.unwrap(),
            Some("tok".into())
        );
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = MemorySessionStore::new(LIFETIME);
        let id = SessionId::generate();
        store.put(&id, "k", 1.into()).await.unwrap();
        store.destroy(&id).await.unwrap();
        assert!(!store.load(&id).await.unwrap());
    }
}
