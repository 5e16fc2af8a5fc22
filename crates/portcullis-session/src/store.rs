//! The session storage capability.

use crate::error::SessionError;
use crate::token;
use async_trait::async_trait;
use serde_json::Value;

/// Identifier of a server-side session, as carried in the session cookie.
///
/// The id is a bearer secret, so `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(token::generate())
    }

    /// Wraps an id presented by a client.
    #[must_use]
    pub fn from_cookie(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The id as sent in the cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionId(..)")
    }
}

/// Storage for session data, keyed by session id and value key.
///
/// Implementations must give per-key read-after-write consistency: once
/// `put` returns, a `get` of the same session and key observes the value.
/// No cross-request locking is expected.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Returns `true` if a live (unexpired) session with this id exists.
    async fn load(&self, id: &SessionId) -> Result<bool, SessionError>;

    /// Reads one value.
    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<Value>, SessionError>;

    /// Writes one value, creating the session if needed and restarting its
    /// lifetime.
    async fn put(&self, id: &SessionId, key: &str, value: Value) -> Result<(), SessionError>;

    /// Deletes one value, returning it if it was present.
    async fn remove(&self, id: &SessionId, key: &str) -> Result<Option<Value>, SessionError>;

    /// Returns `true` if the session holds `key`.
    async fn exists(&self, id: &SessionId, key: &str) -> Result<bool, SessionError> {
        Ok(self.get(id, key).await?.is_some())
    }

    /// Reads and deletes one value.
    async fn pop(&self, id: &SessionId, key: &str) -> Result<Option<Value>, SessionError> {
        self.remove(id, key).await
    }

    /// Moves the session's data to a new id and forgets the old one.
    async fn renew(&self, id: &SessionId) -> Result<SessionId, SessionError>;

    /// Deletes the session and all of its data.
    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError>;
}
