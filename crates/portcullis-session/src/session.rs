//! The per-request session handle.

use crate::cookie::{CookieSettings, SetCookie};
use crate::error::SessionError;
use crate::store::{SessionId, SessionStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// What happened to a session while a request was handled.
///
/// The session stage uses this to decide whether the response needs a
/// `Set-Cookie` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing was written.
    #[default]
    Unchanged,
    /// At least one value was written or removed.
    Modified,
    /// The session moved to a new id.
    Renewed,
    /// The session was deleted.
    Destroyed,
}

/// A session bound to one request.
///
/// Reads and writes go straight to the [`SessionStore`]; the handle only
/// remembers the id and whether the client's cookie has gone stale.
pub struct Session {
    id: SessionId,
    store: Arc<dyn SessionStore>,
    state: SessionState,
    is_new: bool,
}

impl Session {
    /// Starts a brand-new session with a random id.
    ///
    /// Nothing is written to the store until the first `put`.
    #[must_use]
    pub fn start(store: Arc<dyn SessionStore>) -> Self {
        Self {
            id: SessionId::generate(),
            store,
            state: SessionState::Unchanged,
            is_new: true,
        }
    }

    /// Attaches to a session the store already knows about.
    #[must_use]
    pub fn attach(id: SessionId, store: Arc<dyn SessionStore>) -> Self {
        Self {
            id,
            store,
            state: SessionState::Unchanged,
            is_new: false,
        }
    }

    /// The current id.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// What has happened to the session so far.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `true` if the client did not present a live session.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Reads and decodes `key`.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the stored value is not a `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.store.get(&self.id, key).await? {
            Some(value) => decode(key, value).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes and stores `value` under `key`.
    ///
    /// Writing to a destroyed session starts a fresh one under a new id.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be encoded or the store fails.
    pub async fn put<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|e| SessionError::codec(key, e))?;
        if self.state == SessionState::Destroyed {
            self.id = SessionId::generate();
            self.state = SessionState::Renewed;
        }
        self.store.put(&self.id, key, value).await?;
        self.mark_modified();
        Ok(())
    }

    /// Deletes `key`. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Fails if the store fails.
    pub async fn remove(&mut self, key: &str) -> Result<bool, SessionError> {
        let removed = self.store.remove(&self.id, key).await?.is_some();
        if removed {
            self.mark_modified();
        }
        Ok(removed)
    }

    /// Returns `true` if `key` is present.
    ///
    /// # Errors
    ///
    /// Fails if the store fails.
    pub async fn exists(&self, key: &str) -> Result<bool, SessionError> {
        self.store.exists(&self.id, key).await
    }

    /// Reads and deletes `key`, for one-shot values such as flash messages.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the stored value is not a `T`.
    pub async fn pop<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, SessionError> {
        let Some(value) = self.store.pop(&self.id, key).await? else {
            return Ok(None);
        };
        self.mark_modified();
        decode(key, value).map(Some)
    }

    /// [`Session::pop`] for string values.
    ///
    /// # Errors
    ///
    /// See [`Session::pop`].
    pub async fn pop_string(&mut self, key: &str) -> Result<Option<String>, SessionError> {
        self.pop(key).await
    }

    /// Moves the session's data to a new id.
    ///
    /// Call this whenever the privilege level changes (login, logout) so a
    /// previously observed id cannot be replayed.
    ///
    /// # Errors
    ///
    /// Fails if the store fails.
    pub async fn renew(&mut self) -> Result<(), SessionError> {
        self.id = self.store.renew(&self.id).await?;
        self.state = SessionState::Renewed;
        Ok(())
    }

    /// Deletes the session and everything in it.
    ///
    /// # Errors
    ///
    /// Fails if the store fails.
    pub async fn destroy(&mut self) -> Result<(), SessionError> {
        self.store.destroy(&self.id).await?;
        self.state = SessionState::Destroyed;
        Ok(())
    }

    /// The cookie the response must carry, if any.
    ///
    /// Unchanged sessions need none; a destroyed session the client knew
    /// about gets an expiring cookie.
    #[must_use]
    pub fn set_cookie(&self, settings: &CookieSettings) -> Option<SetCookie> {
        match self.state {
            SessionState::Unchanged => None,
            SessionState::Modified | SessionState::Renewed => {
                Some(settings.to_set_cookie(&self.id))
            }
            SessionState::Destroyed if self.is_new => None,
            SessionState::Destroyed => Some(settings.expired()),
        }
    }

    fn mark_modified(&mut self) {
        if self.state == SessionState::Unchanged {
            self.state = SessionState::Modified;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("is_new", &self.is_new)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: serde_json::Value) -> Result<T, SessionError> {
    serde_json::from_value(value).map_err(|e| SessionError::codec(key, e))
}
