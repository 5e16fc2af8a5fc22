//! User model and the account capabilities the pipeline depends on.

use crate::error::{AuthenticateError, LookupError, RegisterError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a stored user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// When the account was created.
    pub created: DateTime<Utc>,
    /// Deactivated accounts cannot sign in and their sessions are dropped.
    pub active: bool,
}

/// Resolves user ids carried in sessions.
#[async_trait]
pub trait UserLookup: Send + Sync + 'static {
    /// Fetches the user with the given id.
    ///
    /// Returns [`LookupError::NoRecord`] when no such user exists. Any other
    /// failure is [`LookupError::Infrastructure`].
    async fn get_by_id(&self, id: UserId) -> Result<User, LookupError>;
}

/// Verifies login credentials.
///
/// Password hashing lives behind this trait; the pipeline never sees it.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Returns the id of the active user matching `email` and `password`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, AuthenticateError>;
}

/// Creates new user accounts.
#[async_trait]
pub trait UserRegistry: Send + Sync + 'static {
    /// Stores a new account.
    ///
    /// Returns [`RegisterError::DuplicateEmail`] if the email is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), RegisterError>;
}
