//! In-memory capability doubles.
//!
//! Fixture data:
//!
//! | Capability | Behavior |
//! |------------|----------|
//! | `get_by_id` | `1` is Alice (active), `2` is Bob (deactivated), anything else is `NoRecord` |
//! | `authenticate` | `alice@example.com` / `pa$$word` is user `1`, anything else is invalid |
//! | `insert` (users) | `dupe@blob.com` is a duplicate, anything else succeeds |
//! | `insert` (snippets) | records the snippet and returns `1`, `2`, ... |
//! | `get` / `latest` (snippets) | serve the recorded snippets that have not expired |
//!
//! Each double can be switched to fail with an infrastructure error.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use portcullis_core::{
    AuthenticateError, CredentialVerifier, LookupError, RegisterError, Snippet, SnippetStore, User,
    UserId, UserLookup, UserRegistry, LATEST_LIMIT,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Email of the active fixture user.
pub const ALICE_EMAIL: &str = "alice@example.com";
/// Password of the active fixture user.
pub const ALICE_PASSWORD: &str = "pa$$word";
/// Email the registry reports as already taken.
pub const DUPLICATE_EMAIL: &str = "dupe@blob.com";

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// User lookup, credential check and registration.
#[derive(Debug, Default)]
pub struct MockUsers {
    failing: AtomicBool,
    registered: Mutex<Vec<Registration>>,
}

impl MockUsers {
    /// Fixture-backed users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with an infrastructure error from now on.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Accounts created through [`UserRegistry::insert`].
    #[must_use]
    pub fn registered(&self) -> Vec<Registration> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }

    fn fixture(id: UserId) -> Option<User> {
        let (name, email, active) = match id.0 {
            1 => ("Alice", ALICE_EMAIL, true),
            2 => ("Bob", "bob@example.com", false),
            _ => return None,
        };
        Some(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created: Utc.with_ymd_and_hms(2019, 1, 1, 10, 0, 0).single()?,
            active,
        })
    }
}

#[async_trait]
impl UserLookup for MockUsers {
    async fn get_by_id(&self, id: UserId) -> Result<User, LookupError> {
        if self.is_failing() {
            return Err(LookupError::Infrastructure(anyhow::anyhow!("user store unavailable")));
        }
        Self::fixture(id).ok_or(LookupError::NoRecord)
    }
}

#[async_trait]
impl CredentialVerifier for MockUsers {
    async fn authenticate(&self, email: &str, password: &str) -> Result<UserId, AuthenticateError> {
        if self.is_failing() {
            return Err(AuthenticateError::Infrastructure(anyhow::anyhow!(
                "user store unavailable"
            )));
        }
        if email == ALICE_EMAIL && password == ALICE_PASSWORD {
            Ok(UserId(1))
        } else {
            Err(AuthenticateError::InvalidCredentials)
        }
    }
}

#[async_trait]
impl UserRegistry for MockUsers {
    async fn insert(&self, name: &str, email: &str, _password: &str) -> Result<(), RegisterError> {
        if self.is_failing() {
            return Err(RegisterError::Infrastructure(anyhow::anyhow!("user store unavailable")));
        }
        if email == DUPLICATE_EMAIL {
            return Err(RegisterError::DuplicateEmail);
        }
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                name: name.to_string(),
                email: email.to_string(),
            });
        Ok(())
    }
}

/// A snippet accepted by [`MockSnippets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnippet {
    /// Assigned id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Body.
    pub content: String,
    /// Days until expiry.
    pub expires_days: u32,
    /// Insert time.
    pub created: DateTime<Utc>,
}

impl StoredSnippet {
    /// The snippet as the store serves it.
    #[must_use]
    pub fn to_snippet(&self) -> Snippet {
        Snippet {
            id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            created: self.created,
            expires: self.created + Duration::days(i64::from(self.expires_days)),
        }
    }
}

/// Snippet storage that keeps inserts in memory.
#[derive(Debug, Default)]
pub struct MockSnippets {
    failing: AtomicBool,
    stored: Mutex<Vec<StoredSnippet>>,
}

impl MockSnippets {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail from now on.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Moves every stored snippet `days` into the past.
    pub fn age(&self, days: i64) {
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        for snippet in stored.iter_mut() {
            snippet.created -= Duration::days(days);
        }
    }

    fn live(&self) -> Vec<Snippet> {
        let now = Utc::now();
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(StoredSnippet::to_snippet)
            .filter(|snippet| snippet.is_live(now))
            .collect()
    }

    fn ensure_available(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("snippet store unavailable");
        }
        Ok(())
    }

    /// Everything inserted so far.
    #[must_use]
    pub fn stored(&self) -> Vec<StoredSnippet> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SnippetStore for MockSnippets {
    async fn insert(&self, title: &str, content: &str, expires_days: u32) -> anyhow::Result<i64> {
        self.ensure_available()?;
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let id = i64::try_from(stored.len())? + 1;
        stored.push(StoredSnippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            expires_days,
            created: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, LookupError> {
        self.ensure_available().map_err(LookupError::Infrastructure)?;
        self.live()
            .into_iter()
            .find(|snippet| snippet.id == id)
            .ok_or(LookupError::NoRecord)
    }

    async fn latest(&self) -> anyhow::Result<Vec<Snippet>> {
        self.ensure_available()?;
        let mut live = self.live();
        live.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        live.truncate(LATEST_LIMIT);
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_fixtures() {
        let users = MockUsers::new();
        assert!(users.get_by_id(UserId(1)).await.unwrap().active);
        assert!(!users.get_by_id(UserId(2)).await.unwrap().active);
        assert!(matches!(
            users.get_by_id(UserId(3)).await,
            Err(LookupError::NoRecord)
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let users = MockUsers::new();
        assert_eq!(
            users.authenticate(ALICE_EMAIL, ALICE_PASSWORD).await.unwrap(),
            UserId(1)
        );
        assert!(matches!(
            users.authenticate(ALICE_EMAIL, "wrong").await,
            Err(AuthenticateError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let users = MockUsers::new();
        users.insert("Bob", "bob@gmail.com", "password123").await.unwrap();
        assert!(matches!(
            users.insert("Bob", DUPLICATE_EMAIL, "password123").await,
            Err(RegisterError::DuplicateEmail)
        ));
        assert_eq!(users.registered().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_users() {
        let users = MockUsers::new();
        users.fail();
        assert!(matches!(
            users.get_by_id(UserId(1)).await,
            Err(LookupError::Infrastructure(_))
        ));
    }

    #[tokio::test]
    async fn test_snippet_ids_increase() {
        let snippets = MockSnippets::new();
        assert_eq!(snippets.insert("a", "x", 7).await.unwrap(), 1);
        assert_eq!(snippets.insert("b", "y", 365).await.unwrap(), 2);
        assert_eq!(snippets.stored()[1].expires_days, 365);

        snippets.fail();
        assert!(snippets.insert("c", "z", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_snippets_are_hidden() {
        let snippets = MockSnippets::new();
        snippets.insert("week", "x", 7).await.unwrap();
        snippets.insert("day", "y", 1).await.unwrap();
        snippets.age(2);

        assert_eq!(snippets.get(1).await.unwrap().title, "week");
        assert!(matches!(snippets.get(2).await, Err(LookupError::NoRecord)));
        let latest = snippets.latest().await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, 1);
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_capped() {
        let snippets = MockSnippets::new();
        for n in 0..12 {
            snippets.insert(&format!("snippet {n}"), "x", 365).await.unwrap();
        }

        let latest = snippets.latest().await.unwrap();
        assert_eq!(latest.len(), LATEST_LIMIT);
        assert_eq!(latest[0].id, 12);
        assert_eq!(latest[9].id, 3);
    }
}
