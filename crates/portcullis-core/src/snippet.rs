//! Snippet model and storage capability.

use crate::LookupError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most snippets [`SnippetStore::latest`] returns.
pub const LATEST_LIMIT: usize = 10;

/// A stored text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Snippet id.
    pub id: i64,
    /// Title, at most 100 characters.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Expiry time.
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is still visible at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Persists snippets.
///
/// Expired snippets are invisible: `get` reports them as
/// [`LookupError::NoRecord`] and `latest` skips them.
#[async_trait]
pub trait SnippetStore: Send + Sync + 'static {
    /// Inserts a snippet that expires `expires_days` after creation and
    /// returns its id.
    async fn insert(&self, title: &str, content: &str, expires_days: u32) -> anyhow::Result<i64>;

    /// The unexpired snippet with this id.
    async fn get(&self, id: i64) -> Result<Snippet, LookupError>;

    /// Up to [`LATEST_LIMIT`] unexpired snippets, newest first.
    async fn latest(&self) -> anyhow::Result<Vec<Snippet>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_snippet_expires_at_boundary() {
        let created = Utc::now();
        let snippet = Snippet {
            id: 1,
            title: "O snail".to_string(),
            content: "Climb Mount Fuji".to_string(),
            created,
            expires: created + Duration::days(7),
        };
        assert!(snippet.is_live(created));
        assert!(!snippet.is_live(snippet.expires));
    }
}
