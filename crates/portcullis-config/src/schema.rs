//! Configuration sections.

use portcullis_session::{CookieSettings, SameSite};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session cookie and lifetime.
///
/// ```
/// use portcullis_config::SessionConfig;
///
/// let session = SessionConfig::default();
/// assert_eq!(session.cookie_name, "session");
/// assert_eq!(session.lifetime_secs, 12 * 60 * 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie path.
    #[serde(default = "default_cookie_path")]
    pub path: String,

    /// Seconds a session lives after its last write.
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u64,

    /// Send the cookie over HTTPS only.
    #[serde(default = "default_true")]
    pub secure: bool,

    /// Hide the cookie from scripts.
    #[serde(default = "default_true")]
    pub http_only: bool,

    /// Cross-site policy.
    #[serde(default)]
    pub same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            path: default_cookie_path(),
            lifetime_secs: default_lifetime(),
            secure: true,
            http_only: true,
            same_site: SameSite::default(),
        }
    }
}

impl SessionConfig {
    /// Session lifetime as a duration.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    /// Cookie settings for the session stage.
    #[must_use]
    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            name: self.cookie_name.clone(),
            path: self.path.clone(),
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site,
            lifetime: self.lifetime(),
        }
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_lifetime() -> u64 {
    12 * 60 * 60
}

fn default_true() -> bool {
    true
}

/// Anti-forgery token transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CsrfConfig {
    /// Form field carrying the token.
    #[serde(default = "default_csrf_field")]
    pub field: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            field: default_csrf_field(),
        }
    }
}

fn default_csrf_field() -> String {
    "csrf_token".to_string()
}

/// Route guard settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Where unauthenticated requests to protected routes are redirected.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
        }
    }
}

fn default_login_path() -> String {
    "/user/login".to_string()
}
