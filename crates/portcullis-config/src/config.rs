//! The root configuration type.

use portcullis_session::SameSite;
use portcullis_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{AuthConfig, ConfigError, CsrfConfig, SessionConfig};

/// Complete Portcullis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use portcullis_config::PortcullisConfig;
///
/// let config = PortcullisConfig::default();
/// assert_eq!(config.auth.login_path, "/user/login");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PortcullisConfig {
    /// Session cookie and lifetime.
    #[serde(default)]
    pub session: SessionConfig,

    /// Anti-forgery token transport.
    #[serde(default)]
    pub csrf: CsrfConfig,

    /// Route guard.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Log subscriber.
    #[serde(default)]
    pub logging: LogConfig,
}

impl PortcullisConfig {
    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;
        if !is_cookie_token(&session.cookie_name) {
            return Err(ConfigError::invalid(
                "session.cookie_name",
                "must be a non-empty token without separators",
            ));
        }
        if !session.path.starts_with('/') {
            return Err(ConfigError::invalid(
                "session.path",
                "must start with '/'",
            ));
        }
        if session.lifetime_secs == 0 {
            return Err(ConfigError::invalid(
                "session.lifetime_secs",
                "must be greater than zero",
            ));
        }
        if session.same_site == SameSite::None && !session.secure {
            return Err(ConfigError::invalid(
                "session.same_site",
                "'none' requires secure cookies",
            ));
        }
        if self.csrf.field.is_empty() {
            return Err(ConfigError::invalid("csrf.field", "must not be empty"));
        }
        if !self.auth.login_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "auth.login_path",
                "must be an absolute path",
            ));
        }
        self.logging
            .validate()
            .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))
    }

    /// Preset for local development: plain-HTTP cookies, pretty debug logs.
    ///
    /// ```
    /// use portcullis_config::PortcullisConfig;
    ///
    /// let config = PortcullisConfig::development();
    /// assert!(!config.session.secure);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.session.secure = false;
        config.logging = LogConfig::development();
        config
    }

    /// Preset for production: secure cookies, JSON logs at info.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.session.secure = true;
        config.logging = LogConfig::production();
        config
    }
}

// RFC 6265 token characters.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}
