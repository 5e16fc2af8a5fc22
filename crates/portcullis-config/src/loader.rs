//! Layered configuration loading.
//!
//! Layers apply in order, each overriding the previous one field by field:
//! 1. Defaults or a preset
//! 2. Configuration files (TOML or JSON)
//! 3. Environment variables (`PREFIX__SECTION__KEY`)
//!
//! Validation runs once, on the final result.

use std::env;
use std::fs;
use std::path::Path;

use portcullis_session::SameSite;
use portcullis_telemetry::LogFormat;
use serde_json::Value;

use crate::{ConfigError, PortcullisConfig};

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use portcullis_config::ConfigLoader;
///
/// # fn main() -> Result<(), portcullis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_file("portcullis.toml")?
///     .with_env_prefix("PORTCULLIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PortcullisConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`PortcullisConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PortcullisConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PortcullisConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = PortcullisConfig::production();
        self
    }

    /// Layers a configuration file over the current values.
    ///
    /// The format follows the extension (`.toml` or `.json`). Fields absent
    /// from the file keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, of an unknown
    /// format, or does not match the schema.
    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::missing(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        self.with_string(&content, &format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layers configuration text in `format` (`toml` or `json`).
    ///
    /// ```
    /// use portcullis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[session]\ncookie_name = \"sid\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.session.cookie_name, "sid");
    /// assert_eq!(config.auth.login_path, "/user/login");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unsupported.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::Format(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge_values(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Enables environment overrides with `prefix`.
    ///
    /// With prefix `PORTCULLIS`:
    /// - `PORTCULLIS__SESSION__COOKIE_NAME=sid`
    /// - `PORTCULLIS__LOGGING__FORMAT=pretty`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory into the process environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies overrides from the process environment and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(self) -> Result<PortcullisConfig, ConfigError> {
        self.load_with_vars(env::vars())
    }

    /// Applies overrides from `vars` instead of the process environment, then
    /// validates.
    ///
    /// ```
    /// use portcullis_config::ConfigLoader;
    ///
    /// let vars = [("APP__AUTH__LOGIN_PATH".to_string(), "/login".to_string())];
    /// let config = ConfigLoader::new()
    ///     .with_env_prefix("app")
    ///     .load_with_vars(vars)
    ///     .unwrap();
    ///
    /// assert_eq!(config.auth.login_path, "/login");
    /// ```
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load).
    pub fn load_with_vars<I>(mut self, vars: I) -> Result<PortcullisConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            for (key, value) in vars {
                if let Some(path) = key
                    .strip_prefix(prefix.as_str())
                    .and_then(|k| k.strip_prefix("__"))
                {
                    let parts: Vec<&str> = path.split("__").collect();
                    self.apply_env_var(&key, &parts, &value)?;
                }
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without validating it.
    #[must_use]
    pub fn load_unvalidated(self) -> PortcullisConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, parts: &[&str], value: &str) -> Result<(), ConfigError> {
        let config = &mut self.config;
        match parts {
            ["SESSION", "COOKIE_NAME"] => config.session.cookie_name = value.to_string(),
            ["SESSION", "PATH"] => config.session.path = value.to_string(),
            ["SESSION", "LIFETIME_SECS"] => {
                config.session.lifetime_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["SESSION", "SECURE"] => config.session.secure = parse_bool(key, value)?,
            ["SESSION", "HTTP_ONLY"] => config.session.http_only = parse_bool(key, value)?,
            ["SESSION", "SAME_SITE"] => {
                config.session.same_site = SameSite::parse(value).ok_or_else(|| {
                    ConfigError::env(key, "expected 'none', 'lax', or 'strict'")
                })?;
            }

            ["CSRF", "FIELD"] => config.csrf.field = value.to_string(),

            ["AUTH", "LOGIN_PATH"] => config.auth.login_path = value.to_string(),

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = LogFormat::parse(value)
                    .ok_or_else(|| ConfigError::env(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "ANSI"] => config.logging.ansi = parse_bool(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => {
                config.logging.file_line_info = parse_bool(key, value)?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                config.logging.include_target = parse_bool(key, value)?;
            }

            // Unknown keys under the prefix are ignored.
            _ => {}
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(key, "expected boolean")),
    }
}

// Objects merge recursively; any other value replaces.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}
