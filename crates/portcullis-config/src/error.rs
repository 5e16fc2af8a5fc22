//! Errors raised while loading or validating configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("config file {path} does not exist")]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("could not read config file {path}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML layer did not parse.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON layer did not parse, or named a field that does not exist.
    #[error("invalid JSON or unknown field: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but breaks a constraint.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the field, e.g. `session.path`.
        field: String,
        /// The broken constraint.
        reason: String,
    },

    /// An override variable could not be parsed.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// Expected shape of the value.
        reason: String,
    },

    /// A file extension or format name that is neither TOML nor JSON.
    #[error("unsupported config format {0:?}")]
    Format(String),

    /// A `.env` file exists but is malformed.
    #[error(".env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
