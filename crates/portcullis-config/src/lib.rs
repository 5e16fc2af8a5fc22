//! Typed configuration for Portcullis.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (unknown fields are errors)
//! - Layered loading (preset → files → env), validated once at the end
//!
//! # Configuration File Format
//!
//! ```toml
//! [session]
//! cookie_name = "session"
//! path = "/"
//! lifetime_secs = 43200
//! secure = true
//! http_only = true
//! same_site = "lax"
//!
//! [csrf]
//! field = "csrf_token"
//!
//! [auth]
//! login_path = "/user/login"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value above can be overridden with `PREFIX__SECTION__KEY`, for
//! example `PORTCULLIS__SESSION__SECURE=false`.

#![doc(html_root_url = "https://docs.rs/portcullis-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::PortcullisConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AuthConfig, CsrfConfig, SessionConfig};
pub use portcullis_telemetry::{LogConfig, LogFormat};
