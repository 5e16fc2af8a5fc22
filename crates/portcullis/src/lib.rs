//! # Portcullis
//!
//! A session-authenticated, CSRF-protected request pipeline with declarative
//! form validation.
//!
//! Every request passes the base chain:
//!
//! ```text
//! Recovery → RequestLogger → SecureHeaders → Session → Csrf → Authenticate → Endpoint
//! ```
//!
//! and routes for signed-in users add `RequireAuthentication` before the
//! endpoint. Endpoints validate submitted forms with [`forms::Form`] and
//! answer with a JSON page (`422` on validation failure) or a `303`
//! redirect with a flash message.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portcullis::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("portcullis.toml")?
//!     .with_env_prefix("PORTCULLIS")
//!     .load()?;
//! init_telemetry(&config)?;
//!
//! let app = Application::in_memory(&config, Capabilities::new(users, snippets));
//! let response = app.handle(request).await;
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod handlers;
pub mod page;
pub mod routes;

pub use app::{chain_settings, init_telemetry, Application, Capabilities};

// Re-export the member crates
pub use portcullis_config as config;
pub use portcullis_core as core;
pub use portcullis_forms as forms;
pub use portcullis_middleware as middleware;
pub use portcullis_session as session;
pub use portcullis_telemetry as telemetry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{init_telemetry, Application, Capabilities};
    pub use portcullis_config::{ConfigLoader, PortcullisConfig};
    pub use portcullis_core::{
        CredentialVerifier, PortcullisError, SnippetStore, User, UserId, UserLookup, UserRegistry,
    };
    pub use portcullis_forms::{Form, EMAIL_RX};
    pub use portcullis_middleware::{Chains, Endpoint, Request, RequestContext, Response};
    pub use portcullis_session::{MemorySessionStore, SessionStore};
}
