//! The two standard chains.
//!
//! ```text
//! base:      Recovery → RequestLogger → SecureHeaders → Session → Csrf → Authenticate
//! protected: base → RequireAuthentication
//! ```
//!
//! Order is load-bearing: recovery guards everything, the logger records
//! requests later rejected by CSRF or authentication, and security headers
//! are staged before anything can short-circuit.

use crate::middleware::Endpoint;
use crate::pipeline::{ChainHandler, Pipeline};
use crate::stages::{
    AuthenticateMiddleware, CsrfMiddleware, RecoveryMiddleware, RequestLoggerMiddleware,
    RequireAuthenticationMiddleware, SecureHeadersMiddleware, SessionMiddleware,
};
use portcullis_core::UserLookup;
use portcullis_session::{CookieSettings, SessionStore};
use std::sync::Arc;

/// Everything the chains need besides the capabilities.
#[derive(Debug, Clone, Default)]
pub struct ChainSettings {
    /// How the session cookie is issued.
    pub cookie: CookieSettings,
    /// Where the route guard sends unauthenticated requests.
    pub login_path: Option<String>,
    /// Security headers staged on every response.
    pub secure_headers: SecureHeadersMiddleware,
    /// CSRF field name in submitted forms.
    pub csrf_field: Option<String>,
}

/// The base and protected chains, built once at startup.
#[derive(Debug, Clone)]
pub struct Chains {
    base: Arc<Pipeline>,
    protected: Arc<Pipeline>,
}

impl Chains {
    /// Builds both chains from explicit settings and capabilities.
    #[must_use]
    pub fn new(
        settings: ChainSettings,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserLookup>,
    ) -> Self {
        let csrf = match settings.csrf_field {
            Some(field) => CsrfMiddleware::new().with_field(field),
            None => CsrfMiddleware::new(),
        };
        let guard = match settings.login_path {
            Some(path) => RequireAuthenticationMiddleware::with_login_path(path),
            None => RequireAuthenticationMiddleware::new(),
        };

        let base = Pipeline::builder()
            .stage(RecoveryMiddleware::new())
            .stage(RequestLoggerMiddleware::new())
            .stage(settings.secure_headers)
            .stage(SessionMiddleware::new(sessions, settings.cookie))
            .stage(csrf)
            .stage(AuthenticateMiddleware::new(users))
            .build();
        let protected = base.extend().stage(guard).build();

        Self {
            base: Arc::new(base),
            protected: Arc::new(protected),
        }
    }

    /// The chain applied to every route.
    #[must_use]
    pub fn base(&self) -> &Pipeline {
        &self.base
    }

    /// The chain for routes that need a signed-in user.
    #[must_use]
    pub fn protected(&self) -> &Pipeline {
        &self.protected
    }

    /// Wraps `endpoint` in the base chain.
    #[must_use]
    pub fn public<E: Endpoint>(&self, endpoint: E) -> ChainHandler {
        ChainHandler::new(Arc::clone(&self.base), Arc::new(endpoint))
    }

    /// Wraps `endpoint` in the protected chain.
    #[must_use]
    pub fn protect<E: Endpoint>(&self, endpoint: E) -> ChainHandler {
        ChainHandler::new(Arc::clone(&self.protected), Arc::new(endpoint))
    }
}
