//! Application wiring: configuration and capabilities in, one handler out.

use crate::handlers::{
    CreateSnippet, CreateSnippetForm, Home, Login, LoginForm, Logout, Ping, ShowSnippet, Signup,
    SignupForm,
};
use crate::routes::Routes;
use portcullis_config::PortcullisConfig;
use portcullis_core::{CredentialVerifier, SnippetStore, UserLookup, UserRegistry};
use portcullis_middleware::{ChainSettings, Chains, Request, Response};
use portcullis_session::{MemorySessionStore, SessionStore};
use portcullis_telemetry::{metrics, TelemetryResult};
use std::sync::Arc;

/// Installs the global subscriber from `config.logging`, registers metric
/// descriptions and installs the panic-site capture hook. Call once at
/// startup.
///
/// # Errors
///
/// Returns an error if the log level is invalid or a global subscriber is
/// already installed.
pub fn init_telemetry(config: &PortcullisConfig) -> TelemetryResult<()> {
    portcullis_telemetry::init_logging(&config.logging)?;
    metrics::describe_metrics();
    portcullis_telemetry::panic::install_hook();
    Ok(())
}

/// Everything the application reaches outside the process for.
#[derive(Clone)]
pub struct Capabilities {
    /// Resolves session user ids.
    pub users: Arc<dyn UserLookup>,
    /// Checks login credentials.
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Creates accounts.
    pub registry: Arc<dyn UserRegistry>,
    /// Stores snippets.
    pub snippets: Arc<dyn SnippetStore>,
}

impl Capabilities {
    /// Uses one user store for lookup, credentials and registration.
    pub fn new<U>(users: Arc<U>, snippets: Arc<dyn SnippetStore>) -> Self
    where
        U: UserLookup + CredentialVerifier + UserRegistry,
    {
        Self {
            users: users.clone(),
            credentials: users.clone(),
            registry: users,
            snippets,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// Chain settings derived from configuration.
#[must_use]
pub fn chain_settings(config: &PortcullisConfig) -> ChainSettings {
    ChainSettings {
        cookie: config.session.cookie_settings(),
        login_path: Some(config.auth.login_path.clone()),
        csrf_field: Some(config.csrf.field.clone()),
        ..ChainSettings::default()
    }
}

/// The routed application.
///
/// | Route | Chain | Endpoint |
/// |-------|-------|----------|
/// | `GET /` | base | latest snippets |
/// | `GET /ping` | base | `OK` |
/// | `GET /user/signup` | base | signup page |
/// | `POST /user/signup` | base | create account |
/// | `GET /user/login` | base | login page |
/// | `POST /user/login` | base | sign in |
/// | `POST /user/logout` | protected | sign out |
/// | `GET /snippet/create` | protected | snippet page |
/// | `POST /snippet/create` | protected | create snippet |
/// | `GET /snippet/{id}` | base | one snippet |
///
/// Cloning is cheap; clones share routes and stores.
#[derive(Debug, Clone)]
pub struct Application {
    routes: Arc<Routes>,
    chains: Chains,
}

impl Application {
    /// Wires the routes over an explicit session store.
    #[must_use]
    pub fn new(
        config: &PortcullisConfig,
        sessions: Arc<dyn SessionStore>,
        capabilities: Capabilities,
    ) -> Self {
        let chains = Chains::new(
            chain_settings(config),
            sessions,
            Arc::clone(&capabilities.users),
        );
        let login_path = config.auth.login_path.as_str();

        let routes = Routes::new(chains.clone())
            .get("/", Home::new(Arc::clone(&capabilities.snippets)))
            .get("/ping", Ping)
            .get("/user/signup", SignupForm)
            .post(
                "/user/signup",
                Signup::new(capabilities.registry, login_path),
            )
            .get(login_path, LoginForm)
            .post(login_path, Login::new(capabilities.credentials))
            .post_protected("/user/logout", Logout)
            .get_protected("/snippet/create", CreateSnippetForm)
            .post_protected(
                "/snippet/create",
                CreateSnippet::new(Arc::clone(&capabilities.snippets)),
            )
            .get("/snippet/{id}", ShowSnippet::new(capabilities.snippets));

        tracing::debug!(paths = routes.path_count(), "routes registered");

        Self {
            routes: Arc::new(routes),
            chains,
        }
    }

    /// Wires the routes over an in-memory session store sized from
    /// `config`.
    #[must_use]
    pub fn in_memory(config: &PortcullisConfig, capabilities: Capabilities) -> Self {
        let sessions = Arc::new(MemorySessionStore::new(config.session.lifetime()));
        Self::new(config, sessions, capabilities)
    }

    /// The chains, for mounting extra endpoints elsewhere.
    #[must_use]
    pub fn chains(&self) -> &Chains {
        &self.chains
    }

    /// Handles one request.
    pub async fn handle(&self, request: Request) -> Response {
        self.routes.handle(request).await
    }
}
