//! The per-request context.
//!
//! A [`RequestContext`] is created by the pipeline driver when a request
//! enters a chain and dropped once the response is complete. Every stage and
//! the endpoint receive it by `&mut`; it is never shared between requests.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use portcullis_core::{RequestId, User};
use portcullis_session::Session;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// State that flows through the middleware chain.
///
/// Authentication is fail-closed: a fresh context is unauthenticated and
/// only the authentication stage sets the flag.
///
/// # Example
///
/// ```
/// use http::header::CACHE_CONTROL;
/// use http::HeaderValue;
/// use portcullis_middleware::RequestContext;
///
/// let mut ctx = RequestContext::new();
/// assert!(!ctx.is_authenticated());
/// assert!(ctx.csrf_token().is_none());
///
/// ctx.stage_header(CACHE_CONTROL, HeaderValue::from_static("no-store"));
/// assert_eq!(ctx.staged_headers()[CACHE_CONTROL], "no-store");
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,
    authenticated: bool,
    session: Option<Session>,
    csrf_token: Option<String>,
    staged_headers: HeaderMap,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            authenticated: false,
            session: None,
            csrf_token: None,
            staged_headers: HeaderMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Time since the request entered the chain.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the session resolved to an active user.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Sets the authenticated flag.
    ///
    /// Only the authentication stage should call this.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    /// The authenticated user, if the authentication stage found one.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.get_extension::<User>()
    }

    /// The session attached by the session stage.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Mutable access to the attached session.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Attaches the request's session, replacing any previous one.
    pub fn attach_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// The CSRF token to embed in rendered forms.
    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Records the session's CSRF token.
    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = Some(token.into());
    }

    /// Stages a header for the final response.
    ///
    /// Staged headers are merged by the pipeline driver after the chain
    /// returns, so they also reach short-circuited and recovered responses.
    /// A header the response already carries is never overwritten.
    pub fn stage_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.staged_headers.insert(name, value);
    }

    /// Headers staged so far.
    #[must_use]
    pub fn staged_headers(&self) -> &HeaderMap {
        &self.staged_headers
    }

    /// Copies staged headers into `headers` where they are not already set.
    pub fn apply_staged_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.staged_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    /// Stores a typed extension value.
    ///
    /// ```
    /// use portcullis_middleware::RequestContext;
    ///
    /// struct PageTitle(&'static str);
    ///
    /// let mut ctx = RequestContext::new();
    /// ctx.set_extension(PageTitle("Create a new snippet"));
    /// assert_eq!(ctx.get_extension::<PageTitle>().unwrap().0, "Create a new snippet");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
