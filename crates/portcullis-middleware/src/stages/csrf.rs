//! CSRF protection middleware.
//!
//! Each session carries one random token. The middleware has two modes:
//!
//! - **Issuing** (`GET`, `HEAD`, `OPTIONS`, `TRACE`): reuse the session's
//!   token, or generate and store one, and expose it through
//!   [`RequestContext::csrf_token`] for embedding in rendered forms.
//! - **Verifying** (every other method): the submitted token must equal the
//!   session's. It is read from the `X-CSRF-Token` header, falling back to
//!   the `csrf_token` field of a urlencoded form body.
//!
//! A missing session, a session without a token, a missing submitted token
//! or a mismatch all end the request with `400 Bad Request` before the
//! endpoint runs. Tokens are compared in constant time.
//!
//! # Metrics Emitted
//!
//! - `portcullis_csrf_rejections_total` - counter labelled by reason

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder;
use crate::types::{Request, Response};
use bytes::Bytes;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use portcullis_session::{keys, token};
use portcullis_telemetry::metrics;

/// Header carrying the token on AJAX-style submissions.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Form field carrying the token on HTML form submissions.
pub const CSRF_FIELD: &str = "csrf_token";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Why a state-changing request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NoSession,
    NoStoredToken,
    NoSubmittedToken,
    MalformedBody,
    Mismatch,
}

impl Rejection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::NoStoredToken => "no_stored_token",
            Self::NoSubmittedToken => "no_submitted_token",
            Self::MalformedBody => "malformed_body",
            Self::Mismatch => "mismatch",
        }
    }
}

/// Middleware that issues and verifies per-session CSRF tokens.
#[derive(Debug, Clone)]
pub struct CsrfMiddleware {
    header: HeaderName,
    field: String,
}

impl CsrfMiddleware {
    /// Creates the middleware with the default header and field names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: HeaderName::from_static(CSRF_HEADER),
            field: CSRF_FIELD.to_string(),
        }
    }

    /// Uses a different form field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Returns `true` for methods that only read state.
    #[must_use]
    pub fn is_safe_method(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
        )
    }

    async fn issue(&self, ctx: &mut RequestContext) -> Result<(), Response> {
        let Some(session) = ctx.session_mut() else {
            tracing::warn!("no session attached; CSRF token not issued");
            return Ok(());
        };

        let stored = match session.get::<String>(keys::CSRF_TOKEN).await {
            Ok(stored) => stored,
            Err(err) => return Err(responder::server_error(ctx, err)),
        };
        let csrf_token = match stored {
            Some(existing) => existing,
            None => {
                let fresh = token::generate();
                if let Err(err) = session.put(keys::CSRF_TOKEN, &fresh).await {
                    return Err(responder::server_error(ctx, err));
                }
                fresh
            }
        };
        ctx.set_csrf_token(csrf_token);
        Ok(())
    }

    /// Extracts the submitted token, returning the request with its body
    /// intact.
    async fn submitted_token(
        &self,
        request: Request,
    ) -> (Request, Result<String, Rejection>) {
        if let Some(value) = request.headers().get(&self.header) {
            let submitted = value
                .to_str()
                .map(ToString::to_string)
                .map_err(|_| Rejection::NoSubmittedToken);
            return (request, submitted);
        }

        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE));
        if !is_form {
            return (request, Err(Rejection::NoSubmittedToken));
        }

        let (parts, body) = request.into_parts();
        let bytes: Bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let submitted = match serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes) {
            Ok(pairs) => pairs
                .into_iter()
                .find(|(name, _)| *name == self.field)
                .map(|(_, value)| value)
                .ok_or(Rejection::NoSubmittedToken),
            Err(_) => Err(Rejection::MalformedBody),
        };
        (Request::from_parts(parts, Full::new(bytes)), submitted)
    }

    async fn verify(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Result<Request, Response> {
        let Some(session) = ctx.session() else {
            return Err(reject(ctx, Rejection::NoSession));
        };
        let expected = match session.get::<String>(keys::CSRF_TOKEN).await {
            Ok(Some(expected)) => expected,
            Ok(None) => return Err(reject(ctx, Rejection::NoStoredToken)),
            Err(err) => return Err(responder::server_error(ctx, err)),
        };

        let (request, submitted) = self.submitted_token(request).await;
        let submitted = match submitted {
            Ok(submitted) => submitted,
            Err(rejection) => return Err(reject(ctx, rejection)),
        };
        if !token::constant_time_eq(expected.as_bytes(), submitted.as_bytes()) {
            return Err(reject(ctx, Rejection::Mismatch));
        }

        ctx.set_csrf_token(expected);
        Ok(request)
    }
}

impl Default for CsrfMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(ctx: &RequestContext, rejection: Rejection) -> Response {
    tracing::warn!(
        request_id = %ctx.request_id(),
        reason = rejection.as_str(),
        "CSRF check failed"
    );
    metrics::record_csrf_rejection(rejection.as_str());
    responder::client_error(StatusCode::BAD_REQUEST)
}

impl Middleware for CsrfMiddleware {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if Self::is_safe_method(request.method()) {
                if let Err(response) = self.issue(ctx).await {
                    return response;
                }
                return next.run(ctx, request).await;
            }

            match self.verify(ctx, request).await {
                Ok(request) => next.run(ctx, request).await,
                Err(response) => response,
            }
        })
    }
}
