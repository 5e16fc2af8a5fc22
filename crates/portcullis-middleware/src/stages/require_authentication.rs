//! Route guard for pages that need a signed-in user.
//!
//! Unauthenticated requests are redirected (`303 See Other`) to the login
//! page and never reach the endpoint. Authenticated responses are marked
//! `Cache-Control: no-store` so shared caches never keep private pages.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder;
use crate::types::{Request, Response};
use http::header::{HeaderValue, CACHE_CONTROL};

/// Default login page.
pub const DEFAULT_LOGIN_PATH: &str = "/user/login";

/// Middleware that rejects unauthenticated requests.
#[derive(Debug, Clone)]
pub struct RequireAuthenticationMiddleware {
    login_path: String,
}

impl RequireAuthenticationMiddleware {
    /// Redirects to [`DEFAULT_LOGIN_PATH`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_login_path(DEFAULT_LOGIN_PATH)
    }

    /// Redirects to `login_path`.
    #[must_use]
    pub fn with_login_path(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    /// Where unauthenticated requests are sent.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl Default for RequireAuthenticationMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequireAuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "require_authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !ctx.is_authenticated() {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    path = request.uri().path(),
                    "unauthenticated request to protected route"
                );
                return responder::redirect(ctx, &self.login_path);
            }
            ctx.stage_header(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::Pipeline;
    use bytes::Bytes;
    use http::header::LOCATION;
    use http::StatusCode;
    use http_body_util::Full;

    async fn run(authenticated: bool) -> Response {
        let pipeline = Pipeline::builder()
            .stage(RequireAuthenticationMiddleware::new())
            .build();
        let endpoint = FnEndpoint::new(|_ctx, _request| responder::text(StatusCode::OK, "secret"));

        let mut ctx = RequestContext::new();
        ctx.set_authenticated(authenticated);
        let request = http::Request::builder()
            .uri("/snippet/create")
            .body(Full::new(Bytes::new()))
            .unwrap();
        pipeline.process_with(&mut ctx, request, &endpoint).await
    }

    #[tokio::test]
    async fn test_unauthenticated_redirects_to_login() {
        let response = run(false).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/user/login");
        assert!(response.headers().get(CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_authenticated_is_not_cached() {
        let response = run(true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_custom_login_path() {
        let mw = RequireAuthenticationMiddleware::with_login_path("/login");
        assert_eq!(mw.login_path(), "/login");
    }
}
