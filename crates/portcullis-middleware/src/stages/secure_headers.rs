//! Security header middleware.
//!
//! Stages protective headers on the context before delegating. The pipeline
//! driver merges them into whatever response comes back, so error responses
//! and recovered panics carry them too.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::header::{HeaderName, HeaderValue, X_FRAME_OPTIONS, X_XSS_PROTECTION};

/// Middleware that adds security headers to every response.
///
/// Defaults to `X-XSS-Protection: 1; mode=block` and `X-Frame-Options: deny`.
#[derive(Debug, Clone)]
pub struct SecureHeadersMiddleware {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecureHeadersMiddleware {
    /// Creates the middleware with the default headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: vec![
                (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
                (X_FRAME_OPTIONS, HeaderValue::from_static("deny")),
            ],
        }
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.retain(|(existing, _)| existing != name);
        self.headers.push((name, value));
        self
    }

    /// The headers this middleware stages.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

impl Default for SecureHeadersMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for SecureHeadersMiddleware {
    fn name(&self) -> &'static str {
        "secure_headers"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            for (name, value) in &self.headers {
                ctx.stage_header(name.clone(), value.clone());
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::{responder, Pipeline};
    use bytes::Bytes;
    use http::header::REFERRER_POLICY;
    use http::StatusCode;
    use http_body_util::Full;

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_headers_on_success_and_error() {
        for status in [StatusCode::OK, StatusCode::NOT_FOUND] {
            let handler = Pipeline::builder()
                .stage(SecureHeadersMiddleware::new())
                .build()
                .into_handler(FnEndpoint::new(move |_ctx, _request| {
                    responder::client_error(status)
                }));

            let response = handler.handle(request()).await;

            assert_eq!(response.status(), status);
            assert_eq!(response.headers()[X_XSS_PROTECTION], "1; mode=block");
            assert_eq!(response.headers()[X_FRAME_OPTIONS], "deny");
        }
    }

    #[test]
    fn test_with_header_replaces() {
        let mw = SecureHeadersMiddleware::new()
            .with_header(X_FRAME_OPTIONS, HeaderValue::from_static("sameorigin"))
            .with_header(REFERRER_POLICY, HeaderValue::from_static("same-origin"));

        assert_eq!(mw.headers().len(), 3);
        assert!(mw
            .headers()
            .iter()
            .any(|(n, v)| n == X_FRAME_OPTIONS && v == "sameorigin"));
    }
}
