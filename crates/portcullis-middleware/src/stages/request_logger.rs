//! Request logging middleware.
//!
//! Emits one `info` record per request before anything downstream runs, so
//! requests later rejected by the CSRF or authentication stages are still
//! recorded exactly once. The request and response pass through untouched.
//!
//! # Log fields
//!
//! - `request_id` - the context's request id
//! - `remote_addr` - from the [`RemoteAddr`] request extension, `-` if absent
//! - `proto`, `method`, `uri` - request line, with the path and query
//!
//! # Metrics Emitted
//!
//! - `portcullis_requests_total` - counter labelled by method

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use portcullis_core::RemoteAddr;
use portcullis_telemetry::metrics;

/// Middleware that logs every request line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLoggerMiddleware;

impl RequestLoggerMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for RequestLoggerMiddleware {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let remote_addr = request
                .extensions()
                .get::<RemoteAddr>()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            let target = request
                .uri()
                .path_and_query()
                .map_or_else(|| request.uri().path().to_string(), ToString::to_string);

            tracing::info!(
                request_id = %ctx.request_id(),
                remote_addr = %remote_addr,
                proto = ?request.version(),
                method = %request.method(),
                uri = %target,
                "request"
            );
            metrics::record_request(request.method().as_str());

            let response = next.run(ctx, request).await;

            tracing::debug!(
                request_id = %ctx.request_id(),
                status = response.status().as_u16(),
                duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
                "response"
            );
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::{responder, Pipeline};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use std::net::SocketAddr;

    #[tokio::test]
    async fn test_request_and_response_untouched() {
        let handler = Pipeline::builder()
            .stage(RequestLoggerMiddleware::new())
            .build()
            .into_handler(FnEndpoint::new(|_ctx, request: Request| {
                let addr = request.extensions().get::<RemoteAddr>().copied();
                assert_eq!(addr.map(|a| a.0.port()), Some(40000));
                assert_eq!(request.uri().query(), Some("page=2"));
                responder::text(StatusCode::OK, "listed")
            }));

        let mut request = http::Request::builder()
            .method("GET")
            .uri("/snippet/view?page=2")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        request.extensions_mut().insert(RemoteAddr(addr));

        let response = handler.handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"listed");
    }

    #[tokio::test]
    async fn test_missing_remote_addr_is_fine() {
        let handler = Pipeline::builder()
            .stage(RequestLoggerMiddleware::new())
            .build()
            .into_handler(FnEndpoint::new(|_ctx, _request| {
                responder::text(StatusCode::NO_CONTENT, "")
            }));

        let request = http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(handler.handle(request).await.status(), StatusCode::NO_CONTENT);
    }
}
