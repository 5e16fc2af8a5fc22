//! Panic recovery middleware.
//!
//! Wraps everything after it in `catch_unwind`. A panic anywhere downstream
//! is logged once with its message, its location and the backtrace taken at
//! the panic site, and the client receives an opaque 500 with
//! `Connection: close`. The panic never escapes the chain, and the default
//! hook does not print it a second time.
//!
//! # Pipeline Position
//!
//! Recovery is always the first stage, so nothing runs outside its guard.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder;
use crate::types::{Request, Response};
use futures_util::FutureExt;
use portcullis_telemetry::{metrics, panic};
use std::any::Any;
use std::backtrace::Backtrace;
use std::future::{poll_fn, Future};
use std::panic::AssertUnwindSafe;

/// Middleware that turns downstream panics into 500 responses.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryMiddleware {
    _hook: (),
}

impl RecoveryMiddleware {
    /// Creates the middleware, installing the panic-site capture hook.
    #[must_use]
    pub fn new() -> Self {
        panic::install_hook();
        Self { _hook: () }
    }
}

impl Default for RecoveryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RecoveryMiddleware {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            // After a panic only the request id is read from ctx.
            let mut downstream = Box::pin(next.run(ctx, request));
            let outcome = AssertUnwindSafe(poll_fn(|cx| {
                let _guard = panic::Guard::enter();
                downstream.as_mut().poll(cx)
            }))
            .catch_unwind()
            .await;
            drop(downstream);

            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    // Without the hook's report only this frame is left.
                    let (location, backtrace) = match panic::take_report() {
                        Some(report) => (report.location, report.backtrace),
                        None => (None, Backtrace::force_capture().to_string()),
                    };
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        panic = %message,
                        location = location.as_deref().unwrap_or("-"),
                        backtrace = %backtrace,
                        "recovered from panic while handling request"
                    );
                    metrics::record_panic_recovered();
                    responder::panic_response()
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::Pipeline;
    use bytes::Bytes;
    use http::header::CONNECTION;
    use http::StatusCode;
    use http_body_util::Full;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn request() -> Request {
        http::Request::builder()
            .uri("/snippet/create")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let handler = Pipeline::builder()
            .stage(RecoveryMiddleware::new())
            .build()
            .into_handler(FnEndpoint::new(|_ctx, _request| -> Response {
                panic!("template missing")
            }));

        let response = handler.handle(request()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONNECTION], "close");
    }

    #[tokio::test]
    async fn test_normal_response_passes_through() {
        let handler = Pipeline::builder()
            .stage(RecoveryMiddleware::new())
            .build()
            .into_handler(FnEndpoint::new(|_ctx, _request| {
                crate::responder::text(StatusCode::OK, "fine")
            }));

        let response = handler.handle(request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONNECTION).is_none());
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[inline(never)]
    fn render_snippet_page() -> Response {
        panic!("snippet template missing")
    }

    #[tokio::test]
    async fn test_backtrace_names_panicking_function() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let handler = Pipeline::builder()
            .stage(RecoveryMiddleware::new())
            .build()
            .into_handler(FnEndpoint::new(|_ctx, _request| render_snippet_page()));

        let response = handler.handle(request()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("recovered from panic").count(), 1);
        assert!(logs.contains("render_snippet_page"), "{logs}");
        assert!(logs.contains("recovery.rs:"), "{logs}");
        assert!(panic::take_report().is_none());
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
