//! Response builders shared by the stages and endpoints.
//!
//! Infrastructure failures are logged here with full detail and answered
//! with an opaque 500; client errors carry only the canonical status text.

use crate::context::RequestContext;
use crate::types::Response;
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use portcullis_core::PortcullisError;
use serde::Serialize;

/// A plain-text response.
#[must_use]
pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// A JSON response.
///
/// Falls back to an opaque 500 if `body` cannot be serialized.
pub fn json<T: Serialize + ?Sized>(ctx: &RequestContext, status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => server_error(ctx, err),
    }
}

/// A client-error response with the canonical status text as its body.
#[must_use]
pub fn client_error(status: StatusCode) -> Response {
    let mut response = text(status, status.canonical_reason().unwrap_or("Error"));
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// A 404.
#[must_use]
pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Logs an infrastructure failure and returns an opaque 500.
///
/// The full error chain goes to the log; the client sees only
/// `Internal Server Error`.
pub fn server_error(ctx: &RequestContext, err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    tracing::error!(
        request_id = %ctx.request_id(),
        error = ?err,
        "request failed with an internal error"
    );
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The response sent after a recovered panic. The connection must not be
/// reused.
#[must_use]
pub fn panic_response() -> Response {
    let mut response = client_error(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// A `303 See Other` to `location`.
///
/// A location that is not a valid header value is an internal error.
pub fn redirect(ctx: &RequestContext, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::SEE_OTHER;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(err) => server_error(ctx, err),
    }
}

/// Maps a [`PortcullisError`] to its response.
///
/// Internal errors are logged; the others only set the status.
pub fn from_error(ctx: &RequestContext, err: PortcullisError) -> Response {
    if err.is_internal() {
        return server_error(ctx, err);
    }
    tracing::debug!(request_id = %ctx.request_id(), error = %err, "client error");
    client_error(err.status_code())
}
