//! Request and response types used throughout the pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type used in the pipeline.
///
/// This is a standard `http::Request` with a fully buffered body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;
