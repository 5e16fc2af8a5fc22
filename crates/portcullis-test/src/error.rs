//! Test error types.

use thiserror::Error;

/// Errors that can occur while driving a request in a test.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(#[from] http::Error),

    /// Form encoding failed.
    #[error("Form encode error: {0}")]
    FormEncode(#[from] serde_urlencoded::ser::Error),

    /// Response body was not what the caller expected.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
