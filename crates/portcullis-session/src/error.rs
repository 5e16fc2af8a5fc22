//! Session error types.

use thiserror::Error;

/// Errors raised by session stores and the session handle.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The backing store failed.
    #[error("session store failure")]
    Backend(#[source] anyhow::Error),

    /// A stored value could not be encoded or decoded.
    #[error("session value for key '{key}' could not be (de)serialized")]
    Codec {
        /// The session key involved.
        key: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Wraps a backend failure.
    pub fn backend(source: impl Into<anyhow::Error>) -> Self {
        Self::Backend(source.into())
    }

    /// Creates a codec error for `key`.
    pub fn codec(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Codec {
            key: key.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_names_key() {
        let source = serde_json::from_str::<i64>("\"x\"").unwrap_err();
        let err = SessionError::codec("authenticated_user_id", source);
        assert!(err.to_string().contains("authenticated_user_id"));
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let err = SessionError::backend(anyhow::anyhow!("redis down"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
