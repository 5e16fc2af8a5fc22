//! Request identity types.
//!
//! These are small values the pipeline attaches to every request: a
//! [`RequestId`] for log correlation and the [`RemoteAddr`] of the peer.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

/// Correlates every log record a request produces.
///
/// Backed by a UUID v7, so ids sort by arrival time.
///
/// ```
/// use portcullis_core::RequestId;
///
/// let first = RequestId::new();
/// let second = RequestId::new();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// A fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an id minted elsewhere, e.g. by a proxy.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The wrapped UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The address of the connected peer.
///
/// The server layer inserts this into the request's extensions when it
/// accepts a connection; the request logger reads it back.
///
/// # Example
///
/// ```
/// use portcullis_core::RemoteAddr;
///
/// let addr = RemoteAddr("127.0.0.1:51234".parse().unwrap());
/// assert_eq!(addr.to_string(), "127.0.0.1:51234");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteAddr(pub SocketAddr);

impl std::fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_round_trips_uuid() {
        let uuid = Uuid::now_v7();
        let id = RequestId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_remote_addr_display() {
        let addr = RemoteAddr("[::1]:4000".parse().unwrap());
        assert_eq!(addr.to_string(), "[::1]:4000");
    }
}
