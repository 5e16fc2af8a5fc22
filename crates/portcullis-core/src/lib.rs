//! # Portcullis Core
//!
//! Core types and capability traits for the Portcullis request pipeline.
//!
//! This crate provides the foundational types used throughout Portcullis:
//!
//! - [`PortcullisError`] - Error taxonomy with HTTP status mapping
//! - [`RequestId`] - UUID v7 request identifier
//! - [`RemoteAddr`] - Peer address carried as a request extension
//! - [`User`] / [`UserId`] - The account model the pipeline resolves sessions against
//! - [`UserLookup`], [`CredentialVerifier`], [`UserRegistry`], [`SnippetStore`] -
//!   capabilities implemented outside the pipeline (SQL, caches, mocks)

#![doc(html_root_url = "https://docs.rs/portcullis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod snippet;
mod user;

pub use context::{RemoteAddr, RequestId};
pub use error::{AuthenticateError, ErrorCategory, LookupError, PortcullisError, RegisterError};
pub use snippet::{Snippet, SnippetStore, LATEST_LIMIT};
pub use user::{CredentialVerifier, User, UserId, UserLookup, UserRegistry};
