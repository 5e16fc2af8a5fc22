//! # Portcullis Session
//!
//! Server-side sessions for the Portcullis pipeline.
//!
//! - [`SessionStore`] - the storage capability (`get`, `put`, `remove`,
//!   `exists`, `pop`, ...) keyed by session id and value key
//! - [`MemorySessionStore`] - a concurrent in-process implementation with a
//!   fixed lifetime per session
//! - [`Session`] - the per-request handle the pipeline attaches to each
//!   request; it tracks whether the cookie must be re-issued
//! - [`CookieSettings`], [`Cookies`], [`SetCookie`] - cookie transport
//! - [`token`] - random identifiers and constant-time comparison
//!
//! ## Example
//!
//! ```
//! use portcullis_session::{keys, MemorySessionStore, Session};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(MemorySessionStore::new(Duration::from_secs(12 * 60 * 60)));
//! let mut session = Session::start(store);
//!
//! session.put(keys::FLASH, &"Snippet created successfully!").await.unwrap();
//! let flash = session.pop_string(keys::FLASH).await.unwrap();
//! assert_eq!(flash.as_deref(), Some("Snippet created successfully!"));
//! assert!(!session.exists(keys::FLASH).await.unwrap());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-session/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cookie;
mod error;
pub mod keys;
mod memory;
mod session;
mod store;
pub mod token;

pub use cookie::{CookieSettings, Cookies, SameSite, SetCookie};
pub use error::SessionError;
pub use memory::MemorySessionStore;
pub use session::{Session, SessionState};
pub use store::{SessionId, SessionStore};
