//! # Portcullis Middleware
//!
//! The request pipeline: an ordered chain of interceptors in front of every
//! endpoint.
//!
//! ## Chains
//!
//! ```text
//! Request → Recovery → RequestLogger → SecureHeaders → Session → Csrf → Authenticate ─┐
//!                                                                                     │
//!           (protected routes only) RequireAuthentication ←───────────────────────────┘
//!                                          ↓
//!                                       Endpoint
//! ```
//!
//! | Stage                   | Purpose                                            |
//! |-------------------------|----------------------------------------------------|
//! | Recovery                | Contain panics, answer 500 + `Connection: close`   |
//! | RequestLogger           | One structured log record per request              |
//! | SecureHeaders           | `X-XSS-Protection`, `X-Frame-Options`              |
//! | Session                 | Attach the session, issue its cookie               |
//! | Csrf                    | Issue tokens on safe methods, verify on the rest   |
//! | Authenticate            | Resolve the session's user, self-heal stale ids    |
//! | RequireAuthentication   | Redirect anonymous users to the login page         |
//!
//! Every stage receives the same [`RequestContext`] by `&mut`. Headers a
//! stage wants on the final response are staged on the context and merged
//! by the driver, so they also reach short-circuited and recovered responses.
//!
//! ## Example
//!
//! ```
//! use portcullis_middleware::{ChainSettings, Chains};
//! # use async_trait::async_trait;
//! # use portcullis_core::{LookupError, User, UserId, UserLookup};
//! use portcullis_session::MemorySessionStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # struct Users;
//! # #[async_trait]
//! # impl UserLookup for Users {
//! #     async fn get_by_id(&self, _id: UserId) -> Result<User, LookupError> {
//! #         Err(LookupError::NoRecord)
//! #     }
//! # }
//! let chains = Chains::new(
//!     ChainSettings::default(),
//!     Arc::new(MemorySessionStore::new(Duration::from_secs(12 * 60 * 60))),
//!     Arc::new(Users),
//! );
//! assert_eq!(chains.base().stage_count(), 6);
//! assert_eq!(chains.protected().stage_count(), 7);
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chains;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod responder;
pub mod stages;
pub mod types;

pub use chains::{ChainSettings, Chains};
pub use context::RequestContext;
pub use middleware::{BoxFuture, Endpoint, FnEndpoint, Middleware, Next};
pub use pipeline::{BoxedMiddleware, ChainHandler, Pipeline, PipelineBuilder};
pub use types::{Request, Response};
