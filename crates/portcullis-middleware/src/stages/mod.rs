//! Pipeline stages.
//!
//! The base chain runs these in order:
//!
//! 1. [`recovery`] - turn downstream panics into 500s
//! 2. [`request_logger`] - log every request line
//! 3. [`secure_headers`] - stage protective response headers
//! 4. [`session`] - attach the session, issue its cookie
//! 5. [`csrf`] - issue or verify the anti-forgery token
//! 6. [`authenticate`] - derive the authenticated state from the session
//!
//! The protected chain appends [`require_authentication`].

pub mod authenticate;
pub mod csrf;
pub mod recovery;
pub mod request_logger;
pub mod require_authentication;
pub mod secure_headers;
pub mod session;

pub use authenticate::AuthenticateMiddleware;
pub use csrf::CsrfMiddleware;
pub use recovery::RecoveryMiddleware;
pub use request_logger::RequestLoggerMiddleware;
pub use require_authentication::RequireAuthenticationMiddleware;
pub use secure_headers::SecureHeadersMiddleware;
pub use session::SessionMiddleware;
