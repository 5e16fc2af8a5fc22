//! # Portcullis Test
//!
//! In-memory end-to-end testing for Portcullis applications: no sockets, no
//! TLS, no real stores.
//!
//! - [`TestClient`] - sends requests straight into a handler, keeps a cookie
//!   jar between requests and never follows redirects
//! - [`TestResponse`] - buffered response with assertion helpers and
//!   [`TestResponse::csrf_token`] for pulling the token out of a page
//! - [`mocks`] - fixture-backed user and snippet capabilities
//!
//! ## Example
//!
//! ```ignore
//! use portcullis_test::{mocks, TestClient};
//!
//! #[tokio::test]
//! async fn signup_redirects_to_login() {
//!     let client = TestClient::new(move |request| {
//!         let app = app.clone();
//!         async move { app.handle(request).await }
//!     });
//!
//!     let csrf = client.get("/user/signup").send().await.csrf_token().unwrap();
//!     client
//!         .post_form("/user/signup", &[
//!             ("name", "Bob"),
//!             ("email", "bob@gmail.com"),
//!             ("password", "password123"),
//!             ("csrf_token", &csrf),
//!         ])
//!         .send()
//!         .await
//!         .assert_redirect("/user/login");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod mocks;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::TestError;
pub use mocks::{MockSnippets, MockUsers};
pub use response::TestResponse;
