//! # Portcullis Forms
//!
//! Declarative validation for submitted form data.
//!
//! A [`Form`] wraps the submitted field values together with an [`ErrorBag`].
//! Validation rules append messages to the bag and never stop early: every
//! rule for every field runs, so a single submission reports all of its
//! problems at once.
//!
//! ```
//! use portcullis_forms::Form;
//!
//! let mut form = Form::new([("title", ""), ("content", "x"), ("expires", "365")]);
//! form.require(&["title", "content", "expires"]);
//! form.max_length("title", 100);
//! form.permitted_values("expires", &["365", "7", "1"]);
//!
//! assert!(!form.is_valid());
//! assert_eq!(form.errors().get("title"), Some("This field cannot be blank"));
//! assert_eq!(form.errors().len(), 1);
//! ```
//!
//! Business-rule failures discovered after validation (for example a
//! duplicate email reported by the user store) go through the same bag:
//!
//! ```
//! use portcullis_forms::Form;
//!
//! let mut form = Form::new([("email", "dupe@example.com")]);
//! form.errors_mut().add("email", "Email address already in use");
//! assert!(!form.is_valid());
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-forms/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod errors;
mod form;
mod rules;

pub use errors::ErrorBag;
pub use form::{Form, FormError};
pub use rules::{messages, Rule, EMAIL_RX};
