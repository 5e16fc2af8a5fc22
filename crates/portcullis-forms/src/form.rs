//! Submitted form data and its validation state.

use crate::errors::ErrorBag;
use crate::rules::Rule;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Failure to decode a submitted form body.
#[derive(Error, Debug)]
pub enum FormError {
    /// The body was not valid `application/x-www-form-urlencoded` data.
    #[error("malformed form body: {0}")]
    Malformed(#[from] serde_urlencoded::de::Error),
}

/// Submitted field values plus the errors found while validating them.
///
/// Fields may carry several values; they are kept in submission order.
/// The form is valid exactly when its error bag is empty, and that is
/// checked fresh on every call to [`Form::is_valid`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Form {
    values: IndexMap<String, Vec<String>>,
    errors: ErrorBag,
}

impl Form {
    /// Builds a form from `(field, value)` pairs.
    ///
    /// Repeated fields accumulate values in order.
    pub fn new<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
        for (field, value) in data {
            values.entry(field.into()).or_default().push(value.into());
        }
        Self {
            values,
            errors: ErrorBag::new(),
        }
    }

    /// An empty form, for rendering a blank page.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Malformed`] if the body cannot be decoded.
    ///
    /// ```
    /// use portcullis_forms::Form;
    ///
    /// let form = Form::from_urlencoded(b"tag=a&tag=b&title=hello+world").unwrap();
    /// assert_eq!(form.get("title"), "hello world");
    /// assert_eq!(form.values("tag"), ["a", "b"]);
    /// ```
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, FormError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
        Ok(Self::new(pairs))
    }

    /// Returns the first value of `field`, or `""` if it was not submitted.
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.values
            .get(field)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    /// Returns every value submitted for `field`.
    #[must_use]
    pub fn values(&self, field: &str) -> &[String] {
        self.values.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `field` was submitted at all.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Drops `field` and its values, keeping any recorded errors. Used to
    /// keep secrets such as passwords out of a re-rendered form.
    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        self.values.shift_remove(field)
    }

    /// Runs `rule` against `field`, recording a message if it fails.
    pub fn check(&mut self, field: &str, rule: Rule<'_>) {
        if let Some(message) = rule.check(self.get(field)) {
            self.errors.add(field, message);
        }
    }

    /// Runs every `(field, rule)` pair. No rule is skipped because an
    /// earlier one failed.
    pub fn validate<'r>(&mut self, rules: impl IntoIterator<Item = (&'r str, Rule<'r>)>) {
        for (field, rule) in rules {
            self.check(field, rule);
        }
    }

    /// Each listed field must be non-blank.
    pub fn require(&mut self, fields: &[&str]) {
        for field in fields {
            self.check(field, Rule::Required);
        }
    }

    /// `field` must be at most `max` characters.
    pub fn max_length(&mut self, field: &str, max: usize) {
        self.check(field, Rule::MaxLength(max));
    }

    /// `field` must be at least `min` characters.
    pub fn min_length(&mut self, field: &str, min: usize) {
        self.check(field, Rule::MinLength(min));
    }

    /// `field` must equal one of `allowed`.
    pub fn permitted_values(&mut self, field: &str, allowed: &[&str]) {
        self.check(field, Rule::PermittedValues(allowed));
    }

    /// `field` must match `pattern`.
    pub fn matches_pattern(&mut self, field: &str, pattern: &Regex) {
        self.check(field, Rule::MatchesPattern(pattern));
    }

    /// `true` when no rule has failed and no caller-added error exists.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The accumulated errors.
    #[must_use]
    pub fn errors(&self) -> &ErrorBag {
        &self.errors
    }

    /// Mutable access for business-rule failures found after validation.
    pub fn errors_mut(&mut self) -> &mut ErrorBag {
        &mut self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{messages, EMAIL_RX};

    #[test]
    fn test_snippet_form_with_blank_title() {
        let mut form = Form::new([("title", ""), ("content", "x"), ("expires", "365")]);
        form.require(&["title", "content", "expires"]);
        form.max_length("title", 100);
        form.permitted_values("expires", &["365", "7", "1"]);

        assert!(!form.is_valid());
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.errors().all("title"), [messages::BLANK]);
    }

    #[test]
    fn test_email_pattern_failure() {
        let mut form = Form::new([("email", "bob@gmail."), ("password", "password123")]);
        form.matches_pattern("email", &EMAIL_RX);

        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.errors().all("email"), [messages::INVALID]);
    }

    #[test]
    fn test_short_password() {
        let mut form = Form::new([("password", "pwd1")]);
        form.min_length("password", 10);

        assert_eq!(
            form.errors().get("password"),
            Some("This field is too short (min 10 characters)")
        );
    }

    #[test]
    fn test_missing_field_is_blank() {
        let mut form = Form::empty();
        form.require(&["name"]);
        assert_eq!(form.errors().get("name"), Some(messages::BLANK));
        assert_eq!(form.get("name"), "");
    }

    #[test]
    fn test_rules_accumulate_on_one_field() {
        let long_bad_email = format!("{}@", "a".repeat(300));
        let mut form = Form::new([("email", long_bad_email.as_str())]);
        form.require(&["email"]);
        form.max_length("email", 255);
        form.matches_pattern("email", &EMAIL_RX);

        assert_eq!(
            form.errors().all("email"),
            [messages::too_long(255), messages::INVALID.to_string()]
        );
    }

    #[test]
    fn test_rules_accumulate_across_fields() {
        let mut form = Form::new([("name", ""), ("email", "bob"), ("password", "short")]);
        form.require(&["name", "email", "password"]);
        form.matches_pattern("email", &EMAIL_RX);
        form.min_length("password", 10);

        assert_eq!(form.errors().len(), 3);
        assert_eq!(form.errors().get("name"), Some(messages::BLANK));
        assert_eq!(form.errors().get("email"), Some(messages::INVALID));
        assert_eq!(form.errors().get("password"), Some(messages::too_short(10).as_str()));
    }

    #[test]
    fn test_validity_is_recomputed() {
        let mut form = Form::new([("title", "ok")]);
        form.require(&["title"]);
        assert!(form.is_valid());

        form.errors_mut().add("title", "Title already taken");
        assert!(!form.is_valid());
    }

    #[test]
    fn test_validate_applies_rule_list() {
        let allowed = ["365", "7", "1"];
        let mut form = Form::new([("title", ""), ("expires", "30")]);
        form.validate([
            ("title", Rule::Required),
            ("title", Rule::MaxLength(100)),
            ("expires", Rule::Required),
            ("expires", Rule::PermittedValues(&allowed)),
        ]);

        assert_eq!(form.errors().get("title"), Some(messages::BLANK));
        assert_eq!(form.errors().get("expires"), Some(messages::INVALID));
    }

    #[test]
    fn test_multi_valued_fields_keep_order() {
        let form = Form::new([("tag", "b"), ("tag", "a"), ("title", "t")]);
        assert_eq!(form.values("tag"), ["b", "a"]);
        assert_eq!(form.get("tag"), "b");
        assert!(form.has("title"));
        assert!(!form.has("content"));
    }

    #[test]
    fn test_from_urlencoded_decodes() {
        let form = Form::from_urlencoded(b"email=bob%40example.com&name=Bob+Smith").unwrap();
        assert_eq!(form.get("email"), "bob@example.com");
        assert_eq!(form.get("name"), "Bob Smith");
    }

    #[test]
    fn test_form_serializes_values_and_errors() {
        let mut form = Form::new([("title", "")]);
        form.require(&["title"]);

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["values"]["title"][0], "");
        assert_eq!(json["errors"]["title"][0], messages::BLANK);
    }

    #[test]
    fn test_remove_keeps_errors() {
        let mut form = Form::new([("email", "bob@gmail.com"), ("password", "pwd1")]);
        form.min_length("password", 10);
        assert_eq!(form.remove("password"), Some(vec!["pwd1".to_string()]));
        assert!(!form.has("password"));
        assert_eq!(
            form.errors().get("password"),
            Some("This field is too short (min 10 characters)")
        );
        assert_eq!(form.remove("password"), None);
    }
}
