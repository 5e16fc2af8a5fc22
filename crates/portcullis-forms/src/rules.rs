//! Validation rules.
//!
//! Each [`Rule`] inspects one field value and either passes or produces a
//! message. Only [`Rule::Required`] looks at blank values; every other rule
//! treats an empty value as "nothing to check" so that a blank field reports
//! one message, not several.

use regex::Regex;
use std::sync::LazyLock;

/// Email shape accepted by signup forms.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// Message texts produced by the rules.
pub mod messages {
    /// Produced by [`Rule::Required`](super::Rule::Required).
    pub const BLANK: &str = "This field cannot be blank";

    /// Produced by [`Rule::PermittedValues`](super::Rule::PermittedValues) and
    /// [`Rule::MatchesPattern`](super::Rule::MatchesPattern).
    pub const INVALID: &str = "This field is invalid";

    /// Produced by [`Rule::MaxLength`](super::Rule::MaxLength).
    #[must_use]
    pub fn too_long(max: usize) -> String {
        format!("This field is too long (max {max} characters)")
    }

    /// Produced by [`Rule::MinLength`](super::Rule::MinLength).
    #[must_use]
    pub fn too_short(min: usize) -> String {
        format!("This field is too short (min {min} characters)")
    }
}

/// A single validation rule.
#[derive(Debug, Clone, Copy)]
pub enum Rule<'a> {
    /// The trimmed value must not be empty.
    Required,
    /// At most this many characters.
    MaxLength(usize),
    /// At least this many characters.
    MinLength(usize),
    /// Must equal one of the listed values.
    PermittedValues(&'a [&'a str]),
    /// Must match the pattern.
    MatchesPattern(&'a Regex),
}

impl Rule<'_> {
    /// Checks `value`, returning the failure message if the rule is broken.
    ///
    /// Lengths count Unicode scalar values, not bytes.
    #[must_use]
    pub fn check(&self, value: &str) -> Option<String> {
        if let Self::Required = self {
            return value
                .trim()
                .is_empty()
                .then(|| messages::BLANK.to_string());
        }

        if value.is_empty() {
            return None;
        }

        match *self {
            Self::Required => None,
            Self::MaxLength(max) => (value.chars().count() > max).then(|| messages::too_long(max)),
            Self::MinLength(min) => (value.chars().count() < min).then(|| messages::too_short(min)),
            Self::PermittedValues(allowed) => (!allowed.contains(&value))
                .then(|| messages::INVALID.to_string()),
            Self::MatchesPattern(pattern) => (!pattern.is_match(value))
                .then(|| messages::INVALID.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(Rule::Required.check(""), Some(messages::BLANK.to_string()));
        assert_eq!(Rule::Required.check("  \t "), Some(messages::BLANK.to_string()));
        assert_eq!(Rule::Required.check("x"), None);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // five characters, fifteen bytes
        let value = "日本語だよ";
        assert_eq!(Rule::MaxLength(5).check(value), None);
        assert_eq!(Rule::MinLength(5).check(value), None);
        assert_eq!(Rule::MaxLength(4).check(value), Some(messages::too_long(4)));
        assert_eq!(Rule::MinLength(6).check(value), Some(messages::too_short(6)));
    }

    #[test]
    fn test_non_required_rules_skip_empty() {
        let never = ["365"];
        assert_eq!(Rule::MaxLength(0).check(""), None);
        assert_eq!(Rule::MinLength(10).check(""), None);
        assert_eq!(Rule::PermittedValues(&never).check(""), None);
        assert_eq!(Rule::MatchesPattern(&EMAIL_RX).check(""), None);
    }

    #[test]
    fn test_permitted_values() {
        let allowed = ["365", "7", "1"];
        assert_eq!(Rule::PermittedValues(&allowed).check("7"), None);
        assert_eq!(
            Rule::PermittedValues(&allowed).check("30"),
            Some(messages::INVALID.to_string())
        );
    }

    #[test]
    fn test_email_pattern() {
        for valid in ["bob@gmail.com", "bob@gmail", "a.b+tag@sub.example.org"] {
            assert!(EMAIL_RX.is_match(valid), "{valid} should match");
        }
        for invalid in ["bob@gmail.", "bobgmail", "@gmail", "bob@-gmail.com"] {
            assert!(!EMAIL_RX.is_match(invalid), "{invalid} should not match");
        }
    }

    #[test]
    fn test_message_formats() {
        assert_eq!(messages::too_long(100), "This field is too long (max 100 characters)");
        assert_eq!(messages::too_short(10), "This field is too short (min 10 characters)");
    }
}
