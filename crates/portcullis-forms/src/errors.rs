//! Field-keyed validation messages.

use indexmap::IndexMap;
use serde::Serialize;

/// Validation messages keyed by field name.
///
/// Fields keep the order in which they first failed, and each field keeps
/// its messages in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorBag {
    fields: IndexMap<String, Vec<String>>,
}

impl ErrorBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the first message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Returns every message recorded for `field`.
    #[must_use]
    pub fn all(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if no field has a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl<'a> IntoIterator for &'a ErrorBag {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_first_message() {
        let mut bag = ErrorBag::new();
        bag.add("email", "This field cannot be blank");
        bag.add("email", "This field is invalid");

        assert_eq!(bag.get("email"), Some("This field cannot be blank"));
        assert_eq!(bag.all("email").len(), 2);
    }

    #[test]
    fn test_missing_field() {
        let bag = ErrorBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.get("title"), None);
        assert!(bag.all("title").is_empty());
    }

    #[test]
    fn test_field_order_is_insertion_order() {
        let mut bag = ErrorBag::new();
        bag.add("password", "short");
        bag.add("email", "invalid");
        bag.add("password", "blank");

        let fields: Vec<&str> = bag.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["password", "email"]);
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_serializes_as_map() {
        let mut bag = ErrorBag::new();
        bag.add("title", "This field cannot be blank");

        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(json["title"][0], "This field cannot be blank");
    }
}
