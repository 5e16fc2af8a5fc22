//! Buffered response with assertion helpers.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use portcullis_middleware::Response;
use serde::de::DeserializeOwned;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads `response` to the end.
    pub async fn from_http(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        // Full<Bytes> is infallible.
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header_str(header::LOCATION.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// The anti-forgery token a page response carries in its `csrf_token`
    /// field.
    pub fn csrf_token(&self) -> Result<String, TestError> {
        self.json_value()?
            .get("csrf_token")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TestError::BodyRead("no csrf token found in body".to_string()))
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self.header_str(name);
        assert_eq!(
            actual,
            Some(expected),
            "Expected header {name} = {expected:?}, got {actual:?}"
        );
        self
    }

    /// Asserts a `303 See Other` to `location`.
    ///
    /// # Panics
    ///
    /// Panics on any other status or target.
    pub fn assert_redirect(&self, location: &str) -> &Self {
        self.assert_status(StatusCode::SEE_OTHER)
            .assert_header(header::LOCATION.as_str(), location)
    }

    /// Asserts that the body contains `needle`.
    ///
    /// # Panics
    ///
    /// Panics if it doesn't.
    pub fn assert_body_contains(&self, needle: &str) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert!(body.contains(needle), "Expected body to contain {needle:?}, got {body}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    async fn response(status: StatusCode, body: &'static str) -> TestResponse {
        let response = http::Response::builder()
            .status(status)
            .header(header::LOCATION, "/user/login")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap();
        TestResponse::from_http(response).await
    }

    #[tokio::test]
    async fn test_csrf_token_from_page() {
        let page = response(StatusCode::OK, r#"{"csrf_token":"abc","flash":null}"#).await;
        assert_eq!(page.csrf_token().unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_csrf_token_missing() {
        let page = response(StatusCode::OK, r#"{"flash":null}"#).await;
        assert!(matches!(page.csrf_token(), Err(TestError::BodyRead(_))));
    }

    #[tokio::test]
    async fn test_assertions_chain() {
        let page = response(StatusCode::SEE_OTHER, "").await;
        page.assert_redirect("/user/login");
        assert_eq!(page.location(), Some("/user/login"));
    }
}
