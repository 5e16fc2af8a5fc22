//! In-memory client that behaves like a browser with a cookie jar.

use crate::error::TestError;
use crate::response::TestResponse;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::Method;
use http_body_util::Full;
use portcullis_core::RemoteAddr;
use portcullis_middleware::{BoxFuture, ChainHandler, Request, Response};
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

/// Handler function type for the test client.
pub type TestHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

const PEER: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
    40_000,
);

/// Drives a handler in memory.
///
/// Cookies set by responses are stored and sent back on later requests, and
/// redirects are never followed, so a test sees every `303` itself.
///
/// ```ignore
/// let client = TestClient::new(move |request| {
///     let app = app.clone();
///     async move { app.handle(request).await }
/// });
///
/// let csrf = client.get("/user/signup").send().await.csrf_token()?;
/// client
///     .post_form("/user/signup", &[("name", "Bob"), ("csrf_token", &csrf)])
///     .send()
///     .await
///     .assert_redirect("/user/login");
/// ```
#[must_use]
pub struct TestClient {
    handler: TestHandler,
    jar: Mutex<BTreeMap<String, String>>,
}

impl TestClient {
    /// Creates a client around a handler function.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |request| Box::pin(handler(request))),
            jar: Mutex::new(BTreeMap::new()),
        }
    }

    /// Creates a client around a single chained endpoint.
    pub fn from_handler(handler: ChainHandler) -> Self {
        Self::new(move |request| {
            let handler = handler.clone();
            async move { handler.handle(request).await }
        })
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder with no body.
    pub fn post(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a POST request carrying `fields` as an urlencoded form.
    pub fn post_form(&self, uri: impl Into<String>, fields: &[(&str, &str)]) -> TestClientRequest<'_> {
        self.request(Method::POST, uri).form(fields)
    }

    /// Creates a request builder with any method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: Ok(Bytes::new()),
        }
    }

    /// The stored value of cookie `name`.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar().get(name).cloned()
    }

    /// Forgets every stored cookie.
    pub fn clear_cookies(&self) {
        self.jar().clear();
    }

    fn jar(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cookie_header(&self) -> Option<String> {
        let jar = self.jar();
        if jar.is_empty() {
            return None;
        }
        Some(
            jar.iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn store_cookies(&self, response: &Response) {
        let mut jar = self.jar();
        for header in response.headers().get_all(SET_COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            let mut attributes = header.split(';').map(str::trim);
            let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let expired = attributes.any(|attr| attr.eq_ignore_ascii_case("max-age=0"));
            if expired || value.is_empty() {
                jar.remove(name);
            } else {
                jar.insert(name.to_string(), value.to_string());
            }
        }
    }
}

/// A request bound to a [`TestClient`].
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Result<Bytes, TestError>,
}

impl TestClientRequest<'_> {
    /// Sets a header on the request.
    pub fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.push((name, HeaderValue::from_static(value)));
        self
    }

    /// Sets the body to `fields`, urlencoded.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = serde_urlencoded::to_string(fields)
            .map(Bytes::from)
            .map_err(TestError::from);
        self.headers.push((
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        ));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Ok(body.into());
        self
    }

    /// Sends the request, panicking if it cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if the request is malformed.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("request should be valid: {e}"),
        }
    }

    /// Sends the request.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let mut builder = http::Request::builder()
            .method(self.method)
            .uri(self.uri.as_str());
        if let Some(cookies) = self.client.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let mut request = builder.body(Full::new(self.body?))?;
        request.extensions_mut().insert(RemoteAddr(PEER));

        let response = (self.client.handler)(request).await;
        self.client.store_cookies(&response);
        Ok(TestResponse::from_http(response).await)
    }
}
