//! Session attach middleware.
//!
//! Reads the session cookie, attaches a [`Session`] to the context and, once
//! the rest of the chain has answered, issues whatever cookie the session's
//! state calls for.
//!
//! A cookie naming an unknown or expired session is ignored and a fresh id
//! is generated, so a client can never choose its own session id.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder;
use crate::types::{Request, Response};
use http::header::{HeaderValue, SET_COOKIE, VARY};
use portcullis_session::{CookieSettings, Cookies, Session, SessionId, SessionStore};
use std::sync::Arc;

/// Middleware that loads and saves the request's session.
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    cookie: CookieSettings,
}

impl SessionMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, cookie: CookieSettings) -> Self {
        Self { store, cookie }
    }

    /// The cookie settings in use.
    #[must_use]
    pub fn cookie(&self) -> &CookieSettings {
        &self.cookie
    }
}

impl std::fmt::Debug for SessionMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMiddleware")
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl Middleware for SessionMiddleware {
    fn name(&self) -> &'static str {
        "session"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let presented = Cookies::from_headers(request.headers())
                .get(&self.cookie.name)
                .filter(|value| !value.is_empty())
                .map(SessionId::from_cookie);

            let session = match presented {
                Some(id) => match self.store.load(&id).await {
                    Ok(true) => Session::attach(id, Arc::clone(&self.store)),
                    Ok(false) => {
                        tracing::debug!(request_id = %ctx.request_id(), "unknown session cookie, starting a new session");
                        Session::start(Arc::clone(&self.store))
                    }
                    Err(err) => return responder::server_error(ctx, err),
                },
                None => Session::start(Arc::clone(&self.store)),
            };
            ctx.attach_session(session);

            let mut response = next.run(ctx, request).await;

            let cookie = ctx.session().and_then(|s| s.set_cookie(&self.cookie));
            if let Some(cookie) = cookie {
                match HeaderValue::from_str(&cookie.to_header_value()) {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                        response
                            .headers_mut()
                            .append(VARY, HeaderValue::from_static("Cookie"));
                    }
                    Err(err) => {
                        tracing::error!(request_id = %ctx.request_id(), error = %err, "session cookie is not a valid header value");
                    }
                }
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Endpoint, FnEndpoint};
    use crate::{responder, Pipeline};
    use bytes::Bytes;
    use http::header::COOKIE;
    use http::StatusCode;
    use http_body_util::Full;
    use portcullis_session::{keys, MemorySessionStore};
    use std::time::Duration;

    struct PutFlash;

    impl Endpoint for PutFlash {
        fn call<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let Some(session) = ctx.session_mut() else {
                    return responder::text(StatusCode::INTERNAL_SERVER_ERROR, "no session");
                };
                session.put(keys::FLASH, "saved").await.unwrap();
                responder::text(StatusCode::OK, "ok")
            })
        }
    }

    fn store() -> Arc<MemorySessionStore> {
        Arc::new(MemorySessionStore::new(Duration::from_secs(3600)))
    }

    fn settings() -> CookieSettings {
        CookieSettings {
            secure: false,
            ..CookieSettings::default()
        }
    }

    fn request(cookie: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn cookie_id(response: &Response) -> String {
        let header = response.headers()[SET_COOKIE].to_str().unwrap();
        let pair = header.split(';').next().unwrap();
        pair.trim_start_matches("session=").to_string()
    }

    #[tokio::test]
    async fn test_untouched_session_sets_no_cookie() {
        let handler = Pipeline::builder()
            .stage(SessionMiddleware::new(store(), settings()))
            .build()
            .into_handler(FnEndpoint::new(|ctx, _request| {
                assert!(ctx.session().is_some_and(Session::is_new));
                responder::text(StatusCode::OK, "ok")
            }));

        let response = handler.handle(request(None)).await;
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_modified_session_sets_cookie_and_is_reused() {
        let store = store();
        let handler = Pipeline::builder()
            .stage(SessionMiddleware::new(store.clone(), settings()))
            .build()
            .into_handler(PutFlash);

        let first = handler.handle(request(None)).await;
        let id = cookie_id(&first);
        assert!(first.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("HttpOnly; SameSite=Lax"));
        assert!(store.load(&SessionId::from_cookie(id.clone())).await.unwrap());

        let second = handler.handle(request(Some(&format!("session={id}")))).await;
        assert_eq!(cookie_id(&second), id);
    }

    #[tokio::test]
    async fn test_unknown_cookie_is_not_adopted() {
        let store = store();
        let handler = Pipeline::builder()
            .stage(SessionMiddleware::new(store.clone(), settings()))
            .build()
            .into_handler(PutFlash);

        let response = handler
            .handle(request(Some("session=attacker-chosen-id")))
            .await;

        assert_ne!(cookie_id(&response), "attacker-chosen-id");
        assert!(!store
            .load(&SessionId::from_cookie("attacker-chosen-id"))
            .await
            .unwrap());
    }
}
