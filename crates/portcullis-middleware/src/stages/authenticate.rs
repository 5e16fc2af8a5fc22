//! Session-backed authentication middleware.
//!
//! Derives the request's authenticated state from the session:
//!
//! | Session / lookup                    | Outcome                                   |
//! |-------------------------------------|-------------------------------------------|
//! | no `authenticated_user_id`          | continue unauthenticated                  |
//! | user not found                      | clear the id, continue unauthenticated    |
//! | user found, inactive                | clear the id, continue unauthenticated    |
//! | user found, active                  | mark authenticated, attach the [`User`]   |
//! | id stored but unreadable            | clear the id, continue unauthenticated    |
//! | lookup or session failure           | 500, request ends                         |
//!
//! Nothing is retried.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::responder;
use crate::types::{Request, Response};
use portcullis_core::{LookupError, User, UserId, UserLookup};
use portcullis_session::{keys, SessionError};
use std::sync::Arc;

/// Middleware that resolves the session's user id.
pub struct AuthenticateMiddleware {
    users: Arc<dyn UserLookup>,
}

impl AuthenticateMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(users: Arc<dyn UserLookup>) -> Self {
        Self { users }
    }

    /// Resolves the session's user, clearing a stale id.
    ///
    /// `Ok(None)` means the request continues unauthenticated.
    async fn resolve(&self, ctx: &mut RequestContext) -> Result<Option<User>, Response> {
        let Some(session) = ctx.session() else {
            return Ok(None);
        };
        let user_id = match session.get::<UserId>(keys::AUTHENTICATED_USER_ID).await {
            Ok(Some(user_id)) => Some(user_id),
            Ok(None) => return Ok(None),
            Err(err @ SessionError::Codec { .. }) => {
                tracing::info!(request_id = %ctx.request_id(), error = %err, "session user id is unreadable, clearing");
                None
            }
            Err(err) => return Err(responder::server_error(ctx, err)),
        };

        if let Some(user_id) = user_id {
            if let Some(user) = self.lookup(ctx, user_id).await? {
                return Ok(Some(user));
            }
        }

        if let Some(session) = ctx.session_mut() {
            if let Err(err) = session.remove(keys::AUTHENTICATED_USER_ID).await {
                return Err(responder::server_error(ctx, err));
            }
        }
        Ok(None)
    }

    /// Looks up `user_id`. `Ok(None)` means the id is stale.
    async fn lookup(&self, ctx: &RequestContext, user_id: UserId) -> Result<Option<User>, Response> {
        match self.users.get_by_id(user_id).await {
            Ok(user) if user.active => Ok(Some(user)),
            Ok(_) => {
                tracing::info!(request_id = %ctx.request_id(), %user_id, "session user is inactive, clearing");
                Ok(None)
            }
            Err(LookupError::NoRecord) => {
                tracing::info!(request_id = %ctx.request_id(), %user_id, "session user no longer exists, clearing");
                Ok(None)
            }
            Err(err @ LookupError::Infrastructure(_)) => Err(responder::from_error(ctx, err.into())),
        }
    }
}

impl std::fmt::Debug for AuthenticateMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticateMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for AuthenticateMiddleware {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.resolve(ctx).await {
                Ok(Some(user)) => {
                    ctx.set_authenticated(true);
                    ctx.set_extension(user);
                }
                Ok(None) => ctx.set_authenticated(false),
                Err(response) => return response,
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnEndpoint;
    use crate::Pipeline;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;
    use http::StatusCode;
    use http_body_util::Full;
    use portcullis_session::{MemorySessionStore, Session, SessionId, SessionStore};
    use serde_json::Value;
    use std::time::Duration;

    struct Users;

    #[async_trait]
    impl UserLookup for Users {
        async fn get_by_id(&self, id: UserId) -> Result<User, LookupError> {
            let user = |active| User {
                id,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                created: Utc::now(),
                active,
            };
            match id.0 {
                1 => Ok(user(true)),
                2 => Ok(user(false)),
                3 => Err(LookupError::Infrastructure(anyhow::anyhow!("db down"))),
                _ => Err(LookupError::NoRecord),
            }
        }
    }

    /// Seeds a session and runs it through [`AuthenticateMiddleware`].
    async fn run(user_id: Option<Value>) -> (Response, Arc<MemorySessionStore>, SessionId) {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(3600)));
        let id = SessionId::generate();
        store.put(&id, keys::FLASH, "seed".into()).await.unwrap();
        if let Some(user_id) = user_id {
            store
                .put(&id, keys::AUTHENTICATED_USER_ID, user_id)
                .await
                .unwrap();
        }

        let pipeline = Pipeline::builder()
            .stage(AuthenticateMiddleware::new(Arc::new(Users)))
            .build();
        let endpoint = FnEndpoint::new(|ctx, _request| {
            let status = if ctx.is_authenticated() {
                assert_eq!(ctx.user().map(|u| u.id), Some(UserId(1)));
                StatusCode::OK
            } else {
                assert!(ctx.user().is_none());
                StatusCode::ACCEPTED
            };
            responder::text(status, "")
        });

        let mut ctx = RequestContext::new();
        ctx.attach_session(Session::attach(id.clone(), store.clone()));
        let request = http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = pipeline.process_with(&mut ctx, request, &endpoint).await;
        (response, store, id)
    }

    #[tokio::test]
    async fn test_no_user_id_is_unauthenticated() {
        let (response, _, _) = run(None).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_active_user_is_authenticated() {
        let (response, store, id) = run(Some(1.into())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.exists(&id, keys::AUTHENTICATED_USER_ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_inactive_user_is_cleared() {
        let (response, store, id) = run(Some(2.into())).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(!store.exists(&id, keys::AUTHENTICATED_USER_ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleted_user_is_cleared() {
        let (response, store, id) = run(Some(99.into())).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(!store.exists(&id, keys::AUTHENTICATED_USER_ID).await.unwrap());
        assert!(store.exists(&id, keys::FLASH).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_500() {
        let (response, store, id) = run(Some(3.into())).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.exists(&id, keys::AUTHENTICATED_USER_ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_user_id_is_cleared() {
        let (response, store, id) = run(Some("not-a-user-id".into())).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(!store.exists(&id, keys::AUTHENTICATED_USER_ID).await.unwrap());
        assert!(store.exists(&id, keys::FLASH).await.unwrap());
    }
}
