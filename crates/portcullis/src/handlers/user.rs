//! Signup, login and logout.

use super::{flash_and_redirect, read_form};
use crate::page;
use http::StatusCode;
use portcullis_core::{AuthenticateError, CredentialVerifier, RegisterError, UserRegistry};
use portcullis_forms::{Form, EMAIL_RX};
use portcullis_middleware::{responder, BoxFuture, Endpoint, Request, RequestContext, Response};
use portcullis_session::keys;
use std::sync::Arc;

/// Where a successful login lands.
pub const AFTER_LOGIN: &str = "/snippet/create";

/// The blank signup page.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignupForm;

impl Endpoint for SignupForm {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move { page::render(ctx, StatusCode::OK, &Form::empty()).await })
    }
}

/// Creates an account.
pub struct Signup {
    registry: Arc<dyn UserRegistry>,
    login_path: String,
}

impl Signup {
    /// Registers through `registry`, then sends the user to `login_path`.
    #[must_use]
    pub fn new(registry: Arc<dyn UserRegistry>, login_path: impl Into<String>) -> Self {
        Self {
            registry,
            login_path: login_path.into(),
        }
    }
}

impl Endpoint for Signup {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut form = match read_form(ctx, request).await {
                Ok(form) => form,
                Err(response) => return response,
            };

            form.require(&["name", "email", "password"]);
            form.max_length("name", 255);
            form.max_length("email", 255);
            form.matches_pattern("email", &EMAIL_RX);
            form.min_length("password", 10);

            if form.is_valid() {
                let registered = self
                    .registry
                    .insert(form.get("name"), form.get("email"), form.get("password"))
                    .await;
                match registered {
                    Ok(()) => {
                        return flash_and_redirect(
                            ctx,
                            "Your signup was successful. Please login.",
                            &self.login_path,
                        )
                        .await;
                    }
                    Err(RegisterError::DuplicateEmail) => {
                        form.errors_mut().add("email", "Email address already in use");
                    }
                    Err(err @ RegisterError::Infrastructure(_)) => {
                        return responder::server_error(ctx, err);
                    }
                }
            }

            form.remove("password");
            page::render_invalid(ctx, &form).await
        })
    }
}

impl std::fmt::Debug for Signup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signup")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// The blank login page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginForm;

impl Endpoint for LoginForm {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move { page::render(ctx, StatusCode::OK, &Form::empty()).await })
    }
}

/// Signs a user in.
///
/// The session id is rotated before the user id is stored in it, so an id
/// fixed by an attacker before login is worthless afterwards.
pub struct Login {
    credentials: Arc<dyn CredentialVerifier>,
}

impl Login {
    /// Checks passwords through `credentials`.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self { credentials }
    }
}

impl Endpoint for Login {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut form = match read_form(ctx, request).await {
                Ok(form) => form,
                Err(response) => return response,
            };

            let authenticated = self
                .credentials
                .authenticate(form.get("email"), form.get("password"))
                .await;
            let user_id = match authenticated {
                Ok(user_id) => user_id,
                Err(AuthenticateError::InvalidCredentials) => {
                    form.errors_mut().add("generic", "Email or password is incorrect");
                    form.remove("password");
                    return page::render_invalid(ctx, &form).await;
                }
                Err(err @ AuthenticateError::Infrastructure(_)) => {
                    return responder::server_error(ctx, err);
                }
            };

            let Some(session) = ctx.session_mut() else {
                return responder::server_error(ctx, anyhow::anyhow!("no session attached"));
            };
            if let Err(err) = session.renew().await {
                return responder::server_error(ctx, err);
            }
            if let Err(err) = session.put(keys::AUTHENTICATED_USER_ID, &user_id).await {
                return responder::server_error(ctx, err);
            }
            tracing::info!(request_id = %ctx.request_id(), %user_id, "user logged in");
            responder::redirect(ctx, AFTER_LOGIN)
        })
    }
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login").finish_non_exhaustive()
    }
}

/// Signs the user out and returns to the home page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl Endpoint for Logout {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(session) = ctx.session_mut() else {
                return responder::server_error(ctx, anyhow::anyhow!("no session attached"));
            };
            if let Err(err) = session.remove(keys::AUTHENTICATED_USER_ID).await {
                return responder::server_error(ctx, err);
            }
            if let Err(err) = session.renew().await {
                return responder::server_error(ctx, err);
            }
            flash_and_redirect(ctx, "You have been logged out", "/").await
        })
    }
}
