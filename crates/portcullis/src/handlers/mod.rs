//! Endpoint logic for the account and snippet pages.
//!
//! Endpoints run after the chain has attached the session, verified the
//! CSRF token and resolved the user. They parse the form, validate it, call
//! a capability and then either re-render with `422 Unprocessable Entity` or
//! set a flash message and redirect with `303 See Other`.

mod snippet;
mod user;

pub use snippet::{CreateSnippet, CreateSnippetForm, Home, ShowSnippet};
pub use user::{Login, LoginForm, Logout, Signup, SignupForm};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use portcullis_core::PortcullisError;
use portcullis_forms::Form;
use portcullis_middleware::{responder, BoxFuture, Endpoint, Request, RequestContext, Response};
use portcullis_session::keys;

/// Liveness probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

impl Endpoint for Ping {
    fn call<'a>(&'a self, _ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async { responder::text(StatusCode::OK, "OK") })
    }
}

/// Answers 404 for unrouted paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Endpoint for NotFound {
    fn call<'a>(&'a self, _ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async { responder::not_found() })
    }
}

/// Decodes the urlencoded body. A malformed body is a 400.
async fn read_form(ctx: &RequestContext, request: Request) -> Result<Form, Response> {
    let body: Bytes = match request.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    Form::from_urlencoded(&body).map_err(|err| {
        let err = PortcullisError::bad_request(format!("unreadable form body: {err}"));
        responder::from_error(ctx, err)
    })
}

/// Stores a one-shot message and redirects.
async fn flash_and_redirect(ctx: &mut RequestContext, message: &str, location: &str) -> Response {
    let Some(session) = ctx.session_mut() else {
        return responder::server_error(ctx, anyhow::anyhow!("no session attached"));
    };
    if let Err(err) = session.put(keys::FLASH, message).await {
        return responder::server_error(ctx, err);
    }
    responder::redirect(ctx, location)
}
