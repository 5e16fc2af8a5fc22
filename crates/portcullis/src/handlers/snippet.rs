//! Snippet pages: the latest list, a single snippet and creation.

use super::{flash_and_redirect, read_form};
use crate::page;
use crate::routes::PathParams;
use http::StatusCode;
use portcullis_core::{Snippet, SnippetStore};
use portcullis_forms::Form;
use portcullis_middleware::{responder, BoxFuture, Endpoint, Request, RequestContext, Response};
use serde::Serialize;
use std::sync::Arc;

/// Landing page listing the latest snippets.
pub struct Home {
    snippets: Arc<dyn SnippetStore>,
}

impl Home {
    /// Lists snippets from `snippets`.
    #[must_use]
    pub fn new(snippets: Arc<dyn SnippetStore>) -> Self {
        Self { snippets }
    }
}

#[derive(Serialize)]
struct Latest<'a> {
    snippets: &'a [Snippet],
}

impl Endpoint for Home {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.snippets.latest().await {
                Ok(snippets) => {
                    page::render_content(ctx, StatusCode::OK, &Latest { snippets: &snippets }).await
                }
                Err(err) => responder::server_error(ctx, err),
            }
        })
    }
}

/// One snippet, addressed as `/snippet/{id}`.
///
/// An id that is not a positive integer, or that names no live snippet,
/// is a 404.
pub struct ShowSnippet {
    snippets: Arc<dyn SnippetStore>,
}

impl ShowSnippet {
    /// Reads snippets from `snippets`.
    #[must_use]
    pub fn new(snippets: Arc<dyn SnippetStore>) -> Self {
        Self { snippets }
    }
}

#[derive(Serialize)]
struct Shown<'a> {
    snippet: &'a Snippet,
}

fn snippet_id(request: &Request) -> Option<i64> {
    let raw = request.extensions().get::<PathParams>()?.get("id")?;
    raw.parse().ok().filter(|id| *id >= 1)
}

impl Endpoint for ShowSnippet {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(id) = snippet_id(&request) else {
                return responder::not_found();
            };
            match self.snippets.get(id).await {
                Ok(snippet) => {
                    page::render_content(ctx, StatusCode::OK, &Shown { snippet: &snippet }).await
                }
                Err(err) => responder::from_error(ctx, err.into()),
            }
        })
    }
}

/// Allowed lifetimes, in days.
pub const EXPIRY_CHOICES: [&str; 3] = ["365", "7", "1"];

/// The blank snippet page.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateSnippetForm;

impl Endpoint for CreateSnippetForm {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move { page::render(ctx, StatusCode::OK, &Form::empty()).await })
    }
}

/// Validates and stores a new snippet.
pub struct CreateSnippet {
    snippets: Arc<dyn SnippetStore>,
}

impl CreateSnippet {
    /// Stores snippets in `snippets`.
    #[must_use]
    pub fn new(snippets: Arc<dyn SnippetStore>) -> Self {
        Self { snippets }
    }
}

impl Endpoint for CreateSnippet {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut form = match read_form(ctx, request).await {
                Ok(form) => form,
                Err(response) => return response,
            };

            form.require(&["title", "content", "expires"]);
            form.max_length("title", 100);
            form.permitted_values("expires", &EXPIRY_CHOICES);

            if !form.is_valid() {
                return page::render_invalid(ctx, &form).await;
            }

            let expires_days: u32 = match form.get("expires").parse() {
                Ok(days) => days,
                Err(err) => return responder::server_error(ctx, err),
            };
            let id = match self
                .snippets
                .insert(form.get("title"), form.get("content"), expires_days)
                .await
            {
                Ok(id) => id,
                Err(err) => return responder::server_error(ctx, err),
            };

            tracing::info!(request_id = %ctx.request_id(), snippet_id = id, "snippet created");
            flash_and_redirect(ctx, "Snippet created successfully!", &format!("/snippet/{id}")).await
        })
    }
}

impl std::fmt::Debug for CreateSnippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSnippet").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Home {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Home").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ShowSnippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowSnippet").finish_non_exhaustive()
    }
}
