//! Data every rendered page receives.
//!
//! Pages are rendered as JSON:
//!
//! ```json
//! {
//!   "csrf_token": "…",
//!   "flash": "Snippet created successfully!",
//!   "is_authenticated": true,
//!   "form": { "values": { … }, "errors": { … } }
//! }
//! ```
//!
//! Form pages carry `form`; the home page carries `snippets` and the
//! snippet page carries `snippet` in its place.
//!
//! Reading the flash message removes it from the session, so it is shown
//! exactly once.

use http::StatusCode;
use portcullis_forms::Form;
use portcullis_middleware::{responder, RequestContext, Response};
use portcullis_session::{keys, SessionError};
use serde::Serialize;

/// Values added to every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageDefaults {
    /// Token to embed in forms.
    pub csrf_token: Option<String>,
    /// One-shot message from the previous request.
    pub flash: Option<String>,
    /// Whether a signed-in user made the request.
    pub is_authenticated: bool,
}

impl PageDefaults {
    /// Collects the defaults, popping the flash message.
    pub async fn collect(ctx: &mut RequestContext) -> Result<Self, SessionError> {
        let flash = match ctx.session_mut() {
            Some(session) => session.pop_string(keys::FLASH).await?,
            None => None,
        };
        Ok(Self {
            csrf_token: ctx.csrf_token().map(str::to_string),
            flash,
            is_authenticated: ctx.is_authenticated(),
        })
    }
}

#[derive(Serialize)]
struct Page<'a, T> {
    #[serde(flatten)]
    defaults: PageDefaults,
    #[serde(flatten)]
    content: &'a T,
}

#[derive(Serialize)]
struct FormContent<'a> {
    form: &'a Form,
}

/// Renders a page whose fields are `content`'s plus the defaults.
pub async fn render_content<T: Serialize>(
    ctx: &mut RequestContext,
    status: StatusCode,
    content: &T,
) -> Response {
    match PageDefaults::collect(ctx).await {
        Ok(defaults) => responder::json(ctx, status, &Page { defaults, content }),
        Err(err) => responder::server_error(ctx, err),
    }
}

/// Renders a page around `form`.
pub async fn render(ctx: &mut RequestContext, status: StatusCode, form: &Form) -> Response {
    render_content(ctx, status, &FormContent { form }).await
}

/// Renders a form that failed validation.
pub async fn render_invalid(ctx: &mut RequestContext, form: &Form) -> Response {
    render(ctx, StatusCode::UNPROCESSABLE_ENTITY, form).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use portcullis_session::{MemorySessionStore, Session};
    use std::sync::Arc;
    use std::time::Duration;

    async fn context_with_flash(message: &str) -> RequestContext {
        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let mut session = Session::start(store);
        session.put(keys::FLASH, message).await.unwrap();
        let mut ctx = RequestContext::new();
        ctx.attach_session(session);
        ctx.set_csrf_token("tok");
        ctx
    }

    #[tokio::test]
    async fn test_flash_is_popped_once() {
        let mut ctx = context_with_flash("You have been logged out").await;

        let first = PageDefaults::collect(&mut ctx).await.unwrap();
        assert_eq!(first.flash.as_deref(), Some("You have been logged out"));
        assert_eq!(first.csrf_token.as_deref(), Some("tok"));
        assert!(!first.is_authenticated);

        let second = PageDefaults::collect(&mut ctx).await.unwrap();
        assert_eq!(second.flash, None);
    }

    #[tokio::test]
    async fn test_defaults_without_session() {
        let mut ctx = RequestContext::new();
        assert_eq!(
            PageDefaults::collect(&mut ctx).await.unwrap(),
            PageDefaults::default()
        );
    }

    #[tokio::test]
    async fn test_render_shape() {
        let mut ctx = context_with_flash("hi").await;
        let mut form = Form::new([("title", "")]);
        form.require(&["title"]);

        let response = render_invalid(&mut ctx, &form).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let page: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(page["flash"], "hi");
        assert_eq!(page["csrf_token"], "tok");
        assert_eq!(page["is_authenticated"], false);
        assert_eq!(page["form"]["values"]["title"][0], "");
        assert_eq!(page["form"]["errors"]["title"][0], "This field cannot be blank");
    }

    #[tokio::test]
    async fn test_render_content_fields_sit_beside_defaults() {
        #[derive(Serialize)]
        struct Listing {
            snippets: Vec<&'static str>,
        }

        let mut ctx = context_with_flash("hi").await;
        let response =
            render_content(&mut ctx, StatusCode::OK, &Listing { snippets: vec!["a"] }).await;

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let page: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(page["flash"], "hi");
        assert_eq!(page["snippets"][0], "a");
        assert!(page.get("form").is_none());
    }
}
