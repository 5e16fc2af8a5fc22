//! Core middleware and endpoint traits.
//!
//! A chain is an ordered list of [`Middleware`] ending in an [`Endpoint`].
//! Each middleware receives the request context, the request and a [`Next`]
//! that runs the rest of the chain. It may run code before delegating, after
//! the rest of the chain returns, or return its own response without
//! delegating at all.
//!
//! # Example
//!
//! ```
//! use portcullis_middleware::{BoxFuture, Middleware, Next, Request, RequestContext, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::RequestContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One interceptor in a chain.
///
/// # Invariants
///
/// - Call `next.run()` at most once; not calling it short-circuits the chain
/// - Never swallow a downstream response silently; return it or replace it
pub trait Middleware: Send + Sync + 'static {
    /// Stable name used in logs and tests.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The handler at the end of a chain.
pub trait Endpoint: Send + Sync + 'static {
    /// Produces the response for a request that passed every stage.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, request: Request)
        -> BoxFuture<'a, Response>;
}

/// The rest of the chain, handed to each middleware.
///
/// `run` consumes `self`, so the remainder can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    /// A `Next` that runs `middleware` and then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A terminal `Next` that invokes the endpoint.
    pub(crate) fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Runs the next middleware, or the endpoint if none remain.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Endpoint(endpoint) => endpoint.call(ctx, request).await,
        }
    }
}

/// An endpoint built from a synchronous function.
///
/// Useful for redirects, static pages and tests.
///
/// ```
/// use portcullis_middleware::{responder, FnEndpoint};
///
/// let home = FnEndpoint::new(|_ctx, _request| responder::text(http::StatusCode::OK, "home"));
/// # let _ = home;
/// ```
pub struct FnEndpoint<F> {
    func: F,
}

impl<F> FnEndpoint<F>
where
    F: Fn(&mut RequestContext, Request) -> Response + Send + Sync + 'static,
{
    /// Wraps `func`.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Endpoint for FnEndpoint<F>
where
    F: Fn(&mut RequestContext, Request) -> Response + Send + Sync + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Response> {
        let response = (self.func)(ctx, request);
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Visit {
        name: &'static str,
    }

    #[derive(Default)]
    struct Visited(Vec<&'static str>);

    impl Middleware for Visit {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut visited = ctx.remove_extension::<Visited>().unwrap_or_default();
                visited.0.push(self.name);
                ctx.set_extension(visited);
                next.run(ctx, request).await
            })
        }
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn name(&self) -> &'static str {
            "short_circuit"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async { responder::client_error(StatusCode::BAD_REQUEST) })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_endpoint() -> impl Endpoint {
        FnEndpoint::new(|_ctx, _request| responder::text(StatusCode::OK, "OK"))
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let first = Visit { name: "first" };
        let second = Visit { name: "second" };
        let endpoint = ok_endpoint();

        let next = Next::new(&first, Next::new(&second, Next::endpoint(&endpoint)));
        let mut ctx = RequestContext::new();
        let response = next.run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.get_extension::<Visited>().unwrap().0, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let first = Visit { name: "first" };
        let stop = ShortCircuit;
        let last = Visit { name: "last" };
        let endpoint = ok_endpoint();

        let next = Next::new(
            &first,
            Next::new(&stop, Next::new(&last, Next::endpoint(&endpoint))),
        );
        let mut ctx = RequestContext::new();
        let response = next.run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.get_extension::<Visited>().unwrap().0, ["first"]);
    }
}
