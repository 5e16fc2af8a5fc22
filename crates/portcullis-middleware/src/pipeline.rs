//! Ordered middleware pipelines and the driver that runs them.
//!
//! A [`Pipeline`] is an immutable, ordered list of stages. Running a request
//! through it creates a fresh [`RequestContext`], threads it through every
//! stage and the endpoint, and finally merges the headers stages staged on
//! the context into the response.
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use portcullis_middleware::stages::SecureHeadersMiddleware;
//! use portcullis_middleware::{responder, FnEndpoint, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .stage(SecureHeadersMiddleware::new())
//!     .build();
//! assert_eq!(pipeline.stage_names(), ["secure_headers"]);
//!
//! let handler = pipeline.into_handler(FnEndpoint::new(|_ctx, _request| {
//!     responder::text(StatusCode::OK, "hello")
//! }));
//! # let _ = handler;
//! ```

use crate::context::RequestContext;
use crate::middleware::{Endpoint, Middleware, Next};
use crate::types::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be shared between pipelines.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware.
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Starts a builder that begins with this pipeline's stages.
    #[must_use]
    pub fn extend(&self) -> PipelineBuilder {
        PipelineBuilder {
            stages: self.stages.clone(),
        }
    }

    /// Runs `request` through every stage and then `endpoint`.
    pub async fn process(&self, request: Request, endpoint: &dyn Endpoint) -> Response {
        let mut ctx = RequestContext::new();
        self.process_with(&mut ctx, request, endpoint).await
    }

    /// Like [`Pipeline::process`], with a caller-supplied context.
    pub async fn process_with(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        endpoint: &dyn Endpoint,
    ) -> Response {
        let next = self.build_chain(endpoint);
        let mut response = next.run(ctx, request).await;
        ctx.apply_staged_headers(response.headers_mut());
        response
    }

    /// Wraps `endpoint` with this pipeline.
    #[must_use]
    pub fn into_handler<E: Endpoint>(self, endpoint: E) -> ChainHandler {
        ChainHandler::new(Arc::new(self), Arc::new(endpoint))
    }

    fn build_chain<'a>(&'a self, endpoint: &'a dyn Endpoint) -> Next<'a> {
        let mut next = Next::endpoint(endpoint);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Names of the stages, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(self, middleware: M) -> Self {
        self.shared_stage(Arc::new(middleware))
    }

    /// Appends a stage that may also be used by other pipelines.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// An endpoint wrapped in a pipeline: the unit handed to a router.
#[derive(Clone)]
pub struct ChainHandler {
    pipeline: Arc<Pipeline>,
    endpoint: Arc<dyn Endpoint>,
}

impl ChainHandler {
    /// Pairs a pipeline with an endpoint.
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>, endpoint: Arc<dyn Endpoint>) -> Self {
        Self { pipeline, endpoint }
    }

    /// Handles one request.
    pub async fn handle(&self, request: Request) -> Response {
        self.pipeline.process(request, self.endpoint.as_ref()).await
    }

    /// The pipeline in front of the endpoint.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl fmt::Debug for ChainHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainHandler")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
