//! Route table.
//!
//! Each path pattern maps to one chained handler per method. A pattern is
//! either an exact path or has `{name}` segments that match any single
//! non-empty segment; the captured values reach the endpoint as a
//! [`PathParams`] request extension. Exact paths win over patterns, and
//! patterns are tried in the order they were first routed.
//!
//! Unknown paths and unsupported methods are still answered through the base
//! chain, so their responses carry the security headers and are logged like
//! any other.

use crate::handlers::NotFound;
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use portcullis_middleware::{
    responder, BoxFuture, ChainHandler, Chains, Endpoint, Request, RequestContext, Response,
};

struct MethodNotAllowed {
    allow: HeaderValue,
}

impl Endpoint for MethodNotAllowed {
    fn call<'a>(&'a self, _ctx: &'a mut RequestContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = responder::client_error(StatusCode::METHOD_NOT_ALLOWED);
            response.headers_mut().insert(ALLOW, self.allow.clone());
            response
        })
    }
}

/// Values captured by the `{name}` segments of the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// The value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// `None` for an exact path.
fn parse_pattern(pattern: &str) -> Option<Vec<Segment>> {
    let segments: Vec<_> = pattern
        .split('/')
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            }
        })
        .collect();
    segments
        .iter()
        .any(|segment| matches!(segment, Segment::Param(_)))
        .then_some(segments)
}

fn match_segments(segments: &[Segment], path: &str) -> Option<PathParams> {
    let mut parts = path.split('/');
    let mut params = Vec::new();
    for segment in segments {
        let part = parts.next()?;
        match segment {
            Segment::Literal(literal) if literal == part => {}
            Segment::Param(name) if !part.is_empty() => {
                params.push((name.clone(), part.to_string()));
            }
            _ => return None,
        }
    }
    parts.next().is_none().then_some(PathParams(params))
}

#[derive(Debug)]
struct PathRoutes {
    pattern: String,
    segments: Option<Vec<Segment>>,
    methods: Vec<(Method, ChainHandler)>,
    not_allowed: ChainHandler,
}

impl PathRoutes {
    fn handler_for(&self, method: &Method) -> &ChainHandler {
        self.methods
            .iter()
            .find(|(m, _)| m == method)
            .map_or(&self.not_allowed, |(_, handler)| handler)
    }
}

/// Maps `(method, path)` to a chained endpoint.
#[derive(Debug)]
pub struct Routes {
    chains: Chains,
    paths: Vec<PathRoutes>,
    not_found: ChainHandler,
}

impl Routes {
    /// An empty table whose fallbacks run through `chains`' base chain.
    #[must_use]
    pub fn new(chains: Chains) -> Self {
        let not_found = chains.public(NotFound);
        Self {
            chains,
            paths: Vec::new(),
            not_found,
        }
    }

    /// Routes `method path` to `handler`, replacing an earlier route.
    #[must_use]
    pub fn route(mut self, method: Method, path: &str, handler: ChainHandler) -> Self {
        let position = self.paths.iter().position(|routes| routes.pattern == path);
        let methods = position.map_or_else(Vec::new, |index| {
            std::mem::take(&mut self.paths[index].methods)
        });
        let mut methods: Vec<_> = methods.into_iter().filter(|(m, _)| *m != method).collect();
        methods.push((method, handler));

        let allow = methods
            .iter()
            .map(|(m, _)| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let not_allowed = self.chains.public(MethodNotAllowed {
            // Method names are tokens, always valid header text.
            allow: HeaderValue::from_str(&allow).unwrap_or_else(|_| HeaderValue::from_static("")),
        });
        let routes = PathRoutes {
            pattern: path.to_string(),
            segments: parse_pattern(path),
            methods,
            not_allowed,
        };
        match position {
            Some(index) => self.paths[index] = routes,
            None => self.paths.push(routes),
        }
        self
    }

    /// Routes `GET path` through the base chain.
    #[must_use]
    pub fn get<E: Endpoint>(self, path: &str, endpoint: E) -> Self {
        let handler = self.chains.public(endpoint);
        self.route(Method::GET, path, handler)
    }

    /// Routes `POST path` through the base chain.
    #[must_use]
    pub fn post<E: Endpoint>(self, path: &str, endpoint: E) -> Self {
        let handler = self.chains.public(endpoint);
        self.route(Method::POST, path, handler)
    }

    /// Routes `GET path` through the protected chain.
    #[must_use]
    pub fn get_protected<E: Endpoint>(self, path: &str, endpoint: E) -> Self {
        let handler = self.chains.protect(endpoint);
        self.route(Method::GET, path, handler)
    }

    /// Routes `POST path` through the protected chain.
    #[must_use]
    pub fn post_protected<E: Endpoint>(self, path: &str, endpoint: E) -> Self {
        let handler = self.chains.protect(endpoint);
        self.route(Method::POST, path, handler)
    }

    /// The handler for `method path` with the captured path parameters, or
    /// the matching fallback.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> (&ChainHandler, PathParams) {
        let exact = self
            .paths
            .iter()
            .find(|routes| routes.segments.is_none() && routes.pattern == path);
        if let Some(routes) = exact {
            return (routes.handler_for(method), PathParams::default());
        }
        self.paths
            .iter()
            .find_map(|routes| {
                let params = match_segments(routes.segments.as_deref()?, path)?;
                Some((routes.handler_for(method), params))
            })
            .unwrap_or((&self.not_found, PathParams::default()))
    }

    /// Dispatches one request.
    pub async fn handle(&self, mut request: Request) -> Response {
        let (handler, params) = self.lookup(request.method(), request.uri().path());
        let handler = handler.clone();
        request.extensions_mut().insert(params);
        handler.handle(request).await
    }

    /// Number of routed paths.
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}
