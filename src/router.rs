//! Radix-tree request router with a pre-handler middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup. A request that matches
//! a route gets its `params` container filled in, then passes through every
//! registered middleware stage in order, then reaches the handler.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::decode;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` reads them:
    ///
    /// ```rust,no_run
    /// # use vetted::{Method, Request, Response, Router};
    /// # async fn get_trip(_: Request) -> Response { Response::text("") }
    /// # async fn create_trip(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/trips/{id}", get_trip)
    ///     .on(Method::POST, "/trips",      create_trip);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with one
    /// already registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Append a middleware stage. Stages run in registration order, after
    /// routing and before the handler, for every route on this router.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Routes one request through the middleware stack to its handler.
    ///
    /// No matching route gives `404`; a route segment that does not
    /// percent-decode to UTF-8 gives `400`. Both happen before any
    /// middleware runs.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let Some(tree) = self.routes.get(&req.method) else {
            debug!(method = %req.method, "no routes for method");
            return Response::error(StatusCode::NOT_FOUND, "Not found");
        };
        let Ok(matched) = tree.at(&req.path) else {
            debug!(method = %req.method, "no matching route");
            return Response::error(StatusCode::NOT_FOUND, "Not found");
        };

        let handler = Arc::clone(matched.value);
        req.params = match decode::params(matched.params.iter()) {
            Ok(params) => params,
            Err(e) => return Response::error(e.status(), e.message()),
        };

        for stage in &self.middleware {
            req = match stage.handle(req) {
                Ok(next) => next,
                Err(rejection) => return rejection,
            };
        }

        handler.call(req).await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
