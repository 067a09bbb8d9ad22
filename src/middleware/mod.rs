//! Middleware layer.
//!
//! Middleware runs after routing and before the handler. It is the right
//! place for cross-cutting request rewriting and rejection: input
//! sanitization, header inspection, request-id injection.
//!
//! A stage receives the owned [`Request`] and either hands it on or answers
//! the client itself:
//!
//! ```text
//! Ok(request)   → next stage, then the handler
//! Err(response) → sent as-is; later stages and the handler never run
//! ```
//!
//! Stages run in the order they were registered with
//! [`Router::layer`](crate::Router::layer). Closures with the right
//! signature are stages too:
//!
//! ```rust
//! use vetted::{Request, Response, Router, StatusCode};
//!
//! let app = Router::new().layer(|req: Request| {
//!     if req.header("x-api-key").is_none() {
//!         return Err(Response::error(StatusCode::UNAUTHORIZED, "Missing API key"));
//!     }
//!     Ok(req)
//! });
//! ```

pub mod sanitize;

use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

pub use sanitize::{Container, ContainerError, Containers, REJECTION_MESSAGE, Sanitize, sanitize_containers};

/// A synchronous pre-handler request stage.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request) -> Result<Request, Response>;
}

impl<F> Middleware for F
where
    F: Fn(Request) -> Result<Request, Response> + Send + Sync + 'static,
{
    fn handle(&self, req: Request) -> Result<Request, Response> {
        self(req)
    }
}

/// Shared, type-erased stage, as stored by the router.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;
