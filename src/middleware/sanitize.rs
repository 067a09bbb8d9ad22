//! XSS sanitization stage.
//!
//! [`Sanitize`] runs the [`Sanitizer`] over the request's body, query and
//! route parameters. Either all three come out clean and the request moves
//! on, or the request is rejected with `400 Bad Request` and
//! `{"status":"error","message":"Invalid request data"}`. There is no
//! partial application.
//!
//! Request content is never logged. A rejection emits one `warn!` event
//! with the method, the failing container and the error kind.

use std::fmt;

use http::StatusCode;
use thiserror::Error;
use tracing::warn;

use crate::config::SanitizeConfig;
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::sanitize::{SanitizeError, Sanitizer};
use crate::value::Value;

/// Message sent to the client when sanitization fails.
pub const REJECTION_MESSAGE: &str = "Invalid request data";

/// Which client-controlled container a value came from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Container {
    Body,
    Query,
    Params,
}

impl Container {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body   => "body",
            Self::Query  => "query",
            Self::Params => "params",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three containers of a request, each possibly absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Containers {
    pub body: Option<Value>,
    pub query: Option<Value>,
    pub params: Option<Value>,
}

#[derive(Debug, Error)]
#[error("failed to sanitize request {container}")]
pub struct ContainerError {
    pub container: Container,
    #[source]
    pub source: SanitizeError,
}

/// Sanitizes every present container. Absent ones stay absent.
///
/// Stops at the first failure; the input is consumed either way, so a
/// caller can never end up holding a half-sanitized set.
pub fn sanitize_containers(
    sanitizer: &Sanitizer,
    containers: Containers,
) -> Result<Containers, ContainerError> {
    let Containers { body, query, params } = containers;
    Ok(Containers {
        body: sanitize_one(sanitizer, Container::Body, body)?,
        query: sanitize_one(sanitizer, Container::Query, query)?,
        params: sanitize_one(sanitizer, Container::Params, params)?,
    })
}

fn sanitize_one(
    sanitizer: &Sanitizer,
    container: Container,
    value: Option<Value>,
) -> Result<Option<Value>, ContainerError> {
    value
        .map(|v| sanitizer.sanitize(v))
        .transpose()
        .map_err(|source| ContainerError { container, source })
}

// ── Middleware ────────────────────────────────────────────────────────────────

/// Middleware that strips markup from body, query and params.
///
/// ```rust
/// use vetted::{Method, Request, Response, Router};
/// use vetted::middleware::Sanitize;
///
/// async fn create_trip(req: Request) -> Response {
///     // every string in req.body() is already clean here
///     Response::text("created")
/// }
///
/// let app = Router::new()
///     .layer(Sanitize::default())
///     .on(Method::POST, "/trips", create_trip);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Sanitize {
    sanitizer: Sanitizer,
}

impl Sanitize {
    pub fn new(sanitizer: Sanitizer) -> Self {
        Self { sanitizer }
    }

    pub fn from_config(config: &SanitizeConfig) -> Self {
        Self::new(config.sanitizer())
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }
}

impl Middleware for Sanitize {
    fn handle(&self, mut req: Request) -> Result<Request, Response> {
        match sanitize_containers(&self.sanitizer, req.take_containers()) {
            Ok(clean) => {
                req.set_containers(clean);
                Ok(req)
            }
            Err(e) => {
                warn!(
                    method = %req.method(),
                    container = %e.container,
                    reason = e.source.kind(),
                    "request rejected by sanitizer"
                );
                Err(Response::error(StatusCode::BAD_REQUEST, REJECTION_MESSAGE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::sanitize::StripError;

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn cleans_all_three_containers() {
        let req = Request::builder()
            .method(Method::POST)
            .body(json!({ "note": "<script>steal()</script>pack sunscreen" }))
            .query(json!({ "q": "<b>lisbon</b>" }))
            .params(json!({ "id": "<img src=x onerror=alert(1)>7" }))
            .build();

        let req = Sanitize::default().handle(req).unwrap();

        assert_eq!(req.body(), Some(&Value::from(json!({ "note": "pack sunscreen" }))));
        assert_eq!(req.query_param("q"), Some("lisbon"));
        assert_eq!(req.param("id"), Some("7"));
    }

    #[test]
    fn absent_containers_stay_absent() {
        let req = Request::builder().query(json!({ "page": "2" })).build();

        let req = Sanitize::default().handle(req).unwrap();

        assert!(req.body().is_none());
        assert!(req.params().is_none());
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[test]
    fn failure_yields_generic_400() {
        let stage = Sanitize::new(Sanitizer::new().max_depth(1));
        let req = Request::builder()
            .body(json!({ "a": { "b": { "c": "<script>secret</script>" } } }))
            .build();

        let res = stage.handle(req).unwrap_err();

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&res), json!({ "status": "error", "message": "Invalid request data" }));
        assert!(!String::from_utf8_lossy(res.body()).contains("secret"));
    }

    #[test]
    fn stripper_error_is_a_client_error() {
        let failing = Sanitizer::with_stripper(|_: &str| -> Result<String, StripError> {
            Err(StripError::new("parser gave up"))
        });
        let req = Request::builder().params(json!({ "id": "1" })).build();

        let res = Sanitize::new(failing).handle(req).unwrap_err();

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(!String::from_utf8_lossy(res.body()).contains("parser gave up"));
    }

    #[test]
    fn container_error_names_the_failing_container() {
        let sanitizer = Sanitizer::new().max_depth(0);
        let containers = Containers {
            body: Some(Value::from(json!({ "ok": "fine" }))),
            query: Some(Value::from(json!({ "tags": ["nested"] }))),
            params: None,
        };

        let err = sanitize_containers(&sanitizer, containers).unwrap_err();

        assert_eq!(err.container, Container::Query);
        assert_eq!(err.source, SanitizeError::DepthExceeded { limit: 0 });
        assert_eq!(err.to_string(), "failed to sanitize request query");
    }

    #[test]
    fn empty_containers_pass_through() {
        let out = sanitize_containers(&Sanitizer::new(), Containers::default()).unwrap();
        assert_eq!(out, Containers::default());
    }

    #[test]
    fn from_config_applies_depth() {
        let stage = Sanitize::from_config(&SanitizeConfig { max_depth: 5 });
        assert_eq!(stage.sanitizer().depth_limit(), 5);
    }
}
