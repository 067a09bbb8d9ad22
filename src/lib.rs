//! # vetted
//!
//! A minimal HTTP framework whose request pipeline strips XSS payloads from
//! everything a client sends before a handler ever sees it.
//!
//! ## The contract
//!
//! Route handlers receive three client-controlled containers (the JSON or
//! form **body**, the **query** string, the route **params**) as [`Value`]
//! trees. With the [`Sanitize`](middleware::Sanitize) stage installed, every
//! string leaf in all three has been passed through an HTML cleaner. The
//! tree's shape does not change: same keys in the same order, same array
//! lengths, numbers, booleans, nulls and dates untouched.
//!
//! If sanitization fails (too deeply nested, or the cleaner rejects a
//! string) the request is answered with `400` and a fixed JSON message and
//! the handler does not run.
//!
//! What the reverse proxy owns, vetted ignores: TLS, rate limiting, body-size
//! limits, slow clients.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use vetted::middleware::Sanitize;
//! use vetted::{Json, Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vetted::Error> {
//!     let app = Router::new()
//!         .layer(Sanitize::default())
//!         .get("/trips/{id}", get_trip)
//!         .post("/trips",     create_trip);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn get_trip(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_trip(req: Request) -> Result<Json<vetted::Value>, StatusCode> {
//!     let body = req.body().cloned().ok_or(StatusCode::BAD_REQUEST)?;
//!     Ok(Json(body))
//! }
//! ```
//!
//! The engine is usable on its own, without the HTTP layer:
//!
//! ```rust
//! use vetted::{Sanitizer, Value};
//!
//! let clean = Sanitizer::new()
//!     .sanitize(Value::from("<script>alert(1)</script>John"))
//!     .unwrap();
//! assert_eq!(clean, Value::from("John"));
//! ```

pub mod config;
pub mod decode;
mod error;
mod handler;
pub mod middleware;
mod request;
mod response;
mod router;
pub mod sanitize;
mod server;
mod value;

pub use error::Error;
pub use handler::Handler;
pub use http::{Method, StatusCode, header};
pub use request::{Request, RequestBuilder};
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use sanitize::{MarkupStripper, SanitizeError, Sanitizer, Strip, StripError};
pub use server::Server;
pub use value::{Kind, Value};
