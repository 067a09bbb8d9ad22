//! Incoming HTTP request type.
//!
//! A [`Request`] carries three client-controlled containers, each either
//! absent or a [`Value`] tree:
//!
//! - **body**: the decoded JSON or form body
//! - **query**: the decoded query string
//! - **params**: the named segments of the matched route
//!
//! Behind the [`Sanitize`](crate::middleware::Sanitize) stage every string
//! in all three has already been stripped of markup. The raw body bytes are
//! not kept: there is no unsanitized path to the client's data.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::de::DeserializeOwned;

use crate::middleware::Containers;
use crate::value::Value;

/// An incoming HTTP request with decoded containers.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
    pub(crate) query: Option<Value>,
    pub(crate) params: Option<Value>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Option<Value>,
        query: Option<Value>,
    ) -> Self {
        Self { method, path, headers, body, query, params: None }
    }

    /// Builds a request by hand, for tests or embedding without a socket.
    ///
    /// ```rust
    /// use vetted::{Method, Request};
    ///
    /// let req = Request::builder()
    ///     .method(Method::POST)
    ///     .path("/trips")
    ///     .body(serde_json::json!({ "destination": "Oslo" }))
    ///     .build();
    ///
    /// assert_eq!(req.body().and_then(|b| b.get("destination")).and_then(|v| v.as_str()), Some("Oslo"));
    /// ```
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            inner: Self::new(Method::GET, "/".to_owned(), HeaderMap::new(), None, None),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Value> { self.body.as_ref() }
    pub fn query(&self) -> Option<&Value> { self.query.as_ref() }
    pub fn params(&self) -> Option<&Value> { self.params.as_ref() }

    pub fn body_mut(&mut self) -> &mut Option<Value> { &mut self.body }
    pub fn query_mut(&mut self) -> &mut Option<Value> { &mut self.query }
    pub fn params_mut(&mut self) -> &mut Option<Value> { &mut self.params }

    /// Returns a named path parameter.
    ///
    /// For a route `/trips/{id}`, `req.param("id")` on `/trips/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }

    /// Returns a query-string value. For a repeated key, the first occurrence.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        match self.query.as_ref()?.get(key)? {
            Value::Array(items) => items.first()?.as_str(),
            v => v.as_str(),
        }
    }

    /// Deserializes the body into `T`. An absent body reads as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let body = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body.into())
    }

    /// Moves all three containers out, leaving `None` behind.
    pub(crate) fn take_containers(&mut self) -> Containers {
        Containers {
            body: self.body.take(),
            query: self.query.take(),
            params: self.params.take(),
        }
    }

    pub(crate) fn set_containers(&mut self, containers: Containers) {
        let Containers { body, query, params } = containers;
        self.body = body;
        self.query = query;
        self.params = params;
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.inner.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.inner.path = path.into();
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.inner.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.inner.body = Some(body.into());
        self
    }

    pub fn query(mut self, query: impl Into<Value>) -> Self {
        self.inner.query = Some(query.into());
        self
    }

    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.inner.params = Some(params.into());
        self
    }

    pub fn build(self) -> Request {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn param_reads_string_values() {
        let req = Request::builder().params(json!({ "id": "42" })).build();
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("slug"), None);
    }

    #[test]
    fn query_param_takes_first_of_repeated_key() {
        let req = Request::builder().query(json!({ "tag": ["food", "wine"], "q": "porto" })).build();
        assert_eq!(req.query_param("tag"), Some("food"));
        assert_eq!(req.query_param("q"), Some("porto"));
        assert_eq!(req.query_param("page"), None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::builder()
            .header(HeaderName::from_static("x-trip-id"), HeaderValue::from_static("t-1"))
            .build();
        assert_eq!(req.header("X-Trip-Id"), Some("t-1"));
    }

    #[test]
    fn json_deserializes_body() {
        #[derive(Deserialize)]
        struct NewTrip {
            destination: String,
            nights: u32,
        }

        let req = Request::builder().body(json!({ "destination": "Quito", "nights": 3 })).build();
        let trip: NewTrip = req.json().unwrap();
        assert_eq!(trip.destination, "Quito");
        assert_eq!(trip.nights, 3);
    }

    #[test]
    fn json_on_missing_body_sees_null() {
        let req = Request::builder().build();
        assert_eq!(req.json::<Option<u8>>().unwrap(), None);
        assert!(req.json::<u8>().is_err());
    }

    #[test]
    fn containers_round_trip() {
        let mut req = Request::builder().body(json!({ "a": 1 })).query(json!({ "b": "2" })).build();

        let taken = req.take_containers();
        assert!(req.body().is_none() && req.query().is_none() && req.params().is_none());
        assert!(taken.params.is_none());

        req.set_containers(taken);
        assert_eq!(req.body(), Some(&Value::from(json!({ "a": 1 }))));
        assert_eq!(req.query_param("b"), Some("2"));
    }
}
