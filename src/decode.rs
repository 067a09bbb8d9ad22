//! Turning wire data into [`Value`] containers.
//!
//! | Container | Absent when | Shape |
//! |---|---|---|
//! | query | the URI has no `?` | object of strings; a repeated key becomes an array |
//! | params | the route has no `{name}` segments | object of percent-decoded strings |
//! | body | the body is empty | JSON as sent, or a form decoded like the query |
//!
//! A body without a `content-type` is read as JSON. Any type other than JSON
//! or `application/x-www-form-urlencoded` is refused with `415`, so no body
//! ever reaches a handler without passing through the middleware stage.
//!
//! Parser details never reach the client: each error maps to a fixed
//! status and message.

use std::collections::HashMap;

use http::StatusCode;
use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body")]
    MalformedJson(#[source] serde_json::Error),

    #[error("malformed form body")]
    MalformedForm(#[source] serde_urlencoded::de::Error),

    #[error("form body is not valid UTF-8")]
    FormEncoding(#[source] std::str::Utf8Error),

    #[error("malformed query string")]
    MalformedQuery(#[source] serde_urlencoded::de::Error),

    #[error("route parameter is not valid UTF-8 after percent-decoding")]
    MalformedPath,

    #[error("unsupported content type")]
    UnsupportedMediaType,

    #[error("failed to read request body")]
    Body(#[source] hyper::Error),
}

impl DecodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The fixed text sent to the client.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) | Self::MalformedForm(_) | Self::FormEncoding(_) | Self::Body(_) => {
                "Malformed request body"
            }
            Self::MalformedQuery(_)    => "Malformed query string",
            Self::MalformedPath        => "Malformed request path",
            Self::UnsupportedMediaType => "Unsupported content type",
        }
    }
}

/// Decodes a raw query string (the part after `?`, if any).
pub fn query(raw: Option<&str>) -> Result<Option<Value>, DecodeError> {
    raw.map(|q| form_record(q).map_err(DecodeError::MalformedQuery)).transpose()
}

/// Decodes a request body according to its `content-type`.
pub fn body(content_type: Option<&str>, bytes: &[u8]) -> Result<Option<Value>, DecodeError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    match content_type.map(essence).as_deref() {
        None => json(bytes),
        Some(t) if t == "application/json" || t.ends_with("+json") => json(bytes),
        Some("application/x-www-form-urlencoded") => {
            let text = std::str::from_utf8(bytes).map_err(DecodeError::FormEncoding)?;
            form_record(text).map(Some).map_err(DecodeError::MalformedForm)
        }
        Some(_) => Err(DecodeError::UnsupportedMediaType),
    }
}

/// Builds the params container from matched route segments.
pub fn params<I, K, V>(matched: I) -> Result<Option<Value>, DecodeError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let entries = matched
        .into_iter()
        .map(|(k, v)| {
            let decoded = urlencoding::decode(v.as_ref()).map_err(|_| DecodeError::MalformedPath)?;
            Ok((k.as_ref().to_owned(), Value::String(decoded.into_owned())))
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    Ok((!entries.is_empty()).then_some(Value::Object(entries)))
}

fn json(bytes: &[u8]) -> Result<Option<Value>, DecodeError> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(|v| Some(Value::from(v)))
        .map_err(DecodeError::MalformedJson)
}

fn form_record(raw: &str) -> Result<Value, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)?;

    let mut entries: Vec<(String, Value)> = Vec::with_capacity(pairs.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, value) in pairs {
        let value = Value::String(value);
        match index.get(&key).copied() {
            Some(i) => match &mut entries[i].1 {
                Value::Array(items) => items.push(value),
                slot => {
                    let first = std::mem::replace(slot, Value::Null);
                    *slot = Value::Array(vec![first, value]);
                }
            },
            None => {
                index.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
    }

    Ok(Value::Object(entries))
}

/// `"Application/JSON; charset=utf-8"` → `"application/json"`.
fn essence(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}
