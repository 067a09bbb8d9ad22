//! The request data model.
//!
//! Everything a client can send ends up as a [`Value`] tree: the JSON body,
//! the query string, the route parameters. The tree is owned, so it cannot
//! contain cycles, and every node has exactly one shape.
//!
//! ```rust
//! use vetted::Value;
//!
//! let trip = Value::from(serde_json::json!({
//!     "destination": "Lisbon",
//!     "nights": 4,
//!     "tags": ["food", "beach"],
//! }));
//!
//! assert_eq!(trip.get("destination").and_then(Value::as_str), Some("Lisbon"));
//! ```

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::ser::{Serialize, Serializer};
use serde_json::Number;

/// A JSON-shaped value with a dedicated date variant.
///
/// `Object` keeps its entries in insertion order. Keys are compared by
/// position when checking shape, never sorted.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// An already-parsed point in time. Never decomposed into fields.
    Date(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

/// The shape of a [`Value`], independent of its content.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Date,
    Array,
    Object,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null      => Kind::Null,
            Self::Bool(_)   => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::Date(_)   => Kind::Date,
            Self::Array(_)  => Kind::Array,
            Self::Object(_) => Kind::Object,
        }
    }

    /// Looks up `key` in an object. Returns `None` for every other shape.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True when both trees have the same kinds at every position, the same
    /// array lengths and the same object keys in the same order.
    ///
    /// Scalar contents are ignored: `"a"` and `"b"` have the same shape.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
            }
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
            }
            _ => self.kind() == other.kind(),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null      => Self::Null,
            serde_json::Value::Bool(b)   => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(a)  => Self::Array(a.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(m) => {
                Self::Object(m.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Dates become RFC 3339 strings; everything else maps one to one.
impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null      => Self::Null,
            Value::Bool(b)   => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Date(d)   => Self::String(d.to_rfc3339()),
            Value::Array(a)  => Self::Array(a.into_iter().map(Self::from).collect()),
            Value::Object(e) => Self::Object(e.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(d: DateTime<Tz>) -> Self {
        Self::Date(d.fixed_offset())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::String(s) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Self::Number(n.into()) }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self { Self::Number(n.into()) }
}

/// NaN and the infinities have no JSON form and become `Null`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::Array(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null       => serializer.serialize_unit(),
            Self::Bool(b)    => serializer.serialize_bool(*b),
            Self::Number(n)  => n.serialize(serializer),
            Self::String(s)  => serializer.serialize_str(s),
            Self::Date(d)    => serializer.serialize_str(&d.to_rfc3339()),
            Self::Array(a)   => serializer.collect_seq(a),
            Self::Object(e)  => serializer.collect_map(e.iter().map(|(k, v)| (k, v))),
        }
    }
}
