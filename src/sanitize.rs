//! The sanitization engine.
//!
//! [`Sanitizer::sanitize`] walks a [`Value`] depth-first and rewrites every
//! string leaf through a [`Strip`] implementation. Nothing else changes:
//! array lengths and order, object keys and their order, numbers, booleans,
//! nulls and dates all come out exactly as they went in.
//!
//! ```rust
//! use vetted::{Sanitizer, Value};
//!
//! let dirty = Value::from(serde_json::json!({
//!     "name": "<script>alert(1)</script>John",
//!     "tags": ["<img src=x onerror=alert(1)>", "beach"],
//!     "age":  29,
//! }));
//!
//! let clean = Sanitizer::new().sanitize(dirty).unwrap();
//!
//! assert_eq!(
//!     serde_json::Value::from(clean),
//!     serde_json::json!({ "name": "John", "tags": ["", "beach"], "age": 29 }),
//! );
//! ```
//!
//! # Depth
//!
//! Request bodies are attacker-controlled, so recursion is bounded. The
//! top-level value sits at depth 0 and every array or object entered adds
//! one. Entering a container deeper than the configured limit fails the
//! whole walk with [`SanitizeError::DepthExceeded`]; nothing is skipped.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::Value;

/// Default container nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

// ── Errors ────────────────────────────────────────────────────────────────────

/// A [`Strip`] implementation could not process a string.
///
/// Carries a static reason only, never the offending text.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("markup stripping failed: {reason}")]
pub struct StripError {
    reason: &'static str,
}

impl StripError {
    pub fn new(reason: &'static str) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Why a value could not be sanitized.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SanitizeError {
    #[error("value nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error(transparent)]
    Strip(#[from] StripError),
}

impl SanitizeError {
    /// Stable, payload-free label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::Strip(_)             => "strip_failed",
        }
    }
}

// ── Strip capability ──────────────────────────────────────────────────────────

/// Neutralizes executable markup in a single string.
///
/// Implemented for [`MarkupStripper`] and for any
/// `Fn(&str) -> Result<String, StripError>` closure.
pub trait Strip: Send + Sync {
    fn strip(&self, text: &str) -> Result<String, StripError>;
}

impl<F> Strip for F
where
    F: Fn(&str) -> Result<String, StripError> + Send + Sync,
{
    fn strip(&self, text: &str) -> Result<String, StripError> {
        self(text)
    }
}

/// The default [`Strip`]: removes every tag using [`ammonia`].
///
/// - All tags go; the text inside ordinary tags stays.
/// - `<script>` and `<style>` go together with their content.
/// - Attributes (event handlers, `javascript:` URLs) vanish with their tag.
/// - `<` and `>` left in the text stay escaped as `&lt;` and `&gt;`, so no
///   raw angle bracket survives. `&` and U+00A0 come back as themselves.
///   Stripping already-stripped plain text returns it unchanged.
#[derive(Debug)]
pub struct MarkupStripper {
    cleaner: ammonia::Builder<'static>,
}

impl MarkupStripper {
    pub fn new() -> Self {
        let mut cleaner = ammonia::Builder::empty();
        cleaner.clean_content_tags(HashSet::from(["script", "style"]));
        Self { cleaner }
    }
}

impl Default for MarkupStripper {
    fn default() -> Self { Self::new() }
}

impl Strip for MarkupStripper {
    fn strip(&self, text: &str) -> Result<String, StripError> {
        Ok(restore_plain(&self.cleaner.clean(text).to_string()))
    }
}

/// Reverses the two escapes ammonia applies to harmless text, in one pass so
/// a literal `&amp;nbsp;` is not decoded twice.
fn restore_plain(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        if let Some(tail) = rest.strip_prefix("&amp;") {
            out.push('&');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&nbsp;") {
            out.push('\u{a0}');
            rest = tail;
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

// ── Sanitizer ─────────────────────────────────────────────────────────────────

/// Recursive, shape-preserving string sanitizer.
///
/// Cheap to clone and safe to share: it holds an immutable depth limit and
/// an `Arc` to the stripper.
#[derive(Clone)]
pub struct Sanitizer {
    stripper: Arc<dyn Strip>,
    max_depth: usize,
}

impl Sanitizer {
    /// Ammonia-backed sanitizer with [`DEFAULT_MAX_DEPTH`].
    pub fn new() -> Self {
        Self::with_stripper(MarkupStripper::new())
    }

    /// Sanitizer backed by a custom [`Strip`] implementation.
    pub fn with_stripper(stripper: impl Strip + 'static) -> Self {
        Self { stripper: Arc::new(stripper), max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Sets the container nesting limit. Returns `self` for chaining.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    /// Returns `value` with every reachable string passed through the stripper.
    ///
    /// # Errors
    ///
    /// [`SanitizeError::DepthExceeded`] if containers nest deeper than the
    /// limit, [`SanitizeError::Strip`] if the stripper rejects a string.
    /// Either way the partially rewritten tree is dropped.
    pub fn sanitize(&self, value: Value) -> Result<Value, SanitizeError> {
        self.walk(value, 0)
    }

    fn walk(&self, value: Value, depth: usize) -> Result<Value, SanitizeError> {
        // Arrays first, then dates before generic objects.
        match value {
            Value::Array(items) => {
                self.enter(depth)?;
                items.into_iter()
                    .map(|item| self.walk(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            date @ Value::Date(_) => Ok(date),
            Value::Object(entries) => {
                self.enter(depth)?;
                entries.into_iter()
                    .map(|(key, v)| Ok((key, self.walk(v, depth + 1)?)))
                    .collect::<Result<Vec<_>, SanitizeError>>()
                    .map(Value::Object)
            }
            Value::String(text) => Ok(Value::String(self.stripper.strip(&text)?)),
            scalar => Ok(scalar),
        }
    }

    fn enter(&self, depth: usize) -> Result<(), SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::DepthExceeded { limit: self.max_depth });
        }
        Ok(())
    }
}

impl Default for Sanitizer {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
