//! Raw JSON values crossing the host/page boundary.
//!
//! A [`JsValue`] holds the canonical JSON text of a page value exactly as
//! `JSON.stringify` would produce it, and decodes lazily on request.
//! `undefined` is represented by the empty string.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// JsValue
// ============================================================================

/// JSON text of a value produced by the page.
///
/// # Example
///
/// ```ignore
/// let value = session.evaluate("({x: 5, y: 7})").await?;
/// assert_eq!(value, r#"{"x":5,"y":7}"#);
///
/// #[derive(serde::Deserialize)]
/// struct Point { x: i32, y: i32 }
/// let point: Point = value.decode()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsValue(String);

impl JsValue {
    /// The `undefined` value (empty text).
    #[inline]
    #[must_use]
    pub const fn undefined() -> Self {
        Self(String::new())
    }

    /// Wraps JSON text without validating it.
    #[inline]
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Serializes a JSON value into its canonical text.
    #[inline]
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// Returns the JSON text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the JSON text.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns `true` for `undefined`.
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text does not match `T`, and
    /// [`Error::InvalidArgument`] for `undefined`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if self.is_undefined() {
            return Err(Error::invalid_argument("value is undefined"));
        }
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Parses the value into a [`serde_json::Value`].
    ///
    /// `undefined` becomes `null`.
    pub fn to_value(&self) -> Result<Value> {
        if self.is_undefined() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Returns the decoded string if the value is a JSON string.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        serde_json::from_str::<String>(&self.0).ok()
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for JsValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JsValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<JsValue> for String {
    fn from(value: JsValue) -> Self {
        value.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_from_json_is_compact() {
        let value = JsValue::from_json(&json!({"x": 5, "y": 7}));
        assert_eq!(value, r#"{"x":5,"y":7}"#);
        assert_eq!(value.decode::<Point>().expect("decode"), Point { x: 5, y: 7 });
    }

    #[test]
    fn test_undefined() {
        let value = JsValue::undefined();
        assert!(value.is_undefined());
        assert_eq!(value.as_str(), "");
        assert_eq!(value.to_value().expect("null"), Value::Null);
        assert!(matches!(
            value.decode::<i32>(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_as_string() {
        assert_eq!(JsValue::from_raw(r#""5""#).as_string().as_deref(), Some("5"));
        assert_eq!(JsValue::from_raw("5").as_string(), None);
    }

    #[test]
    fn test_decode_mismatch() {
        let err = JsValue::from_raw(r#""foo""#)
            .decode::<i64>()
            .expect_err("type mismatch");
        assert!(matches!(err, Error::Json(_)));
    }
}
