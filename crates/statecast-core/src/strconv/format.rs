//! Value to text formatters, the companions of [`super::parse`]

use serde_json::{Map, Value};

/// Format a boolean literal.
pub fn bool(v: bool) -> String {
    v.to_string()
}

/// Format a number literal.
///
/// Integral values print without a fractional part (`320`, not `320.0`);
/// non-finite values have no JSON form and print as `null`.
pub fn number(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        Value::Null.to_string()
    }
}

/// Format an integer literal.
pub fn integer(v: i64) -> String {
    v.to_string()
}

/// Format a list literal.
pub fn list(v: &[Value]) -> String {
    Value::Array(v.to_vec()).to_string()
}

/// Format an object literal.
pub fn json_object(v: &Map<String, Value>) -> String {
    Value::Object(v.clone()).to_string()
}

/// Format any JSON value.
pub fn json_value(v: &Value) -> String {
    v.to_string()
}
