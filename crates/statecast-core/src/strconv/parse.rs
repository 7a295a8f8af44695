//! Text to value parsers
//!
//! Every parser decodes its input as a JSON literal first and then checks the
//! decoded shape. Malformed input yields [`ParseError::Syntax`]; a valid
//! literal of the wrong kind yields [`ParseError::ShapeMismatch`].
//!
//! Number literals outside the `f64` range, such as `1e400`, are rejected by
//! the JSON decoder and surface as [`ParseError::Syntax`] rather than
//! parsing to an infinity.

use crate::errors::{JsonKind, ParseError};
use serde_json::{Map, Value};

/// Outcome of a parse.
pub type Parsed<T> = Result<T, ParseError>;

/// Parse any valid JSON literal.
pub fn json_value(s: &str) -> Parsed<Value> {
    serde_json::from_str(s).map_err(|e| ParseError::syntax(e.to_string()))
}

/// Parse a boolean literal.
pub fn bool(s: &str) -> Parsed<bool> {
    match json_value(s)? {
        Value::Bool(b) => Ok(b),
        other => Err(mismatch(JsonKind::Bool, &other)),
    }
}

/// Parse a number literal.
pub fn number(s: &str) -> Parsed<f64> {
    match json_value(s)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::syntax(format!("{n} is not representable"))),
        other => Err(mismatch(JsonKind::Number, &other)),
    }
}

/// Parse an integral number literal.
///
/// Numbers with a fractional part, and integral numbers outside the `i64`
/// range, are a shape mismatch against [`JsonKind::Integer`].
pub fn integer(s: &str) -> Parsed<i64> {
    match json_value(s)? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => match n.as_f64() {
                // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(ParseError::shape_mismatch(JsonKind::Integer, JsonKind::Number)),
            },
        },
        other => Err(mismatch(JsonKind::Integer, &other)),
    }
}

/// Parse a list literal.
pub fn list(s: &str) -> Parsed<Vec<Value>> {
    match json_value(s)? {
        Value::Array(items) => Ok(items),
        other => Err(mismatch(JsonKind::List, &other)),
    }
}

/// Parse an object literal.
pub fn json_object(s: &str) -> Parsed<Map<String, Value>> {
    match json_value(s)? {
        Value::Object(map) => Ok(map),
        other => Err(mismatch(JsonKind::Object, &other)),
    }
}

fn mismatch(expected: JsonKind, found: &Value) -> ParseError {
    ParseError::shape_mismatch(expected, JsonKind::of(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_bool() {
        assert_eq!(bool("false"), Ok(false));
        assert_eq!(bool("true"), Ok(true));
        assert_matches!(
            bool("123"),
            Err(ParseError::ShapeMismatch {
                expected: JsonKind::Bool,
                found: JsonKind::Number
            })
        );
        assert_matches!(bool("xxxxx"), Err(ParseError::Syntax { .. }));
    }

    #[test]
    fn test_number() {
        assert_eq!(number("320"), Ok(320.0));
        assert_eq!(number("0.4"), Ok(0.4));
        assert_matches!(number("true"), Err(ParseError::ShapeMismatch { .. }));
        assert_matches!(number("xxxx"), Err(ParseError::Syntax { .. }));
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer("42"), Ok(42));
        assert_eq!(integer("-7"), Ok(-7));
        assert_eq!(integer("3.0"), Ok(3));
        assert_matches!(integer("3.5"), Err(ParseError::ShapeMismatch { .. }));
        assert_matches!(integer("\"3\""), Err(ParseError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_integer_past_i64_range_is_rejected() {
        assert_eq!(integer("9223372036854775807"), Ok(i64::MAX));
        assert_eq!(integer("-9223372036854775808"), Ok(i64::MIN));
        for s in ["9223372036854775808", "9223372036854775809", "1e19"] {
            assert_eq!(
                integer(s),
                Err(ParseError::shape_mismatch(JsonKind::Integer, JsonKind::Number)),
                "{s}"
            );
        }
    }

    #[test]
    fn test_fractional_integer_names_the_integer_kind() {
        let err = integer("3.5").unwrap_err();
        assert_eq!(
            err,
            ParseError::shape_mismatch(JsonKind::Integer, JsonKind::Number)
        );
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_number_out_of_f64_range_is_syntax() {
        assert_matches!(number("1e400"), Err(ParseError::Syntax { .. }));
        assert_matches!(integer("1e400"), Err(ParseError::Syntax { .. }));
    }

    #[test]
    fn test_list() {
        assert_eq!(list("[[42]]"), Ok(vec![json!([42])]));
        assert_eq!(list(r#"["hi"]"#), Ok(vec![json!("hi")]));
        assert_eq!(list("[7,42]"), Ok(vec![json!(7), json!(42)]));
        assert_matches!(list("true"), Err(ParseError::ShapeMismatch { .. }));
        assert_matches!(list("xxxx"), Err(ParseError::Syntax { .. }));
    }

    #[test]
    fn test_object() {
        let parsed = json_object(r#"{ "a": 1 }"#).unwrap();
        assert_eq!(Value::Object(parsed), json!({"a": 1}));

        assert_matches!(
            json_object("[42]"),
            Err(ParseError::ShapeMismatch {
                found: JsonKind::List,
                ..
            })
        );
        assert_matches!(json_object("true"), Err(ParseError::ShapeMismatch { .. }));
        assert_matches!(json_object("xxxx"), Err(ParseError::Syntax { .. }));
    }

    #[test]
    fn test_json_value_accepts_any_literal() {
        assert_eq!(json_value("null"), Ok(Value::Null));
        assert_eq!(json_value(r#""s""#), Ok(json!("s")));
        assert_matches!(json_value(""), Err(ParseError::Syntax { .. }));
    }
}
