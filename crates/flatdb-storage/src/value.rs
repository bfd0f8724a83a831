//! Typed scalars and literal coercion.
//!
//! Column values are one of four scalar kinds. Literals arrive as text (from
//! the command line or an import source) and are coerced against the declared
//! column type. Stored data is not guaranteed to match its declared type, so
//! predicate matching compares values after [`normalize`], which reinterprets
//! numeric- or boolean-looking text.

use std::fmt;
use std::str::FromStr;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::error::{StorageError, StorageResult};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    #[serde(rename = "INT")]
    Integer,
    /// UTF-8 text.
    #[serde(rename = "TEXT")]
    Text,
    /// 64-bit floating point.
    #[serde(rename = "DECIMAL")]
    Decimal,
    /// Boolean.
    #[serde(rename = "BOOL")]
    Boolean,
}

impl DataType {
    /// Returns the catalog spelling of this type.
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Integer => "INT",
            DataType::Text => "TEXT",
            DataType::Decimal => "DECIMAL",
            DataType::Boolean => "BOOL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Ok(DataType::Integer),
            "TEXT" => Ok(DataType::Text),
            "DECIMAL" | "FLOAT" | "DOUBLE" | "REAL" => Ok(DataType::Decimal),
            "BOOL" | "BOOLEAN" => Ok(DataType::Boolean),
            _ => Err(format!("unknown column type: {}", s)),
        }
    }
}

/// A stored column value.
///
/// Serialized as a bare JSON scalar. Decoding picks the first variant that
/// accepts the JSON token, so integral numbers come back as `Integer` and all
/// other numbers as `Decimal`. Non-finite decimals have no JSON form and fail
/// to serialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Decimal(f64),
    /// Boolean value.
    Boolean(bool),
    /// Text value.
    Text(String),
}

impl Value {
    /// Creates a text value.
    pub fn text(v: impl Into<String>) -> Self {
        Value::Text(v.into())
    }

    /// Returns the type this value naturally carries.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Decimal(_) => DataType::Decimal,
            Value::Boolean(_) => DataType::Boolean,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compares two values after normalizing both.
    ///
    /// Integer and decimal values are equal when they denote the same number;
    /// any other pair of kinds never matches.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (normalize(self), normalize(other)) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Integer(i), Value::Decimal(d)) | (Value::Decimal(d), Value::Integer(i)) => {
                i as f64 == d
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Decimal(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Decimal(v) => Err(S::Error::custom(format!(
                "decimal value {} cannot be stored",
                v
            ))),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::Text(v) => serializer.serialize_str(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Parses a boolean literal.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false counterparts.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parses a finite floating-point literal.
fn parse_decimal(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reinterprets text as integer, then decimal, then boolean.
///
/// Non-text values are returned unchanged.
pub fn normalize(value: &Value) -> Value {
    let Value::Text(s) = value else {
        return value.clone();
    };

    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Some(d) = parse_decimal(s) {
        return Value::Decimal(d);
    }
    if let Some(b) = parse_bool(s) {
        return Value::Boolean(b);
    }
    value.clone()
}

/// Strips one pair of enclosing single quotes.
fn unquote(s: &str) -> &str {
    if s.len() > 1 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Coerces a textual literal to the given type.
///
/// Surrounding whitespace is ignored. Text literals lose one pair of
/// enclosing single quotes. Fails with `TypeMismatch` when the literal does
/// not parse as the target type.
pub fn coerce(text: &str, target: DataType) -> StorageResult<Value> {
    let trimmed = text.trim();
    let mismatch = || StorageError::TypeMismatch {
        literal: trimmed.to_string(),
        expected: target,
    };

    match target {
        DataType::Text => Ok(Value::text(unquote(trimmed))),
        DataType::Integer => trimmed.parse::<i64>().map(Value::Integer).map_err(|_| mismatch()),
        DataType::Decimal => parse_decimal(trimmed).map(Value::Decimal).ok_or_else(mismatch),
        DataType::Boolean => parse_bool(trimmed).map(Value::Boolean).ok_or_else(mismatch),
    }
}

/// Coerces a literal for storage, falling back to raw text on failure.
///
/// Used when inserting new rows: a literal that does not fit its column is
/// kept as text rather than rejecting the row.
pub fn coerce_lenient(text: &str, target: DataType, column: &str) -> Value {
    match coerce(text, target) {
        Ok(value) => value,
        Err(_) => {
            let raw = text.trim();
            warn!(column, expected = %target, literal = raw, "literal does not match column type, storing as text");
            Value::text(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_str() {
        assert_eq!("INT".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("integer".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("Decimal".parse::<DataType>().unwrap(), DataType::Decimal);
        assert_eq!("bool".parse::<DataType>().unwrap(), DataType::Boolean);
        assert_eq!("TEXT".parse::<DataType>().unwrap(), DataType::Text);
        assert!("VARCHAR".parse::<DataType>().is_err());
    }

    #[test]
    fn test_data_type_serde_names() {
        assert_eq!(serde_json::to_string(&DataType::Integer).unwrap(), "\"INT\"");
        assert_eq!(serde_json::to_string(&DataType::Boolean).unwrap(), "\"BOOL\"");
        let t: DataType = serde_json::from_str("\"DECIMAL\"").unwrap();
        assert_eq!(t, DataType::Decimal);
    }

    #[test]
    fn test_value_json_decoding() {
        let v: Value = serde_json::from_str("42").unwrap();
        assert_eq!(v, Value::Integer(42));

        let v: Value = serde_json::from_str("-7").unwrap();
        assert_eq!(v, Value::Integer(-7));

        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::Decimal(2.5));

        let v: Value = serde_json::from_str("true").unwrap();
        assert_eq!(v, Value::Boolean(true));

        let v: Value = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(v, Value::text("5"));

        assert!(serde_json::from_str::<Value>("null").is_err());
        assert!(serde_json::from_str::<Value>("[1]").is_err());
    }

    #[test]
    fn test_decimal_keeps_its_kind_on_disk() {
        let encoded = serde_json::to_string(&Value::Decimal(3.0)).unwrap();
        assert_eq!(encoded, "3.0");
        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, Value::Decimal(3.0));
    }

    #[test]
    fn test_coerce_text_strips_one_quote_pair() {
        assert_eq!(coerce("'Alice'", DataType::Text).unwrap(), Value::text("Alice"));
        assert_eq!(coerce("  'Bob'  ", DataType::Text).unwrap(), Value::text("Bob"));
        assert_eq!(coerce("''x''", DataType::Text).unwrap(), Value::text("'x'"));
        assert_eq!(coerce("'", DataType::Text).unwrap(), Value::text("'"));
        assert_eq!(coerce("plain", DataType::Text).unwrap(), Value::text("plain"));
        assert_eq!(coerce("'open", DataType::Text).unwrap(), Value::text("'open"));
    }

    #[test]
    fn test_coerce_numbers_and_booleans() {
        assert_eq!(coerce("42", DataType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(coerce("+3", DataType::Integer).unwrap(), Value::Integer(3));
        assert_eq!(coerce("1.25", DataType::Decimal).unwrap(), Value::Decimal(1.25));
        assert_eq!(coerce("7", DataType::Decimal).unwrap(), Value::Decimal(7.0));
        assert_eq!(coerce("True", DataType::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(coerce("0", DataType::Boolean).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_coerce_mismatch() {
        assert!(matches!(
            coerce("abc", DataType::Integer),
            Err(StorageError::TypeMismatch { expected: DataType::Integer, .. })
        ));
        assert!(coerce("1.5", DataType::Integer).is_err());
        assert!(coerce("NaN", DataType::Decimal).is_err());
        assert!(coerce("inf", DataType::Decimal).is_err());
        assert!(coerce("yes", DataType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_lenient_falls_back_to_text() {
        assert_eq!(coerce_lenient("12", DataType::Integer, "id"), Value::Integer(12));
        assert_eq!(coerce_lenient(" twelve ", DataType::Integer, "id"), Value::text("twelve"));
        assert_eq!(coerce_lenient("maybe", DataType::Boolean, "flag"), Value::text("maybe"));
    }

    #[test]
    fn test_normalize_precedence() {
        assert_eq!(normalize(&Value::text("5")), Value::Integer(5));
        assert_eq!(normalize(&Value::text("5.5")), Value::Decimal(5.5));
        assert_eq!(normalize(&Value::text("1e3")), Value::Decimal(1000.0));
        // "1" is an integer before it is a boolean.
        assert_eq!(normalize(&Value::text("1")), Value::Integer(1));
        assert_eq!(normalize(&Value::text("true")), Value::Boolean(true));
        assert_eq!(normalize(&Value::text("NaN")), Value::text("NaN"));
        assert_eq!(normalize(&Value::text("Alice")), Value::text("Alice"));
        assert_eq!(normalize(&Value::Decimal(2.0)), Value::Decimal(2.0));
    }

    #[test]
    fn test_loosely_equals_across_representations() {
        assert!(Value::text("1").loosely_equals(&Value::Integer(1)));
        assert!(Value::Integer(1).loosely_equals(&Value::text("1")));
        assert!(Value::text("2").loosely_equals(&Value::Decimal(2.0)));
        assert!(Value::text("TRUE").loosely_equals(&Value::Boolean(true)));
        assert!(Value::text("Carol").loosely_equals(&Value::text("Carol")));

        assert!(!Value::text("1").loosely_equals(&Value::Boolean(true)));
        assert!(!Value::Integer(1).loosely_equals(&Value::Decimal(1.5)));
        assert!(!Value::text("carol").loosely_equals(&Value::text("Carol")));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::Decimal(2.5).to_string(), "2.5");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::text("hi").to_string(), "hi");
    }

    #[test]
    fn test_non_finite_decimal_does_not_serialize() {
        assert_eq!(serde_json::to_string(&Value::Decimal(1.5)).unwrap(), "1.5");
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(serde_json::to_string(&Value::Decimal(v)).is_err());
        }
    }
}
