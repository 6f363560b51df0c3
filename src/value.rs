//! Typed field values moved between raw text and record properties

use std::fmt;

use chrono::NaiveDateTime;

/// Type tag for a record property, used to select the default converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// Plain text, passed through unchanged
    Text,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Boolean
    Boolean,
    /// Date or date-time value
    DateTime,
}

/// A single converted field value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// String value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Date-time value
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// The kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Boolean(_) => ValueKind::Boolean,
            FieldValue::DateTime(_) => ValueKind::DateTime,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        FieldValue::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(FieldValue::from("x").kind(), ValueKind::Text);
        assert_eq!(FieldValue::from(42i64).kind(), ValueKind::Integer);
        assert_eq!(FieldValue::from(1.5).kind(), ValueKind::Float);
        assert_eq!(FieldValue::from(true).kind(), ValueKind::Boolean);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::from("hello").to_string(), "hello");
        assert_eq!(FieldValue::from(42i64).to_string(), "42");
        assert_eq!(FieldValue::from(false).to_string(), "false");
    }
}
