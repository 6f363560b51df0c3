//! Converters between raw field text and typed values
//!
//! Each mapped property gets a converter selected by its [`ValueKind`];
//! a custom converter registered on the mapping overrides the default.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::{FieldValue, ValueKind};

/// Pluggable parse/format pair for one mapped property
///
/// `parse` returns `None` when the raw text cannot represent the target
/// type; the reader turns that into a conversion error naming the property
/// and column. `format` is the inverse used to render a value back to
/// field text.
pub trait Converter {
    /// Parse raw field text into a typed value
    fn parse(&self, raw: &str) -> Option<FieldValue>;

    /// Render a typed value back to raw field text
    fn format(&self, value: &FieldValue) -> String;
}

/// Select the default converter for a property kind
pub(crate) fn default_converter(kind: ValueKind) -> Rc<dyn Converter> {
    match kind {
        ValueKind::Text => Rc::new(TextConverter),
        ValueKind::Integer => Rc::new(IntegerConverter),
        ValueKind::Float => Rc::new(FloatConverter),
        ValueKind::Boolean => Rc::new(BooleanConverter),
        ValueKind::DateTime => Rc::new(DateTimeConverter::default()),
    }
}

/// Identity converter for text properties
pub struct TextConverter;

impl Converter for TextConverter {
    fn parse(&self, raw: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(raw.to_string()))
    }

    fn format(&self, value: &FieldValue) -> String {
        value.to_string()
    }
}

/// Converter for signed 64-bit integers
pub struct IntegerConverter;

impl Converter for IntegerConverter {
    fn parse(&self, raw: &str) -> Option<FieldValue> {
        raw.parse::<i64>().ok().map(FieldValue::Integer)
    }

    fn format(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Integer(i) => itoa::Buffer::new().format(*i).to_string(),
            other => other.to_string(),
        }
    }
}

/// Converter for 64-bit floats
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn parse(&self, raw: &str) -> Option<FieldValue> {
        raw.parse::<f64>().ok().map(FieldValue::Float)
    }

    fn format(&self, value: &FieldValue) -> String {
        value.to_string()
    }
}

/// Converter for booleans
///
/// Accepts `true`/`false`, `yes`/`no`, and `1`/`0`, case-insensitively.
pub struct BooleanConverter;

impl Converter for BooleanConverter {
    fn parse(&self, raw: &str) -> Option<FieldValue> {
        match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(FieldValue::Boolean(true)),
            "false" | "no" | "0" => Some(FieldValue::Boolean(false)),
            _ => None,
        }
    }

    fn format(&self, value: &FieldValue) -> String {
        value.to_string()
    }
}

/// Default chrono format when none is supplied
const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converter for date-time properties with a configurable format string
///
/// Values carrying only a date component (no time fields in the format)
/// parse to midnight of that date.
pub struct DateTimeConverter {
    format: String,
}

impl DateTimeConverter {
    /// Create a converter with a custom chrono format string, e.g. `%m/%d/%Y`
    pub fn new(format: impl Into<String>) -> Self {
        DateTimeConverter {
            format: format.into(),
        }
    }
}

impl Default for DateTimeConverter {
    fn default() -> Self {
        DateTimeConverter::new(DEFAULT_DATETIME_FORMAT)
    }
}

impl Converter for DateTimeConverter {
    fn parse(&self, raw: &str) -> Option<FieldValue> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &self.format) {
            return Some(FieldValue::DateTime(dt));
        }
        // Date-only formats produce no time component
        NaiveDate::parse_from_str(raw, &self.format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(FieldValue::DateTime)
    }

    fn format(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::DateTime(dt) => dt.format(&self.format).to_string(),
            other => other.to_string(),
        }
    }
}
