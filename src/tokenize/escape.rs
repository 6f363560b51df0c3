//! Escaping a value for safe inclusion in a delimited line

use super::{DEFAULT_DELIMITER, QUOTE};

const ESCAPED_QUOTE: &str = "\"\"";

/// Escapes and unescapes single field values
///
/// A value is wrapped in quotes only when it contains the delimiter, a
/// quote, or a line break; interior quotes are doubled. `unescape` is the
/// left inverse of `escape`.
pub struct FieldEscaper {
    delimiter: char,
}

impl FieldEscaper {
    /// Create an escaper with a custom delimiter
    pub fn new(delimiter: char) -> Self {
        FieldEscaper { delimiter }
    }

    /// Escape a raw value so it survives tokenization as one field
    pub fn escape(&self, value: &str) -> String {
        let escaped = if value.contains(QUOTE) {
            value.replace(QUOTE, ESCAPED_QUOTE)
        } else {
            value.to_string()
        };

        if escaped.contains(self.delimiter)
            || escaped.contains(QUOTE)
            || escaped.contains('\n')
            || escaped.contains('\r')
        {
            let mut quoted = String::with_capacity(escaped.len() + 2);
            quoted.push(QUOTE);
            quoted.push_str(&escaped);
            quoted.push(QUOTE);
            quoted
        } else {
            escaped
        }
    }

    /// Strip one outer quote pair, if present, and collapse doubled quotes
    pub fn unescape(&self, value: &str) -> String {
        if value.len() >= 2 && value.starts_with(QUOTE) && value.ends_with(QUOTE) {
            value[1..value.len() - 1].replace(ESCAPED_QUOTE, &QUOTE.to_string())
        } else {
            value.to_string()
        }
    }
}

impl Default for FieldEscaper {
    fn default() -> Self {
        FieldEscaper::new(DEFAULT_DELIMITER)
    }
}
