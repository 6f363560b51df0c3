//! Quote-aware splitting of one line into fields

use super::QUOTE;

/// Splits a single line of delimited text into unescaped field values
///
/// Standard CSV quoting semantics: a field containing the delimiter, a
/// quote, or a newline must be wrapped in quotes, with interior quotes
/// doubled. Whitespace is never trimmed; only the quote character is
/// structurally significant.
pub struct FieldParser {
    delimiter: char,
}

impl FieldParser {
    /// Create a parser with a custom delimiter
    pub fn new(delimiter: char) -> Self {
        FieldParser { delimiter }
    }

    /// Split one line into its ordered field values
    pub fn parse_line(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == QUOTE {
                if in_quotes && chars.peek() == Some(&QUOTE) {
                    // Doubled quote inside a quoted field is one literal quote
                    field.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            } else if ch == self.delimiter && !in_quotes {
                fields.push(std::mem::take(&mut field));
            } else {
                field.push(ch);
            }
        }

        // Close the field in progress
        fields.push(field);
        fields
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        FieldParser::new(super::DEFAULT_DELIMITER)
    }
}
