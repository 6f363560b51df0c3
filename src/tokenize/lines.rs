//! Line-pulling tokenizer over a buffered source

use std::io::BufRead;

use crate::error::{DelimError, Result};

use super::{FieldParser, DEFAULT_DELIMITER};

/// Pulls physical lines from a source and tokenizes each into fields
///
/// One call to [`read`](LineTokenizer::read) consumes input up to the next
/// non-blank line and returns its fields. Blank lines yield no record and
/// are skipped, but still advance [`line_count`](LineTokenizer::line_count),
/// which tracks raw input position rather than logical record count.
/// Accepted line terminators are CRLF, LF, and CR-only; the final line does
/// not need a terminator. Once the source is exhausted, `read` keeps
/// returning `Ok(None)`.
pub struct LineTokenizer<R> {
    input: R,
    parser: FieldParser,
    line_count: u64,
    exhausted: bool,
}

impl<R: BufRead> LineTokenizer<R> {
    /// Create a tokenizer with the default comma delimiter
    pub fn new(input: R) -> Self {
        LineTokenizer::with_delimiter(input, DEFAULT_DELIMITER)
    }

    /// Create a tokenizer with a custom delimiter
    pub fn with_delimiter(input: R, delimiter: char) -> Self {
        LineTokenizer {
            input,
            parser: FieldParser::new(delimiter),
            line_count: 0,
            exhausted: false,
        }
    }

    /// Number of physical lines consumed so far, blank lines included
    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    /// Read the next record, skipping blank lines
    ///
    /// Returns `Ok(None)` at end of input, idempotently.
    pub fn read(&mut self) -> Result<Option<Vec<String>>> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            match self.next_line()? {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(line) => {
                    self.line_count += 1;
                    if line.is_empty() {
                        continue;
                    }
                    return Ok(Some(self.parser.parse_line(&line)));
                }
            }
        }
    }

    /// Pull one physical line, handling CRLF, LF, and CR-only terminators
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf: Vec<u8> = Vec::new();
        let mut terminated = false;
        let mut saw_cr = false;

        while !terminated {
            let (used, done) = {
                let available = self
                    .input
                    .fill_buf()
                    .map_err(|e| DelimError::Read(e.to_string()))?;

                if available.is_empty() {
                    if buf.is_empty() {
                        return Ok(None);
                    }
                    (0, true)
                } else {
                    match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                        Some(pos) => {
                            buf.extend_from_slice(&available[..pos]);
                            saw_cr = available[pos] == b'\r';
                            (pos + 1, true)
                        }
                        None => {
                            buf.extend_from_slice(available);
                            (available.len(), false)
                        }
                    }
                }
            };
            self.input.consume(used);
            terminated = done;
        }

        // A CR may be the first half of a CRLF pair
        if saw_cr {
            let has_lf = {
                let available = self
                    .input
                    .fill_buf()
                    .map_err(|e| DelimError::Read(e.to_string()))?;
                available.first() == Some(&b'\n')
            };
            if has_lf {
                self.input.consume(1);
            }
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}
