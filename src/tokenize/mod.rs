//! Field tokenization: quote-aware line splitting, escaping, and the
//! line-pulling tokenizer that feeds the record reader

mod escape;
mod lines;
mod parser;

pub use escape::FieldEscaper;
pub use lines::LineTokenizer;
pub use parser::FieldParser;

/// Quote character, fixed by the format (not configurable)
pub(crate) const QUOTE: char = '"';

/// Default field delimiter
pub(crate) const DEFAULT_DELIMITER: char = ',';
