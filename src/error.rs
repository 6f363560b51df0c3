//! Error types for delimited-text parsing and record mapping

use thiserror::Error;

/// Errors produced while reading, mapping, or converting delimited text
#[derive(Debug, Error)]
pub enum DelimError {
    /// Failed to read from the underlying line source
    #[error("failed to read input: {0}")]
    Read(String),

    /// An explicit name mapping referenced a column missing from the header
    ///
    /// Suppressed when the reader runs with `ignore_mapping_errors(true)`,
    /// in which case the mapping falls back to its assigned column index.
    #[error("property '{property}' could not be mapped to column '{column}'")]
    Mapping { property: String, column: String },

    /// A raw field could not be converted to the mapped property's type
    #[error("could not convert '{value}' in column {column} to property '{property}'")]
    Conversion {
        property: String,
        column: usize,
        value: String,
    },

    /// Header or record access was requested before a successful `read()`
    #[error("read must be invoked before data can be accessed")]
    NotRead,

    /// A mapping request targeted something that is not a record property
    #[error("'{0}' is not a mappable property")]
    Argument(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DelimError>;
