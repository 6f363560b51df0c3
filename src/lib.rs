//! # delimstream
//!
//! Streaming delimited-text (CSV-style) parsing with typed record mapping.
//!
//! The crate reads sequential lines of delimiter-separated, optionally
//! quoted fields and exposes them either as raw ordered field arrays or as
//! typed structs whose fields are bound to columns by name, position, or
//! explicit rule.
//!
//! ## Raw records
//!
//! ```
//! use delimstream::DelimitedReader;
//!
//! let input = "one,\"two,half\",three\nfour,\"\"\"five\"\"\",six\n";
//! let mut reader = DelimitedReader::new(input.as_bytes());
//!
//! reader.read().unwrap();
//! assert_eq!(reader.current_record().unwrap(), ["one", "two,half", "three"]);
//! reader.read().unwrap();
//! assert_eq!(reader.current_record().unwrap(), ["four", "\"five\"", "six"]);
//! ```
//!
//! ## Typed records
//!
//! ```
//! use delimstream::{delimited_record, DelimitedReader};
//!
//! #[derive(Default)]
//! struct Measurement {
//!     sensor: String,
//!     reading: f64,
//!     valid: bool,
//! }
//!
//! delimited_record!(Measurement {
//!     sensor => Text,
//!     reading => Float,
//!     valid => Boolean,
//! });
//!
//! let input = "Sensor,Reading,Valid\ntherm-1,21.5,true\n";
//! let mut reader = DelimitedReader::new(input.as_bytes()).first_row_is_header(true);
//!
//! for result in reader.records::<Measurement>() {
//!     let m = result.unwrap();
//!     assert_eq!(m.sensor, "therm-1");
//!     assert!(m.valid);
//! }
//! ```
//!
//! ## Escaping
//!
//! ```
//! use delimstream::FieldEscaper;
//!
//! let escaper = FieldEscaper::default();
//! assert_eq!(escaper.escape(r#"Say "Hi""#), r#""Say ""Hi""""#);
//! assert_eq!(escaper.unescape(r#""a,b""#), "a,b");
//! ```

pub mod convert;
pub mod error;
pub mod mapping;
pub mod reader;
pub mod record;
pub mod tokenize;
pub mod value;

pub use convert::{
    BooleanConverter, Converter, DateTimeConverter, FloatConverter, IntegerConverter,
    TextConverter,
};
pub use error::{DelimError, Result};
pub use mapping::PropertyMapping;
pub use reader::{DelimitedReader, Records};
pub use record::{DelimitedRecord, Property};
pub use tokenize::{FieldEscaper, FieldParser, LineTokenizer};
pub use value::{FieldValue, ValueKind};
