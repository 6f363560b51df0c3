//! Record reading with header detection, skip filtering, and typed
//! materialization

use std::any::TypeId;
use std::collections::HashMap;
use std::io::BufRead;
use std::marker::PhantomData;

use crate::error::{DelimError, Result};
use crate::mapping::{self, HeaderIndex, MappingTable, PropertyMapping};
use crate::record::DelimitedRecord;
use crate::tokenize::{LineTokenizer, DEFAULT_DELIMITER};
use crate::value::ValueKind;

/// Fixed marker for comment rows when comment skipping is enabled
const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    NotStarted,
    Reading,
    Exhausted,
}

/// Reads delimited records from a line source, one at a time
///
/// Each successful [`read`](DelimitedReader::read) replaces the current
/// record; [`get_record`](DelimitedReader::get_record) materializes it into
/// a typed struct using a mapping table resolved once per record type.
/// The reader exclusively owns its input source and is single-threaded;
/// independent readers over independent inputs may run on separate threads.
///
/// # Examples
///
/// ```
/// use delimstream::{delimited_record, DelimitedReader};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// delimited_record!(Person {
///     name => Text,
///     age => Integer,
/// });
///
/// let input = "Name,Age\nAlice,30\nBob,25\n";
/// let mut reader = DelimitedReader::new(input.as_bytes()).first_row_is_header(true);
///
/// while reader.read().unwrap() {
///     let person: Person = reader.get_record().unwrap();
///     println!("{} is {}", person.name, person.age);
/// }
/// ```
pub struct DelimitedReader<R> {
    tokenizer: LineTokenizer<R>,

    // Configuration
    first_row_is_header: bool,
    case_sensitive_headers: bool,
    ignore_mapping_errors: bool,
    skip_comments: bool,
    skip: Option<Box<dyn Fn(&[String]) -> bool>>,

    // Reading state
    state: ReaderState,
    has_been_read: bool,
    header: Option<Vec<String>>,
    header_index: Option<HeaderIndex>,
    current: Option<Vec<String>>,
    record_count: u64,

    // Mapping state, keyed by record type
    explicit: HashMap<TypeId, Vec<PropertyMapping>>,
    tables: HashMap<TypeId, MappingTable>,
}

impl<R: BufRead> DelimitedReader<R> {
    /// Create a reader with the default comma delimiter
    pub fn new(input: R) -> Self {
        DelimitedReader::with_delimiter(input, DEFAULT_DELIMITER)
    }

    /// Create a reader with a custom delimiter
    pub fn with_delimiter(input: R, delimiter: char) -> Self {
        DelimitedReader {
            tokenizer: LineTokenizer::with_delimiter(input, delimiter),
            first_row_is_header: false,
            case_sensitive_headers: false,
            ignore_mapping_errors: false,
            skip_comments: false,
            skip: None,
            state: ReaderState::NotStarted,
            has_been_read: false,
            header: None,
            header_index: None,
            current: None,
            record_count: 0,
            explicit: HashMap::new(),
            tables: HashMap::new(),
        }
    }

    /// Treat the first accepted record as the header (builder pattern)
    pub fn first_row_is_header(mut self, has: bool) -> Self {
        self.first_row_is_header = has;
        self
    }

    /// Match header names case-sensitively (default: insensitive)
    pub fn case_sensitive_headers(mut self, sensitive: bool) -> Self {
        self.case_sensitive_headers = sensitive;
        self
    }

    /// Fall back to positional indexes instead of failing when an explicit
    /// name mapping references a missing header column
    pub fn ignore_mapping_errors(mut self, ignore: bool) -> Self {
        self.ignore_mapping_errors = ignore;
        self
    }

    /// Discard records whose first field starts with `#` (builder pattern)
    pub fn skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    /// Discard records matching a caller-supplied predicate
    ///
    /// Skipped records are consumed but never surfaced, including during
    /// header capture.
    pub fn skip_records<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String]) -> bool + 'static,
    {
        self.skip = Some(Box::new(predicate));
        self
    }

    /// Advance to the next record
    ///
    /// Returns `Ok(false)` at end of input; further calls keep returning
    /// `Ok(false)`. On the first call in header mode, the header record is
    /// captured before the first data record is surfaced.
    pub fn read(&mut self) -> Result<bool> {
        if self.state == ReaderState::Exhausted {
            return Ok(false);
        }

        if self.first_row_is_header && self.header.is_none() {
            match self.next_accepted()? {
                Some(record) => {
                    self.header_index =
                        Some(HeaderIndex::new(&record, self.case_sensitive_headers));
                    self.header = Some(record);
                }
                None => {
                    self.state = ReaderState::Exhausted;
                    return Ok(false);
                }
            }
        }

        match self.next_accepted()? {
            Some(record) => {
                self.current = Some(record);
                self.state = ReaderState::Reading;
                self.has_been_read = true;
                self.record_count += 1;
                Ok(true)
            }
            None => {
                self.current = None;
                self.state = ReaderState::Exhausted;
                Ok(false)
            }
        }
    }

    /// The header record, if header mode is enabled
    ///
    /// Errors with [`DelimError::NotRead`] before the first successful
    /// [`read`](DelimitedReader::read).
    pub fn headers(&self) -> Result<Option<&[String]>> {
        if !self.has_been_read {
            return Err(DelimError::NotRead);
        }
        Ok(self.header.as_deref())
    }

    /// The raw fields of the current record
    pub fn current_record(&self) -> Result<&[String]> {
        if !self.has_been_read {
            return Err(DelimError::NotRead);
        }
        self.current.as_deref().ok_or(DelimError::NotRead)
    }

    /// Register an explicit mapping for one property of `T`
    ///
    /// The property name is matched against `T`'s descriptors
    /// (case-insensitively unless configured otherwise); an unknown name is
    /// [`DelimError::Argument`]. The returned mapping can be configured
    /// fluently; registering the same property again returns the existing
    /// mapping. Mappings must be registered before the first
    /// [`get_record`](DelimitedReader::get_record) call for `T`.
    pub fn map_property<T: DelimitedRecord + 'static>(
        &mut self,
        property: &str,
    ) -> Result<&mut PropertyMapping> {
        let props = T::properties();
        let case_sensitive = self.case_sensitive_headers;
        let index = props
            .iter()
            .position(|p| {
                if case_sensitive {
                    p.name == property
                } else {
                    p.name.eq_ignore_ascii_case(property)
                }
            })
            .ok_or_else(|| DelimError::Argument(property.to_string()))?;

        let list = self.explicit.entry(TypeId::of::<T>()).or_default();
        if let Some(existing) = list.iter().position(|pm| pm.property_index == index) {
            return Ok(&mut list[existing]);
        }

        // Each explicit mapping gets the next positional index; that index
        // doubles as the fallback when name resolution is suppressed.
        let assigned = list.iter().map(|pm| pm.column_index + 1).max().unwrap_or(0);
        list.push(PropertyMapping::new(index, props[index].name, assigned));
        let last = list.len() - 1;
        Ok(&mut list[last])
    }

    /// Materialize the current record as a typed struct
    ///
    /// The mapping table for `T` is resolved on the first call and reused
    /// for the life of the reader. A conversion failure aborts this record
    /// without corrupting reader state; the next
    /// [`read`](DelimitedReader::read) still advances normally.
    pub fn get_record<T: DelimitedRecord + 'static>(&mut self) -> Result<T> {
        if !self.has_been_read {
            return Err(DelimError::NotRead);
        }

        let id = TypeId::of::<T>();
        if !self.tables.contains_key(&id) {
            let table = self.build_table::<T>()?;
            self.tables.insert(id, table);
        }

        let props = T::properties();
        let fields = self.current.as_deref().ok_or(DelimError::NotRead)?;
        let mut record = T::default();

        if let Some(table) = self.tables.get(&id) {
            for entry in &table.entries {
                // A record shorter than expected has absent fields; those
                // properties keep their defaults.
                let Some(raw) = fields.get(entry.column) else {
                    continue;
                };
                match entry.converter.parse(raw) {
                    Some(value) => (props[entry.property_index].set)(&mut record, value),
                    None => {
                        return Err(DelimError::Conversion {
                            property: entry.property_name.to_string(),
                            column: entry.column,
                            value: raw.to_string(),
                        })
                    }
                }
            }
        }

        Ok(record)
    }

    /// Iterate typed records until exhaustion
    ///
    /// Lazy, forward-only, single pass; construct a new reader over fresh
    /// input to iterate again.
    pub fn records<T: DelimitedRecord + 'static>(&mut self) -> Records<'_, R, T> {
        Records {
            reader: self,
            _marker: PhantomData,
        }
    }

    /// Number of physical input lines consumed, blank lines included
    pub fn line_count(&self) -> u64 {
        self.tokenizer.line_count()
    }

    /// Number of records surfaced so far (header and skipped rows excluded)
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    fn next_accepted(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            match self.tokenizer.read()? {
                None => return Ok(None),
                Some(record) => {
                    if !self.is_skipped(&record) {
                        return Ok(Some(record));
                    }
                }
            }
        }
    }

    fn is_skipped(&self, record: &[String]) -> bool {
        if self.skip_comments
            && record
                .first()
                .is_some_and(|field| field.starts_with(COMMENT_MARKER))
        {
            return true;
        }
        self.skip.as_ref().is_some_and(|predicate| predicate(record))
    }

    fn build_table<T: DelimitedRecord + 'static>(&self) -> Result<MappingTable> {
        let props = T::properties();
        let meta: Vec<(&'static str, ValueKind)> =
            props.iter().map(|p| (p.name, p.kind)).collect();
        let empty = Vec::new();
        let explicit = self.explicit.get(&TypeId::of::<T>()).unwrap_or(&empty);
        mapping::resolve(
            &meta,
            explicit,
            self.header_index.as_ref(),
            self.ignore_mapping_errors,
        )
    }
}

/// Iterator over typed records, driving `read` + `get_record`
pub struct Records<'a, R, T> {
    reader: &'a mut DelimitedReader<R>,
    _marker: PhantomData<T>,
}

impl<'a, R: BufRead, T: DelimitedRecord + 'static> Iterator for Records<'a, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read() {
            Ok(true) => Some(self.reader.get_record::<T>()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DateTimeConverter;
    use crate::delimited_record;

    #[derive(Default, Debug, PartialEq)]
    struct Row {
        field1: String,
        field2: i64,
    }

    delimited_record!(Row {
        field1 => Text,
        field2 => Integer,
    });

    fn reader(input: &str) -> DelimitedReader<&[u8]> {
        DelimitedReader::new(input.as_bytes())
    }

    #[test]
    fn test_raw_records_and_exhaustion() {
        let mut r = reader("1,2\r\n3,4\r\n");
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["1", "2"]);
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["3", "4"]);
        assert!(!r.read().unwrap());
        assert!(!r.read().unwrap());
    }

    #[test]
    fn test_access_before_read_is_ordering_error() {
        let mut r = reader("a,b\n");
        assert!(matches!(r.headers(), Err(DelimError::NotRead)));
        assert!(matches!(r.current_record(), Err(DelimError::NotRead)));
        assert!(matches!(r.get_record::<Row>(), Err(DelimError::NotRead)));
        assert!(r.read().unwrap());
        assert!(r.current_record().is_ok());
    }

    #[test]
    fn test_header_materialization() {
        let mut r = reader("Field1,Field2\r\nvalue1,100\r\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        assert_eq!(
            r.headers().unwrap(),
            Some(&["Field1".to_string(), "Field2".to_string()][..])
        );
        let row: Row = r.get_record().unwrap();
        assert_eq!(
            row,
            Row {
                field1: "value1".to_string(),
                field2: 100
            }
        );
    }

    #[test]
    fn test_positional_materialization_without_header() {
        let mut r = reader("value1,100\n");
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field1, "value1");
        assert_eq!(row.field2, 100);
    }

    #[test]
    fn test_header_matching_is_case_insensitive() {
        let mut r = reader("FIELD2,FIELD1\n7,seven\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field1, "seven");
        assert_eq!(row.field2, 7);
    }

    #[test]
    fn test_unmatched_property_keeps_default() {
        let mut r = reader("Field1,Other\nvalue1,junk\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field1, "value1");
        assert_eq!(row.field2, 0);
    }

    #[test]
    fn test_short_record_keeps_default() {
        let mut r = reader("Field1,Field2\nonly\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field1, "only");
        assert_eq!(row.field2, 0);
    }

    #[test]
    fn test_explicit_mapping_to_missing_header_fails() {
        let mut r = reader("Field1,Field2\nvalue1,100\n").first_row_is_header(true);
        r.map_property::<Row>("field1")
            .unwrap()
            .column_name("FOO");
        assert!(r.read().unwrap());
        let err = r.get_record::<Row>().unwrap_err();
        match err {
            DelimError::Mapping { property, column } => {
                assert_eq!(property, "field1");
                assert_eq!(column, "FOO");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ignored_mapping_error_falls_back_to_index() {
        let mut r = reader("Field1,Field2\nvalue1,100\n")
            .first_row_is_header(true)
            .ignore_mapping_errors(true);
        // First explicit mapping gets index 0, the fallback column
        r.map_property::<Row>("field1")
            .unwrap()
            .column_name("FOO");
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field1, "value1");
        assert_eq!(row.field2, 100);
    }

    #[test]
    fn test_unknown_property_is_argument_error() {
        let mut r = reader("a\n");
        assert!(matches!(
            r.map_property::<Row>("nonexistent"),
            Err(DelimError::Argument(_))
        ));
    }

    #[test]
    fn test_remapping_returns_existing_mapping() {
        let mut r = reader("a,b\n");
        r.map_property::<Row>("field2").unwrap().column_index(5);
        r.map_property::<Row>("field2").unwrap();
        assert_eq!(r.explicit[&TypeId::of::<Row>()].len(), 1);
        assert_eq!(r.explicit[&TypeId::of::<Row>()][0].column_index, 5);
    }

    #[test]
    fn test_conversion_error_names_property_and_column() {
        let mut r = reader("Field1,Field2\nvalue1,notanumber\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        let err = r.get_record::<Row>().unwrap_err();
        match err {
            DelimError::Conversion {
                property,
                column,
                value,
            } => {
                assert_eq!(property, "field2");
                assert_eq!(column, 1);
                assert_eq!(value, "notanumber");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conversion_error_does_not_corrupt_reader() {
        let mut r = reader("Field1,Field2\nvalue1,bad\nvalue2,2\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        assert!(r.get_record::<Row>().is_err());
        assert!(r.read().unwrap());
        let row: Row = r.get_record().unwrap();
        assert_eq!(row.field2, 2);
    }

    #[test]
    fn test_skip_predicate_applies_during_header_capture() {
        let input = "TRAILER,x\nField1,Field2\nTRAILER,y\nvalue1,100\n";
        let mut r = reader(input)
            .first_row_is_header(true)
            .skip_records(|record| record.first().map(String::as_str) == Some("TRAILER"));
        assert!(r.read().unwrap());
        assert_eq!(
            r.headers().unwrap(),
            Some(&["Field1".to_string(), "Field2".to_string()][..])
        );
        assert_eq!(r.current_record().unwrap(), ["value1", "100"]);
    }

    #[test]
    fn test_comment_rows_skipped() {
        let mut r = reader("# generated file\na,b\n#trailer\nc,d\n").skip_comments(true);
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["a", "b"]);
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["c", "d"]);
        assert!(!r.read().unwrap());
        assert_eq!(r.line_count(), 4);
    }

    #[test]
    fn test_blank_lines_between_records() {
        let mut r = reader("a,b\n\nc,d\n");
        assert!(r.read().unwrap());
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["c", "d"]);
        assert!(!r.read().unwrap());
        assert_eq!(r.line_count(), 3);
        assert_eq!(r.record_count(), 2);
    }

    #[test]
    fn test_records_iterator() {
        let mut r = reader("Field1,Field2\na,1\nb,2\n").first_row_is_header(true);
        let rows: Vec<Row> = r.records().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field1, "a");
        assert_eq!(rows[1].field2, 2);
    }

    #[test]
    fn test_custom_delimiter() {
        let mut r = DelimitedReader::with_delimiter("x;y;\"a;b\"\n".as_bytes(), ';');
        assert!(r.read().unwrap());
        assert_eq!(r.current_record().unwrap(), ["x", "y", "a;b"]);
    }

    #[test]
    fn test_custom_converter() {
        #[derive(Default)]
        struct Event {
            label: String,
            at: chrono::NaiveDateTime,
        }

        delimited_record!(Event {
            label => Text,
            at => DateTime,
        });

        let mut r = reader("label,at\nlaunch,03/01/2024\n").first_row_is_header(true);
        r.map_property::<Event>("at")
            .unwrap()
            .column_name("at")
            .converter(DateTimeConverter::new("%m/%d/%Y"));
        assert!(r.read().unwrap());
        let event: Event = r.get_record().unwrap();
        assert_eq!(event.label, "launch");
        assert_eq!(event.at.format("%Y-%m-%d").to_string(), "2024-03-01");
    }

    #[test]
    fn test_header_only_input_exhausts() {
        let mut r = reader("Field1,Field2\n").first_row_is_header(true);
        assert!(!r.read().unwrap());
        assert!(!r.read().unwrap());
    }

    #[test]
    fn test_mapping_table_built_once() {
        // Header from the first read drives mapping; later rows with
        // different shapes reuse the same table.
        let mut r = reader("Field2,Field1\n1,a\n2,b,extra\n").first_row_is_header(true);
        assert!(r.read().unwrap());
        let first: Row = r.get_record().unwrap();
        assert_eq!((first.field1.as_str(), first.field2), ("a", 1));
        assert!(r.read().unwrap());
        let second: Row = r.get_record().unwrap();
        assert_eq!((second.field1.as_str(), second.field2), ("b", 2));
    }
}
