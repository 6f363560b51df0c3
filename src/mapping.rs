//! Property-to-column mapping resolution
//!
//! A reader resolves one mapping table per record type: explicit mappings
//! first, then header-name matches, then positional assignment when no
//! header exists. The table is built once and reused for every record of
//! that type.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::convert::{default_converter, Converter};
use crate::error::{DelimError, Result};
use crate::value::ValueKind;

/// An explicit binding of one record property to one column
///
/// Returned by [`DelimitedReader::map_property`](crate::DelimitedReader::map_property)
/// for fluent configuration. Every mapping carries an assigned positional
/// index; `column_name` redirects resolution to a header column instead,
/// with the assigned index kept as the fallback when mapping errors are
/// ignored.
pub struct PropertyMapping {
    pub(crate) property_index: usize,
    pub(crate) property_name: &'static str,
    pub(crate) column_index: usize,
    pub(crate) column_name: Option<String>,
    pub(crate) converter: Option<Rc<dyn Converter>>,
}

impl PropertyMapping {
    pub(crate) fn new(property_index: usize, property_name: &'static str, column_index: usize) -> Self {
        PropertyMapping {
            property_index,
            property_name,
            column_index,
            column_name: None,
            converter: None,
        }
    }

    /// Bind this property to a header column by name
    pub fn column_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.column_name = Some(name.into());
        self
    }

    /// Bind this property to a fixed column index
    pub fn column_index(&mut self, index: usize) -> &mut Self {
        self.column_index = index;
        self.column_name = None;
        self
    }

    /// Override the default type-based converter for this property
    pub fn converter(&mut self, converter: impl Converter + 'static) -> &mut Self {
        self.converter = Some(Rc::new(converter));
        self
    }
}

/// One resolved binding in a mapping table
pub(crate) struct MappingEntry {
    pub property_index: usize,
    pub property_name: &'static str,
    pub column: usize,
    pub converter: Rc<dyn Converter>,
}

/// The resolved mapping set for one record type, immutable once built
pub(crate) struct MappingTable {
    pub entries: Vec<MappingEntry>,
}

impl std::fmt::Debug for MappingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Header lookup with the case policy baked into its keys
pub(crate) struct HeaderIndex {
    by_name: IndexMap<String, usize>,
    case_sensitive: bool,
}

impl HeaderIndex {
    /// Index header names by column position, first occurrence wins
    pub fn new(names: &[String], case_sensitive: bool) -> Self {
        let mut by_name = IndexMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let key = normalize(name, case_sensitive);
            by_name.entry(key).or_insert(i);
        }
        HeaderIndex {
            by_name,
            case_sensitive,
        }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name
            .get(&normalize(name, self.case_sensitive))
            .copied()
    }
}

fn normalize(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Resolve the mapping table for a record type
///
/// `properties` lists (name, kind) per descriptor in declaration order.
/// Explicit mappings are fixed; with a header, remaining properties match
/// unused header columns by name; without one, they take the lowest unused
/// column index in declaration order. Properties left over stay unmapped
/// and keep their default values.
pub(crate) fn resolve(
    properties: &[(&'static str, ValueKind)],
    explicit: &[PropertyMapping],
    header: Option<&HeaderIndex>,
    ignore_mapping_errors: bool,
) -> Result<MappingTable> {
    let mut entries = Vec::with_capacity(properties.len());
    let mut used_columns: HashSet<usize> = HashSet::new();
    let mut mapped = vec![false; properties.len()];

    for pm in explicit {
        let column = match (&pm.column_name, header) {
            (Some(name), Some(header)) => match header.get(name) {
                Some(i) => i,
                None if ignore_mapping_errors => pm.column_index,
                None => {
                    return Err(DelimError::Mapping {
                        property: pm.property_name.to_string(),
                        column: name.clone(),
                    })
                }
            },
            // Name bindings resolve against the header only; without one
            // the assigned index applies directly.
            _ => pm.column_index,
        };

        mapped[pm.property_index] = true;
        used_columns.insert(column);
        entries.push(MappingEntry {
            property_index: pm.property_index,
            property_name: pm.property_name,
            column,
            converter: pm
                .converter
                .clone()
                .unwrap_or_else(|| default_converter(properties[pm.property_index].1)),
        });
    }

    if let Some(header) = header {
        for (i, &(name, kind)) in properties.iter().enumerate() {
            if mapped[i] {
                continue;
            }
            if let Some(column) = header.get(name) {
                if used_columns.insert(column) {
                    mapped[i] = true;
                    entries.push(MappingEntry {
                        property_index: i,
                        property_name: name,
                        column,
                        converter: default_converter(kind),
                    });
                }
            }
        }
    } else {
        let mut next = 0usize;
        for (i, &(name, kind)) in properties.iter().enumerate() {
            if mapped[i] {
                continue;
            }
            while used_columns.contains(&next) {
                next += 1;
            }
            used_columns.insert(next);
            entries.push(MappingEntry {
                property_index: i,
                property_name: name,
                column: next,
                converter: default_converter(kind),
            });
        }
    }

    Ok(MappingTable { entries })
}
