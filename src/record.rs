//! Static property descriptors for typed record materialization

use crate::value::{FieldValue, ValueKind};

/// One settable property of a record type
///
/// Descriptors are declared statically by the record type; the mapping
/// engine never inspects runtime metadata. The setter receives the
/// converted value and writes it into the record.
pub struct Property<T> {
    /// Property name, matched against header column names
    pub name: &'static str,
    /// Declared value type, selects the default converter
    pub kind: ValueKind,
    /// Writes a converted value into the record
    pub set: fn(&mut T, FieldValue),
}

/// A type whose fields can be populated from delimited records
///
/// Implement by hand or via the [`delimited_record!`](crate::delimited_record)
/// macro. Declaration order of the descriptors is the order used for
/// positional mapping.
pub trait DelimitedRecord: Default {
    /// The property descriptors of this type, in declaration order
    fn properties() -> Vec<Property<Self>>
    where
        Self: Sized;
}

/// Declare the property descriptor table for a plain struct
///
/// Each entry names a field and the [`ValueKind`](crate::ValueKind) variant
/// whose payload type matches the field (`Text` for `String`, `Integer` for
/// `i64`, `Float` for `f64`, `Boolean` for `bool`, `DateTime` for
/// `chrono::NaiveDateTime`).
///
/// ```
/// use delimstream::delimited_record;
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
/// ```
#[macro_export]
macro_rules! delimited_record {
    ($ty:ty { $($field:ident => $kind:ident),+ $(,)? }) => {
        impl $crate::record::DelimitedRecord for $ty {
            fn properties() -> ::std::vec::Vec<$crate::record::Property<Self>> {
                ::std::vec![
                    $(
                        $crate::record::Property {
                            name: stringify!($field),
                            kind: $crate::value::ValueKind::$kind,
                            set: |record, value| {
                                if let $crate::value::FieldValue::$kind(v) = value {
                                    record.$field = v;
                                }
                            },
                        }
                    ),+
                ]
            }
        }
    };
}
