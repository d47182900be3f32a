//! Declarative field mapping between raw payloads and typed records
//!
//! A record type is declared once with the [`record!`](crate::record) macro,
//! listing for every field its source JSON key and converter:
//!
//! ```
//! use tns_energo_core::convert;
//! use tns_energo_core::mapping::Record;
//!
//! tns_energo_core::record! {
//!     /// One tariff zone reading
//!     pub struct Reading {
//!         label: String = "label" => convert::string;
//!         value: i64 = "value" => convert::integer;
//!         comment: Option<String> => convert::string_opt, default = None;
//!     }
//! }
//!
//! let raw = serde_json::json!({"label": " day ", "value": "120", "extra": 1});
//! let reading = Reading::from_response(&raw).unwrap();
//! assert_eq!(reading.label, "day");
//! assert_eq!(reading.view().get("value"), Some(serde_json::json!(120)));
//! ```
//!
//! The macro generates the static field table ([`Record::FIELDS`]), the
//! generic constructor ([`Record::build`]) and the canonical raw rendering
//! used by the read-only [`RecordView`] and by cross-record copying
//! ([`Record::convert_to`]).

use crate::convert::{DATETIME_FORMAT, DATE_FORMAT};
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};

/// Binding of a declared field name to its source JSON key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub key: &'static str,
}

/// Explicit values applied on top of copied fields, by declared name
pub type Overrides = Vec<(&'static str, Value)>;

/// Raw values keyed by declared field name, ready for [`Record::build`]
#[derive(Debug, Clone)]
pub struct Source {
    record: &'static str,
    values: HashMap<&'static str, Value>,
}

impl Source {
    /// Empty source for the named record type
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            values: HashMap::new(),
        }
    }

    /// Pick the declared fields of `R` out of a raw JSON object
    pub fn from_raw<R: Record>(raw: &Value) -> Result<Self> {
        let object = raw.as_object().ok_or_else(|| {
            Error::format(format!("{} expects a JSON object, got {raw}", R::NAME))
        })?;

        let values = R::FIELDS
            .iter()
            .filter_map(|field| object.get(field.key).map(|v| (field.name, v.clone())))
            .collect();

        Ok(Self {
            record: R::NAME,
            values,
        })
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Convert one field.
    ///
    /// A present value goes through `convert`. An absent one takes `default`;
    /// without a default the converter is offered `null`, and if it rejects
    /// that the field is reported missing.
    pub fn field<T, F>(
        &self,
        name: &'static str,
        key: &'static str,
        convert: F,
        default: Option<T>,
    ) -> Result<T>
    where
        F: Fn(&Value) -> Result<T>,
    {
        match self.values.get(name) {
            Some(raw) => convert(raw).map_err(|e| match e {
                Error::Format { message } => Error::Format {
                    message: format!("{}.{}: {}", self.record, key, message),
                },
                other => other,
            }),
            None => match default {
                Some(value) => Ok(value),
                None => convert(&Value::Null).map_err(|_| Error::MissingField {
                    record: self.record,
                    field: key.to_string(),
                }),
            },
        }
    }
}

/// A typed record built from a raw vendor mapping
pub trait Record: Sized {
    /// Type name used in error messages
    const NAME: &'static str;

    /// Declared fields in declaration order
    const FIELDS: &'static [Field];

    /// Construct from values keyed by declared name
    fn build(source: &Source) -> Result<Self>;

    /// Canonical raw value of a field by declared name
    fn value_of(&self, name: &str) -> Option<Value>;

    /// Construct from a raw JSON object; unclaimed keys are ignored
    fn from_response(raw: &Value) -> Result<Self> {
        Self::build(&Source::from_raw::<Self>(raw)?)
    }

    /// Read-only mapping view keyed by source JSON key
    fn view(&self) -> RecordView<'_, Self> {
        RecordView { record: self }
    }

    /// Build a `T` from every field it shares (by declared name) with `self`
    fn convert_to<T: Record>(&self, overrides: Overrides) -> Result<T> {
        T::convert_from(self, overrides)
    }

    /// Build `Self` from every field it shares (by declared name) with `other`
    fn convert_from<S: Record>(other: &S, overrides: Overrides) -> Result<Self> {
        let mut source = Source::new(Self::NAME);
        for field in Self::FIELDS {
            if let Some(value) = other.value_of(field.name) {
                source.insert(field.name, value);
            }
        }
        for (name, value) in overrides {
            let field = Self::FIELDS
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| {
                    Error::invalid_argument(format!("{} has no field named '{name}'", Self::NAME))
                })?;
            source.insert(field.name, value);
        }
        Self::build(&source)
    }
}

/// Mapping-like view over a record, keyed by source JSON key
#[derive(Debug)]
pub struct RecordView<'a, R: Record> {
    record: &'a R,
}

impl<'a, R: Record> RecordView<'a, R> {
    pub fn len(&self) -> usize {
        R::FIELDS.len()
    }

    pub fn is_empty(&self) -> bool {
        R::FIELDS.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        R::FIELDS.iter().any(|f| f.key == key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        R::FIELDS
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| self.record.value_of(f.name))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        R::FIELDS.iter().map(|f| f.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Value)> + 'a {
        let record = self.record;
        R::FIELDS
            .iter()
            .filter_map(move |f| record.value_of(f.name).map(|v| (f.key, v)))
    }
}

/// Canonical raw rendering accepted back by the matching converter
pub trait ToRaw {
    fn to_raw(&self) -> Value;
}

/// Rendering of map keys in nested aggregates
pub trait RawKey {
    fn raw_key(&self) -> String;
}

impl ToRaw for bool {
    fn to_raw(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToRaw for i64 {
    fn to_raw(&self) -> Value {
        Value::from(*self)
    }
}

impl ToRaw for f64 {
    fn to_raw(&self) -> Value {
        Number::from_f64(*self).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl ToRaw for String {
    fn to_raw(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToRaw for NaiveDate {
    fn to_raw(&self) -> Value {
        Value::String(self.format(DATE_FORMAT).to_string())
    }
}

impl ToRaw for NaiveDateTime {
    fn to_raw(&self) -> Value {
        Value::String(self.format(DATETIME_FORMAT).to_string())
    }
}

impl ToRaw for Value {
    fn to_raw(&self) -> Value {
        self.clone()
    }
}

impl<T: ToRaw> ToRaw for Option<T> {
    fn to_raw(&self) -> Value {
        self.as_ref().map(ToRaw::to_raw).unwrap_or(Value::Null)
    }
}

impl<T: ToRaw> ToRaw for Vec<T> {
    fn to_raw(&self) -> Value {
        Value::Array(self.iter().map(ToRaw::to_raw).collect())
    }
}

impl<K: RawKey, V: ToRaw> ToRaw for BTreeMap<K, V> {
    fn to_raw(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.raw_key(), v.to_raw()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl RawKey for String {
    fn raw_key(&self) -> String {
        self.clone()
    }
}

impl RawKey for i64 {
    fn raw_key(&self) -> String {
        self.to_string()
    }
}

impl RawKey for NaiveDate {
    fn raw_key(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }
}

/// Declare a record type together with its field-mapping table.
///
/// Each field reads `name: Type [= "sourceKey"] => converter [, default = expr];`.
/// The source key defaults to the field name.
#[macro_export]
macro_rules! record {
    (@key $field:ident) => { stringify!($field) };
    (@key $field:ident $key:literal) => { $key };
    (@default) => { None };
    (@default $default:expr) => { Some($default) };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty $(= $key:literal)? => $convert:path $(, default = $default:expr)?
            );* $(;)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::mapping::Record for $name {
            const NAME: &'static str = stringify!($name);

            const FIELDS: &'static [$crate::mapping::Field] = &[
                $(
                    $crate::mapping::Field {
                        name: stringify!($field),
                        key: $crate::record!(@key $field $($key)?),
                    },
                )*
            ];

            fn build(source: &$crate::mapping::Source) -> $crate::Result<Self> {
                Ok(Self {
                    $(
                        $field: source.field(
                            stringify!($field),
                            $crate::record!(@key $field $($key)?),
                            $convert,
                            $crate::record!(@default $($default)?),
                        )?,
                    )*
                })
            }

            fn value_of(&self, name: &str) -> Option<::serde_json::Value> {
                $(
                    if name == stringify!($field) {
                        return Some($crate::mapping::ToRaw::to_raw(&self.$field));
                    }
                )*
                None
            }
        }

        impl $crate::mapping::ToRaw for $name {
            fn to_raw(&self) -> ::serde_json::Value {
                let mut map = ::serde_json::Map::new();
                $(
                    map.insert(
                        $crate::record!(@key $field $($key)?).to_string(),
                        $crate::mapping::ToRaw::to_raw(&self.$field),
                    );
                )*
                ::serde_json::Value::Object(map)
            }
        }
    };
}

/// Build one nested record, accepting the canonical rendering of itself
pub fn nested<R: Record>(value: &Value) -> Result<R> {
    R::from_response(value)
}

/// List of nested records; `null` or an empty value becomes an empty list
pub fn nested_list<R: Record>(value: &Value) -> Result<Vec<R>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(R::from_response).collect(),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Err(Error::format(format!(
            "expected a list of {} records, got {other}",
            R::NAME
        ))),
    }
}

/// Object of nested aggregates; tolerates `null`, `[]` and `{}`
pub fn object_of(value: &Value, what: &str) -> Result<Option<Map<String, Value>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map.clone())),
        other => Err(Error::format(format!("{what} must be a mapping, got {other}"))),
    }
}
