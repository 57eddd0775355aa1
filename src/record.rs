//! Target records
//!
//! A [`Record`] exposes its shape (field names, kinds, annotations) and a
//! typed setter. Two ways to get one:
//! - [`record!`](crate::record!) registers a plain struct at compile time
//! - [`DynamicRecord`] is built at runtime (from a schema file)
//!
//! ```
//! use remarshal::{record, unmarshal};
//! use regex::Regex;
//!
//! #[derive(Debug, Default)]
//! struct Conn {
//!     host: String,
//!     port: u16,
//! }
//!
//! record!(Conn {
//!     host = "Host",
//!     port = "Port",
//! });
//!
//! let re = Regex::new(r"^(?P<Host>[^:]+):(?P<Port>\d+)$").unwrap();
//! let mut conn = Conn::default();
//! unmarshal("localhost:12345", &mut conn, &re).unwrap();
//! assert_eq!(conn.port, 12345);
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Field annotation name. In `record!` it is written `field = "key"`,
/// in schema files `regex_group: key`.
pub const ANNOTATION: &str = "regex_group";

/// Declared value kind of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    /// A type with no string conversion; the name is reported in errors
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match *self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::I8 => "i8",
            FieldKind::I16 => "i16",
            FieldKind::I32 => "i32",
            FieldKind::I64 => "i64",
            FieldKind::Isize => "isize",
            FieldKind::U8 => "u8",
            FieldKind::U16 => "u16",
            FieldKind::U32 => "u32",
            FieldKind::U64 => "u64",
            FieldKind::Usize => "usize",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Unsupported(name) => name,
        }
    }

    /// Value a field of this kind holds before anything is bound
    pub fn zero(&self) -> Option<FieldValue> {
        match self {
            FieldKind::String => Some(FieldValue::Str(String::new())),
            FieldKind::Bool => Some(FieldValue::Bool(false)),
            FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 | FieldKind::Isize => {
                Some(FieldValue::Int(0))
            }
            FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 | FieldKind::Usize => {
                Some(FieldValue::Uint(0))
            }
            FieldKind::F32 | FieldKind::F64 => Some(FieldValue::Float(0.0)),
            FieldKind::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted value on its way into a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "int",
            FieldValue::Uint(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Uint(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Why a record refused a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetFieldError {
    #[error("no field named `{0}`")]
    UnknownField(String),

    #[error("field `{field}` is read-only")]
    ReadOnly { field: String },

    #[error("field `{field}` expects {expected}, got {got}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("value out of range for field `{field}` ({kind})")]
    OutOfRange { field: String, kind: &'static str },
}

/// Shape of one field as declared by the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor<'a> {
    pub name: &'a str,
    pub kind: FieldKind,
    /// `regex_group` annotation, if any. Empty counts as absent.
    pub annotation: Option<&'a str>,
    pub writable: bool,
}

impl<'a> FieldDescriptor<'a> {
    pub fn new(name: &'a str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            annotation: None,
            writable: true,
        }
    }

    pub fn annotated(mut self, key: &'a str) -> Self {
        self.annotation = Some(key);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

/// Something values can be bound onto
pub trait Record {
    /// Fields in declaration order
    fn fields(&self) -> Vec<FieldDescriptor<'_>>;

    /// Store an already converted value into the named field
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetFieldError>;
}

/// Rust types that can sit in a record field
pub trait Bindable: Sized {
    const KIND: FieldKind;

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError>;
}

/// Kind of a field, inferred from its value (used by `record!`)
pub fn kind_of<T: Bindable>(_: &T) -> FieldKind {
    T::KIND
}

fn mismatch(field: &str, expected: FieldKind, got: &FieldValue) -> SetFieldError {
    SetFieldError::KindMismatch {
        field: field.to_string(),
        expected: expected.name(),
        got: got.type_name(),
    }
}

impl Bindable for String {
    const KIND: FieldKind = FieldKind::String;

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        match value {
            FieldValue::Str(s) => Ok(s),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl Bindable for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

macro_rules! bindable_int {
    ($($ty:ty => $kind:ident, $variant:ident;)*) => {$(
        impl Bindable for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
                match value {
                    FieldValue::$variant(n) => <$ty>::try_from(n).map_err(|_| {
                        SetFieldError::OutOfRange {
                            field: field.to_string(),
                            kind: Self::KIND.name(),
                        }
                    }),
                    other => Err(mismatch(field, Self::KIND, &other)),
                }
            }
        }
    )*};
}

bindable_int! {
    i8 => I8, Int;
    i16 => I16, Int;
    i32 => I32, Int;
    i64 => I64, Int;
    isize => Isize, Int;
    u8 => U8, Uint;
    u16 => U16, Uint;
    u32 => U32, Uint;
    u64 => U64, Uint;
    usize => Usize, Uint;
}

impl Bindable for f64 {
    const KIND: FieldKind = FieldKind::F64;

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        match value {
            FieldValue::Float(x) => Ok(x),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl Bindable for f32 {
    const KIND: FieldKind = FieldKind::F32;

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        match value {
            // Narrowed like any f64 -> f32 store: rounding, overflow goes to inf
            FieldValue::Float(x) => Ok(x as f32),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl Bindable for char {
    const KIND: FieldKind = FieldKind::Unsupported("char");

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        Err(mismatch(field, Self::KIND, &value))
    }
}

impl<T> Bindable for Vec<T> {
    const KIND: FieldKind = FieldKind::Unsupported("vec");

    fn from_value(value: FieldValue, field: &str) -> Result<Self, SetFieldError> {
        Err(mismatch(field, Self::KIND, &value))
    }
}

/// Implement [`Record`] for a struct with named fields.
///
/// Each entry is a field name, optionally followed by `= "key"` to set its
/// `regex_group` annotation, and optionally preceded by `#[readonly]` to
/// refuse writes.
///
/// ```
/// #[derive(Default)]
/// struct Line {
///     one: String,
///     two: String,
///     three: String,
///     count: u32,
/// }
///
/// remarshal::record!(Line {
///     one = "first",
///     two,
///     three = "Two",
///     #[readonly]
///     count,
/// });
/// ```
#[macro_export]
macro_rules! record {
    (@key) => {
        ::core::option::Option::None
    };
    (@key $key:literal) => {
        ::core::option::Option::Some($key)
    };
    (@writable) => {
        true
    };
    (@writable readonly) => {
        false
    };
    ($ty:ty { $( $(#[$flag:ident])? $field:ident $(= $key:literal)? ),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn fields(&self) -> ::std::vec::Vec<$crate::FieldDescriptor<'_>> {
                ::std::vec![$(
                    $crate::FieldDescriptor {
                        name: ::core::stringify!($field),
                        kind: $crate::record::kind_of(&self.$field),
                        annotation: $crate::record!(@key $($key)?),
                        writable: $crate::record!(@writable $($flag)?),
                    }
                ),*]
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::FieldValue,
            ) -> ::core::result::Result<(), $crate::SetFieldError> {
                match name {
                    $(
                        ::core::stringify!($field) => {
                            if !$crate::record!(@writable $($flag)?) {
                                return ::core::result::Result::Err(
                                    $crate::SetFieldError::ReadOnly { field: name.to_string() },
                                );
                            }
                            self.$field = $crate::Bindable::from_value(value, name)?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => ::core::result::Result::Err(
                        $crate::SetFieldError::UnknownField(name.to_string()),
                    ),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────
// Runtime records
// ─────────────────────────────────────────────────────────────

/// Field declaration for a [`DynamicRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicField {
    pub name: String,
    pub kind: FieldKind,
    pub annotation: Option<String>,
    pub writable: bool,
}

impl DynamicField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            writable: true,
        }
    }

    pub fn annotated(mut self, key: impl Into<String>) -> Self {
        self.annotation = Some(key.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

/// A record whose shape is only known at runtime.
/// Every field starts at its kind's zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    fields: Vec<DynamicField>,
    values: Vec<Option<FieldValue>>,
}

impl DynamicRecord {
    pub fn new(fields: Vec<DynamicField>) -> Self {
        let values = fields.iter().map(|f| f.kind.zero()).collect();
        Self { fields, values }
    }

    /// Current value of a field (`None` for unknown fields and unsupported kinds)
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let index = self.position(name)?;
        self.values[index].as_ref()
    }

    /// `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.fields
            .iter()
            .zip(&self.values)
            .map(|(field, value)| (field.name.as_str(), value.as_ref()))
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in self.iter() {
            let value = value
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null);
            map.insert(name.to_string(), value);
        }
        Value::Object(map)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Check a value against a kind, narrowing it the way a typed field would
fn coerce(kind: FieldKind, value: FieldValue, field: &str) -> Result<FieldValue, SetFieldError> {
    Ok(match kind {
        FieldKind::String => FieldValue::Str(String::from_value(value, field)?),
        FieldKind::Bool => FieldValue::Bool(bool::from_value(value, field)?),
        FieldKind::I8 => FieldValue::Int(i8::from_value(value, field)?.into()),
        FieldKind::I16 => FieldValue::Int(i16::from_value(value, field)?.into()),
        FieldKind::I32 => FieldValue::Int(i32::from_value(value, field)?.into()),
        FieldKind::I64 => FieldValue::Int(i64::from_value(value, field)?),
        FieldKind::Isize => FieldValue::Int(isize::from_value(value, field)? as i64),
        FieldKind::U8 => FieldValue::Uint(u8::from_value(value, field)?.into()),
        FieldKind::U16 => FieldValue::Uint(u16::from_value(value, field)?.into()),
        FieldKind::U32 => FieldValue::Uint(u32::from_value(value, field)?.into()),
        FieldKind::U64 => FieldValue::Uint(u64::from_value(value, field)?),
        FieldKind::Usize => FieldValue::Uint(usize::from_value(value, field)? as u64),
        FieldKind::F32 => FieldValue::Float(f32::from_value(value, field)?.into()),
        FieldKind::F64 => FieldValue::Float(f64::from_value(value, field)?),
        FieldKind::Unsupported(_) => return Err(mismatch(field, kind, &value)),
    })
}

impl Record for DynamicRecord {
    fn fields(&self) -> Vec<FieldDescriptor<'_>> {
        self.fields
            .iter()
            .map(|f| FieldDescriptor {
                name: &f.name,
                kind: f.kind,
                annotation: f.annotation.as_deref(),
                writable: f.writable,
            })
            .collect()
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), SetFieldError> {
        let index = self
            .position(name)
            .ok_or_else(|| SetFieldError::UnknownField(name.to_string()))?;
        let field = &self.fields[index];
        if !field.writable {
            return Err(SetFieldError::ReadOnly {
                field: name.to_string(),
            });
        }
        self.values[index] = Some(coerce(field.kind, value, name)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        name: String,
        small: i8,
        ratio: f32,
        hidden: String,
        tags: Vec<String>,
    }

    crate::record!(Sample {
        name = "Name",
        small,
        ratio,
        #[readonly]
        hidden,
        tags,
    });

    #[test]
    fn macro_describes_fields_in_order() {
        let sample = Sample::default();
        let fields = sample.fields();

        let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["name", "small", "ratio", "hidden", "tags"]);

        assert_eq!(fields[0].annotation, Some("Name"));
        assert_eq!(fields[1].annotation, None);
        assert_eq!(fields[1].kind, FieldKind::I8);
        assert_eq!(fields[2].kind, FieldKind::F32);
        assert!(!fields[3].writable);
        assert_eq!(fields[4].kind, FieldKind::Unsupported("vec"));
    }

    #[test]
    fn macro_setter_assigns_typed_values() {
        let mut sample = Sample::default();
        sample
            .set_field("name", FieldValue::Str("alpha".to_string()))
            .unwrap();
        sample.set_field("small", FieldValue::Int(-5)).unwrap();
        sample.set_field("ratio", FieldValue::Float(0.5)).unwrap();

        assert_eq!(sample.name, "alpha");
        assert_eq!(sample.small, -5);
        assert_eq!(sample.ratio, 0.5);
    }

    #[test]
    fn macro_setter_refuses_bad_writes() {
        let mut sample = Sample::default();

        let err = sample.set_field("small", FieldValue::Int(300)).unwrap_err();
        assert!(matches!(err, SetFieldError::OutOfRange { .. }));
        assert_eq!(sample.small, 0);

        let err = sample
            .set_field("hidden", FieldValue::Str("x".to_string()))
            .unwrap_err();
        assert!(matches!(err, SetFieldError::ReadOnly { .. }));

        let err = sample.set_field("name", FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, SetFieldError::KindMismatch { .. }));

        let err = sample.set_field("nope", FieldValue::Int(1)).unwrap_err();
        assert_eq!(err, SetFieldError::UnknownField("nope".to_string()));
    }

    #[test]
    fn dynamic_record_starts_at_zero_values() {
        let record = DynamicRecord::new(vec![
            DynamicField::new("host", FieldKind::String),
            DynamicField::new("port", FieldKind::U16),
            DynamicField::new("secure", FieldKind::Bool),
        ]);

        assert_eq!(record.get("host"), Some(&FieldValue::Str(String::new())));
        assert_eq!(record.get("port"), Some(&FieldValue::Uint(0)));
        assert_eq!(record.get("secure"), Some(&FieldValue::Bool(false)));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn dynamic_record_narrows_like_typed_fields() {
        let mut record = DynamicRecord::new(vec![
            DynamicField::new("port", FieldKind::U16),
            DynamicField::new("note", FieldKind::String).read_only(),
        ]);

        record.set_field("port", FieldValue::Uint(8080)).unwrap();
        assert_eq!(record.get("port"), Some(&FieldValue::Uint(8080)));

        let err = record.set_field("port", FieldValue::Uint(70_000)).unwrap_err();
        assert!(matches!(err, SetFieldError::OutOfRange { kind: "u16", .. }));
        assert_eq!(record.get("port"), Some(&FieldValue::Uint(8080)));

        let err = record
            .set_field("note", FieldValue::Str("x".to_string()))
            .unwrap_err();
        assert!(matches!(err, SetFieldError::ReadOnly { .. }));
    }

    #[test]
    fn dynamic_record_descriptors_carry_annotations() {
        let record = DynamicRecord::new(vec![
            DynamicField::new("host", FieldKind::String).annotated("Host"),
            DynamicField::new("port", FieldKind::U16),
        ]);
        let fields = record.fields();
        assert_eq!(fields[0], FieldDescriptor::new("host", FieldKind::String).annotated("Host"));
        assert_eq!(fields[1], FieldDescriptor::new("port", FieldKind::U16));
    }

    #[test]
    fn dynamic_record_to_json() {
        let mut record = DynamicRecord::new(vec![
            DynamicField::new("host", FieldKind::String),
            DynamicField::new("port", FieldKind::U16),
        ]);
        record
            .set_field("host", FieldValue::Str("localhost".to_string()))
            .unwrap();
        record.set_field("port", FieldValue::Uint(12345)).unwrap();

        assert_eq!(
            record.to_json(),
            serde_json::json!({"host": "localhost", "port": 12345})
        );
    }
}
