//! Binder - reconcile resolved fields with extracted values
//!
//! A [`Plan`] is computed once per call from the resolved fields and the
//! splitter output:
//! - bindings: field and value share a key
//! - extra fields: annotated fields with no value (errors)
//! - extra groups: values with no field (informational)
//!
//! [`Plan::apply`] then converts and assigns every binding, collecting all
//! failures instead of stopping at the first one.

use std::fmt;

use tracing::{debug, trace};

use crate::error::{BindError, BindErrors};
use crate::parse::{parse_bool, parse_float, parse_int, parse_uint};
use crate::record::{FieldKind, FieldValue, Record, SetFieldError};
use crate::resolve::LogicalField;
use crate::splitter::Extracted;

/// One key/value pair produced by a splitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValue {
    pub key: String,
    pub value: String,
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// A field paired with the value that will be assigned to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding<'a> {
    pub field: &'a LogicalField,
    pub value: &'a ExtractedValue,
}

impl fmt::Display for Binding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.field.name, self.value.value)
    }
}

/// Reconciliation of one field list against one splitter result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    fields: Vec<LogicalField>,
    /// Sorted by key so rendering and error order don't depend on hashing
    values: Vec<ExtractedValue>,
    /// (field index, value index), in field order
    bindings: Vec<(usize, usize)>,
    extra_fields: Vec<usize>,
    extra_groups: Vec<usize>,
}

impl Plan {
    pub fn new(fields: Vec<LogicalField>, extracted: Extracted) -> Self {
        let mut values: Vec<ExtractedValue> = extracted
            .into_iter()
            .map(|(key, value)| ExtractedValue { key, value })
            .collect();
        values.sort_by(|a, b| a.key.cmp(&b.key));

        let mut bindings = Vec::new();
        let mut extra_fields = Vec::new();
        for (fi, field) in fields.iter().enumerate() {
            match values.iter().position(|v| v.key == field.key) {
                Some(vi) => bindings.push((fi, vi)),
                None if field.key_explicit => extra_fields.push(fi),
                None => {}
            }
        }

        let extra_groups: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !fields.iter().any(|f| f.key == v.key))
            .map(|(vi, _)| vi)
            .collect();

        let plan = Self {
            fields,
            values,
            bindings,
            extra_fields,
            extra_groups,
        };
        {
            let extra_groups: Vec<&str> = plan.extra_groups().collect();
            debug!(
                fields = plan.fields.len(),
                values = plan.values.len(),
                bindings = plan.bindings.len(),
                extra_fields = plan.extra_fields.len(),
                ?extra_groups,
                "binding plan"
            );
        }
        plan
    }

    pub fn fields(&self) -> &[LogicalField] {
        &self.fields
    }

    pub fn values(&self) -> &[ExtractedValue] {
        &self.values
    }

    /// Extracted value for a key, if any
    pub fn value_for(&self, key: &str) -> Option<&ExtractedValue> {
        self.values.iter().find(|v| v.key == key)
    }

    pub fn bindings(&self) -> impl Iterator<Item = Binding<'_>> {
        self.bindings.iter().map(|&(fi, vi)| Binding {
            field: &self.fields[fi],
            value: &self.values[vi],
        })
    }

    /// Annotated fields whose key the splitter did not produce
    pub fn extra_fields(&self) -> impl Iterator<Item = &LogicalField> {
        self.extra_fields.iter().map(|&fi| &self.fields[fi])
    }

    /// Extracted keys no field asked for
    pub fn extra_groups(&self) -> impl Iterator<Item = &str> {
        self.extra_groups.iter().map(|&vi| self.values[vi].key.as_str())
    }

    /// Errors known before any assignment (one per extra field)
    pub fn extra_field_errors(&self) -> impl Iterator<Item = BindError> + '_ {
        self.extra_fields().map(|field| BindError::ExtraField {
            field: field.name.clone(),
            key: field.key.clone(),
        })
    }

    /// Assign every binding to `record`.
    ///
    /// Failing bindings are skipped and reported; the others still land.
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) -> Result<(), BindErrors> {
        let mut errors: BindErrors = self.extra_field_errors().collect();
        for binding in self.bindings() {
            if let Err(err) = assign(record, binding) {
                debug!(field = %binding.field.name, error = %err, "binding skipped");
                errors.push(err);
            }
        }
        errors.into_result()
    }
}

fn conversion(binding: Binding<'_>, target: &'static str) -> BindError {
    BindError::Conversion {
        field: binding.field.name.clone(),
        key: binding.value.key.clone(),
        value: binding.value.value.clone(),
        target,
    }
}

fn unsettable(binding: Binding<'_>) -> BindError {
    BindError::Unsettable {
        field: binding.field.name.clone(),
        value: binding.value.value.clone(),
    }
}

/// Numeric family named in conversion errors.
/// Unsigned fields say "int" too, matching the established message text.
fn conversion_target(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::F32 | FieldKind::F64 => "float",
        FieldKind::Bool => "bool",
        _ => "int",
    }
}

fn convert(binding: Binding<'_>) -> Result<FieldValue, BindError> {
    let raw = binding.value.value.as_str();
    let kind = binding.field.kind;
    let target = conversion_target(kind);

    match kind {
        FieldKind::String => Ok(FieldValue::Str(raw.to_string())),
        FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 | FieldKind::Isize => {
            parse_int(raw)
                .map(FieldValue::Int)
                .map_err(|_| conversion(binding, target))
        }
        FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 | FieldKind::Usize => {
            parse_uint(raw)
                .map(FieldValue::Uint)
                .map_err(|_| conversion(binding, target))
        }
        FieldKind::F32 | FieldKind::F64 => parse_float(raw)
            .map(FieldValue::Float)
            .map_err(|_| conversion(binding, target)),
        FieldKind::Bool => parse_bool(raw)
            .map(FieldValue::Bool)
            .map_err(|_| conversion(binding, target)),
        FieldKind::Unsupported(kind) => Err(BindError::UnknownKind {
            field: binding.field.name.clone(),
            kind: kind.to_string(),
            key: binding.value.key.clone(),
            value: binding.value.value.clone(),
        }),
    }
}

fn assign<R: Record + ?Sized>(record: &mut R, binding: Binding<'_>) -> Result<(), BindError> {
    if !binding.field.writable {
        return Err(unsettable(binding));
    }

    let value = convert(binding)?;
    trace!(field = %binding.field.name, value = %value, "assign");

    record
        .set_field(&binding.field.name, value)
        .map_err(|err| match err {
            // parsed fine at native width but doesn't fit the declared one
            SetFieldError::OutOfRange { .. } => {
                conversion(binding, conversion_target(binding.field.kind))
            }
            SetFieldError::UnknownField(_)
            | SetFieldError::ReadOnly { .. }
            | SetFieldError::KindMismatch { .. } => unsettable(binding),
        })
}
