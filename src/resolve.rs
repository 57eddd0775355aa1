//! Field resolution
//!
//! Turns a record's declared fields into the list of keys the binder matches
//! against. A field's key is its `regex_group` annotation, or its own name.
//!
//! Collisions, walking fields in declaration order:
//! - annotated vs annotated: fatal, the first conflict is reported
//! - plain, then annotated: the annotated field takes over the slot
//! - annotated, then plain: the plain field is dropped

use std::fmt;

use tracing::debug;

use crate::error::RemarshalError;
use crate::record::{FieldDescriptor, FieldKind};

/// One bindable slot of the target record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalField {
    /// Declaration position (0-based)
    pub index: usize,
    pub name: String,
    pub key: String,
    pub key_explicit: bool,
    pub kind: FieldKind,
    pub writable: bool,
}

impl LogicalField {
    pub fn from_descriptor(index: usize, desc: &FieldDescriptor<'_>) -> Self {
        let (key, key_explicit) = match desc.annotation {
            Some(key) if !key.is_empty() => (key, true),
            _ => (desc.name, false),
        };
        Self {
            index,
            name: desc.name.to_string(),
            key: key.to_string(),
            key_explicit,
            kind: desc.kind,
            writable: desc.writable,
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} `{}`", self.index + 1, self.name, self.key)
    }
}

/// Resolve keys for every field, applying the collision rules above
pub fn resolve_fields(descriptors: &[FieldDescriptor<'_>]) -> Result<Vec<LogicalField>, RemarshalError> {
    let mut fields: Vec<LogicalField> = Vec::with_capacity(descriptors.len());

    for (index, desc) in descriptors.iter().enumerate() {
        let field = LogicalField::from_descriptor(index, desc);

        let Some(existing) = fields.iter_mut().find(|f| f.key == field.key) else {
            fields.push(field);
            continue;
        };

        match (existing.key_explicit, field.key_explicit) {
            (true, true) => {
                return Err(RemarshalError::DuplicateKey {
                    key: field.key,
                    first: existing.name.clone(),
                    second: field.name,
                });
            }
            (false, true) => {
                debug!(key = %field.key, superseded = %existing.name, by = %field.name, "annotated field takes over key");
                *existing = field;
            }
            // A plain field never shares a key with another plain field
            // unless the record declares the same name twice; first wins.
            (_, false) => {
                debug!(key = %field.key, dropped = %field.name, kept = %existing.name, "field shadowed by existing key");
            }
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(name: &'static str) -> FieldDescriptor<'static> {
        FieldDescriptor::new(name, FieldKind::String)
    }

    fn tagged(name: &'static str, key: &'static str) -> FieldDescriptor<'static> {
        plain(name).annotated(key)
    }

    fn keys(fields: &[LogicalField]) -> Vec<(&str, &str, bool)> {
        fields
            .iter()
            .map(|f| (f.name.as_str(), f.key.as_str(), f.key_explicit))
            .collect()
    }

    #[test]
    fn names_are_default_keys() {
        let fields = resolve_fields(&[plain("Host"), plain("Port")]).unwrap();
        assert_eq!(keys(&fields), [("Host", "Host", false), ("Port", "Port", false)]);
    }

    #[test]
    fn empty_annotation_counts_as_absent() {
        let fields = resolve_fields(&[tagged("Host", "")]).unwrap();
        assert_eq!(keys(&fields), [("Host", "Host", false)]);
    }

    #[test]
    fn annotated_field_supersedes_earlier_plain_one() {
        let fields = resolve_fields(&[
            tagged("One", "first"),
            plain("Two"),
            tagged("Three", "Two"),
            tagged("Four", "Three"),
        ])
        .unwrap();

        assert_eq!(
            keys(&fields),
            [
                ("One", "first", true),
                ("Three", "Two", true),
                ("Four", "Three", true),
            ]
        );
        // takes over the slot, keeps its own declaration index
        assert_eq!(fields[1].index, 2);
    }

    #[test]
    fn plain_field_after_annotated_one_is_dropped() {
        let fields = resolve_fields(&[tagged("Smth", "Something"), plain("Something")]).unwrap();
        assert_eq!(keys(&fields), [("Smth", "Something", true)]);
    }

    #[test]
    fn duplicate_annotations_are_fatal() {
        let err = resolve_fields(&[
            tagged("Something", "Something"),
            tagged("Smth", "Something"),
        ])
        .unwrap_err();

        match err {
            RemarshalError::DuplicateKey { key, first, second } => {
                assert_eq!(key, "Something");
                assert_eq!(first, "Something");
                assert_eq!(second, "Smth");
            }
            other => panic!("Expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn first_conflict_in_declaration_order_is_reported() {
        let err = resolve_fields(&[
            tagged("a", "x"),
            tagged("b", "y"),
            tagged("c", "y"),
            tagged("d", "x"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("`y`"));
        assert!(err.to_string().contains("`b`"));
        assert!(err.to_string().contains("`c`"));
    }

    #[test]
    fn carries_kind_and_writability() {
        let fields = resolve_fields(&[FieldDescriptor::new("n", FieldKind::U8).read_only()]).unwrap();
        assert_eq!(fields[0].kind, FieldKind::U8);
        assert!(!fields[0].writable);
        assert_eq!(fields[0].to_string(), "1. n `n`");
    }
}
