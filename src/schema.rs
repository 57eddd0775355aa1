//! Record schema files (YAML)
//!
//! Describes a [`DynamicRecord`] and, optionally, the pattern that feeds it:
//!
//! ```yaml
//! schema: remarshal/record@0.1
//! pattern: '^(?P<Host>[^:]+):(?P<Port>\d+)$'
//! fields:
//!   - name: host
//!     kind: string
//!     regex_group: Host
//!   - name: port
//!     kind: u16
//!     regex_group: Port
//!   - name: note
//!     kind: string
//!     readonly: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::RemarshalError;
use crate::record::{DynamicField, DynamicRecord, FieldKind};

/// Schema header this version understands
pub const SCHEMA_VERSION: &str = "remarshal/record@0.1";

static SCHEMA_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^remarshal/record@(\d+)\.(\d+)$").expect("valid header regex"));

/// Field kinds as spelled in schema files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
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
}

impl From<SchemaKind> for FieldKind {
    fn from(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::String => FieldKind::String,
            SchemaKind::Bool => FieldKind::Bool,
            SchemaKind::I8 => FieldKind::I8,
            SchemaKind::I16 => FieldKind::I16,
            SchemaKind::I32 => FieldKind::I32,
            SchemaKind::I64 => FieldKind::I64,
            SchemaKind::Isize => FieldKind::Isize,
            SchemaKind::U8 => FieldKind::U8,
            SchemaKind::U16 => FieldKind::U16,
            SchemaKind::U32 => FieldKind::U32,
            SchemaKind::U64 => FieldKind::U64,
            SchemaKind::Usize => FieldKind::Usize,
            SchemaKind::F32 => FieldKind::F32,
            SchemaKind::F64 => FieldKind::F64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    pub name: String,

    #[serde(default = "default_kind")]
    pub kind: SchemaKind,

    /// Explicit key; defaults to `name`
    #[serde(default)]
    pub regex_group: Option<String>,

    #[serde(default)]
    pub readonly: bool,
}

fn default_kind() -> SchemaKind {
    SchemaKind::String
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordSchema {
    pub schema: String,

    /// Named-group pattern; can be overridden on the command line
    #[serde(default)]
    pub pattern: Option<String>,

    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Parse and validate a schema document
    pub fn from_yaml(yaml: &str) -> Result<Self, RemarshalError> {
        let schema: RecordSchema = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RemarshalError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Header, version, and field list checks
    pub fn validate(&self) -> Result<(), RemarshalError> {
        let caps = SCHEMA_HEADER.captures(&self.schema).ok_or_else(|| {
            RemarshalError::Schema(format!(
                "invalid schema header: expected '{}', got '{}'",
                SCHEMA_VERSION, self.schema
            ))
        })?;
        if (&caps[1], &caps[2]) != ("0", "1") {
            return Err(RemarshalError::Schema(format!(
                "unsupported schema version '{}' (supported: '{}')",
                self.schema, SCHEMA_VERSION
            )));
        }

        if self.fields.is_empty() {
            return Err(RemarshalError::Schema("no fields declared".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(RemarshalError::Schema("field with empty name".to_string()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(RemarshalError::Schema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Compile the pattern, `override_pattern` first, then the schema's own
    pub fn compile_pattern(&self, override_pattern: Option<&str>) -> Result<Regex, RemarshalError> {
        let pattern = override_pattern
            .or(self.pattern.as_deref())
            .ok_or_else(|| {
                RemarshalError::Schema("no pattern: set `pattern:` or pass --pattern".to_string())
            })?;
        Ok(Regex::new(pattern)?)
    }

    /// A fresh record with every field at its zero value
    pub fn to_record(&self) -> DynamicRecord {
        DynamicRecord::new(
            self.fields
                .iter()
                .map(|f| DynamicField {
                    name: f.name.clone(),
                    kind: f.kind.into(),
                    annotation: f.regex_group.clone(),
                    writable: !f.readonly,
                })
                .collect(),
        )
    }
}
