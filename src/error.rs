//! Error types with fix suggestions
//!
//! Two layers:
//! - [`RemarshalError`]: fatal, returned alone, the record is left untouched
//!   (except for [`RemarshalError::Bind`], which wraps a completed pass)
//! - [`BindError`]: non-fatal, collected into [`BindErrors`] across the whole
//!   binding pass

use std::fmt;
use std::slice;

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Failure reported by a [`Splitter`](crate::Splitter)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("no match")]
    NoMatch,

    #[error("{0}")]
    Custom(String),
}

impl SplitError {
    /// Build a splitter error from any message (for callback splitters)
    pub fn custom(message: impl Into<String>) -> Self {
        SplitError::Custom(message.into())
    }
}

#[derive(Error, Debug)]
pub enum RemarshalError {
    // ─────────────────────────────────────────────────────────────
    // Binding errors
    // ─────────────────────────────────────────────────────────────
    #[error("key `{key}` can't point to both `{first}` and `{second}`")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("split failed: {0}")]
    Split(#[from] SplitError),

    #[error(transparent)]
    Bind(#[from] BindErrors),

    // ─────────────────────────────────────────────────────────────
    // Schema / configuration errors
    // ─────────────────────────────────────────────────────────────
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemarshalError {
    /// True when the record was not touched at all
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RemarshalError::Bind(_))
    }

    /// Non-fatal binding errors, if this is the aggregate variant
    pub fn bind_errors(&self) -> Option<&BindErrors> {
        match self {
            RemarshalError::Bind(errors) => Some(errors),
            _ => None,
        }
    }
}

impl FixSuggestion for RemarshalError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            RemarshalError::DuplicateKey { .. } => {
                Some("Give each annotated field its own regex_group")
            }
            RemarshalError::Split(SplitError::NoMatch) => {
                Some("Check the pattern against the input (anchors, separators)")
            }
            RemarshalError::Split(SplitError::Custom(_)) => None,
            RemarshalError::Bind(errors) => errors.first().and_then(|e| e.fix_suggestion()),
            RemarshalError::Schema(_) => {
                Some("Start the file with `schema: remarshal/record@0.1` and list fields")
            }
            RemarshalError::Pattern(_) => Some("Use named groups: (?P<name>...)"),
            RemarshalError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            RemarshalError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

/// One non-fatal error from a binding pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("field `{field}` annotated with `{key}` not found in extracted values")]
    ExtraField { field: String, key: String },

    #[error("cannot set value `{value}` for field `{field}`")]
    Unsettable { field: String, value: String },

    /// `target` is the numeric family named in the message.
    /// Unsigned fields report "int" as well.
    #[error("value `{value}` of key `{key}` cannot convert to {target} for field `{field}`")]
    Conversion {
        field: String,
        key: String,
        value: String,
        target: &'static str,
    },

    #[error("field `{field}` type `{kind}` unknown, cannot assign value `{value}` of key `{key}`")]
    UnknownKind {
        field: String,
        kind: String,
        key: String,
        value: String,
    },
}

impl BindError {
    /// Name of the record field this error is about
    pub fn field(&self) -> &str {
        match self {
            BindError::ExtraField { field, .. }
            | BindError::Unsettable { field, .. }
            | BindError::Conversion { field, .. }
            | BindError::UnknownKind { field, .. } => field,
        }
    }
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::ExtraField { .. } => {
                Some("Add the named group to the pattern or fix the field's regex_group")
            }
            BindError::Unsettable { .. } => Some("Make the field writable or drop its group"),
            BindError::Conversion { .. } => {
                Some("Tighten the group so it only captures values of the field's type")
            }
            BindError::UnknownKind { .. } => {
                Some("Use string, integer, float or bool fields for bound values")
            }
        }
    }
}

/// Aggregate of every [`BindError`] from one pass, in the order they occurred
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindErrors(Vec<BindError>);

impl BindErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: BindError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&BindError> {
        self.0.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, BindError> {
        self.0.iter()
    }

    pub fn errors(&self) -> &[BindError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<BindError> {
        self.0
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), BindErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for BindErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            1 => write!(f, "1 error occurred:")?,
            n => write!(f, "{} errors occurred:", n)?,
        }
        for error in &self.0 {
            write!(f, "\n\t* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindErrors {}

impl From<Vec<BindError>> for BindErrors {
    fn from(errors: Vec<BindError>) -> Self {
        BindErrors(errors)
    }
}

impl FromIterator<BindError> for BindErrors {
    fn from_iter<I: IntoIterator<Item = BindError>>(iter: I) -> Self {
        BindErrors(iter.into_iter().collect())
    }
}

impl Extend<BindError> for BindErrors {
    fn extend<I: IntoIterator<Item = BindError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for BindErrors {
    type Item = BindError;
    type IntoIter = std::vec::IntoIter<BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BindErrors {
    type Item = &'a BindError;
    type IntoIter = slice::Iter<'a, BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
