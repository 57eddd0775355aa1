//! Worker - one resolve + split + reconcile pass, kept for inspection
//!
//! `Display` renders the whole pass (fields, values, leftovers), which is what
//! `remarshal explain` prints:
//!
//! ```text
//! * Overview:
//!     Text: first|second|third|X
//!     Pattern: ^(?P<first>.*)\|(?P<Two>.*)\|(?P<Three>.*)\|(?P<Last>.*)$
//!     Record: Line
//!
//! * Fields:
//!     1. one `first` => first
//!     3. three `Two` => second
//!     4. four `Three` => third
//!
//! * Extra groups:
//!     Last
//!
//! * Extra fields:
//! ```

use std::fmt;

use tracing::instrument;

use crate::bind::Plan;
use crate::error::{BindErrors, RemarshalError};
use crate::record::Record;
use crate::resolve::resolve_fields;
use crate::splitter::Splitter;

#[derive(Debug, Clone)]
pub struct Worker {
    text: String,
    pattern: Option<String>,
    record_type: &'static str,
    plan: Plan,
}

impl Worker {
    /// Resolve the record's fields, then split `text`.
    ///
    /// Fails on conflicting annotations or when the splitter fails; the
    /// record is only read.
    #[instrument(skip_all, fields(record = std::any::type_name::<R>()))]
    pub fn new<R, S>(text: &str, record: &R, splitter: &S) -> Result<Self, RemarshalError>
    where
        R: Record + ?Sized,
        S: Splitter + ?Sized,
    {
        let fields = resolve_fields(&record.fields())?;
        let extracted = splitter.extract(text)?;

        Ok(Self {
            text: text.to_string(),
            pattern: splitter.describe(),
            record_type: short_type_name(std::any::type_name::<R>()),
            plan: Plan::new(fields, extracted),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Assign the planned bindings to `record`
    pub fn apply<R: Record + ?Sized>(&self, record: &mut R) -> Result<(), BindErrors> {
        self.plan.apply(record)
    }
}

/// `my_crate::module::Line` -> `Line`, generics left alone
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* Overview:")?;
        writeln!(f, "\tText: {}", self.text)?;
        writeln!(f, "\tPattern: {}", self.pattern.as_deref().unwrap_or("(callback)"))?;
        writeln!(f, "\tRecord: {}", self.record_type)?;

        writeln!(f, "\n* Fields:")?;
        for field in self.plan.fields() {
            write!(f, "\t{}", field)?;
            if let Some(value) = self.plan.value_for(&field.key) {
                write!(f, " => {}", value.value)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n* Extra groups:")?;
        let groups: Vec<&str> = self.plan.extra_groups().collect();
        if !groups.is_empty() {
            writeln!(f, "\t{}", groups.join(", "))?;
        }

        writeln!(f, "\n* Extra fields:")?;
        for field in self.plan.extra_fields() {
            writeln!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitError;
    use crate::record::{DynamicField, DynamicRecord, FieldKind};
    use crate::splitter::from_fn;
    use regex::Regex;
    use std::collections::HashMap;

    fn line_record() -> DynamicRecord {
        DynamicRecord::new(vec![
            DynamicField::new("one", FieldKind::String).annotated("first"),
            DynamicField::new("Two", FieldKind::String),
            DynamicField::new("three", FieldKind::String).annotated("Two"),
            DynamicField::new("four", FieldKind::String).annotated("Three"),
        ])
    }

    #[test]
    fn renders_every_section() {
        let re = Regex::new(r"^(?P<first>.*)\|(?P<Two>.*)\|(?P<Three>.*)\|(?P<Last>.*)$").unwrap();
        let worker = Worker::new("first|second|third|X", &line_record(), &re).unwrap();

        let out = worker.to_string();
        assert!(out.contains("\tText: first|second|third|X\n"));
        assert!(out.contains(&format!("\tPattern: {}\n", re.as_str())));
        assert!(out.contains("\tRecord: DynamicRecord\n"));
        assert!(out.contains("\t1. one `first` => first\n"));
        assert!(out.contains("\t3. three `Two` => second\n"));
        assert!(out.contains("\t4. four `Three` => third\n"));
        assert!(!out.contains("2. Two"));
        assert!(out.contains("* Extra groups:\n\tLast\n"));
        assert!(out.ends_with("* Extra fields:\n"));
    }

    #[test]
    fn renders_extra_fields_and_callback() {
        let record = DynamicRecord::new(vec![
            DynamicField::new("host", FieldKind::String).annotated("Host"),
            DynamicField::new("port", FieldKind::String).annotated("Port"),
        ]);
        let splitter = from_fn(|s: &str| {
            Ok(HashMap::from([("Host".to_string(), s.to_string())]))
        });
        let worker = Worker::new("example.org", &record, &splitter).unwrap();

        let out = worker.to_string();
        assert!(out.contains("\tPattern: (callback)\n"));
        assert!(out.contains("* Extra fields:\n\t2. port `Port`\n"));
    }

    #[test]
    fn new_fails_before_touching_anything() {
        let record = line_record();
        let splitter = from_fn(|_: &str| Err(SplitError::custom("boom")));
        let err = Worker::new("x", &record, &splitter).unwrap_err();
        assert!(matches!(err, RemarshalError::Split(_)));
    }

    #[test]
    fn apply_binds_through_plan() {
        let re = Regex::new(r"^(?P<first>.*)\|(?P<Two>.*)\|(?P<Three>.*)\|(?P<Last>.*)$").unwrap();
        let mut record = line_record();
        let worker = Worker::new("first|second|third|X", &record, &re).unwrap();
        worker.apply(&mut record).unwrap();

        let json = record.to_json();
        assert_eq!(json["one"], "first");
        assert_eq!(json["Two"], "");
        assert_eq!(json["three"], "second");
        assert_eq!(json["four"], "third");
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name("a::b::Line"), "Line");
        assert_eq!(short_type_name("Line"), "Line");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }
}
