//! remarshal - bind regex groups and splitter output onto typed record fields
//!
//! ```
//! use remarshal::{record, unmarshal};
//! use regex::Regex;
//!
//! #[derive(Debug, Default)]
//! struct Line {
//!     one: String,
//!     two: String,
//!     three: String,
//!     four: String,
//! }
//!
//! record!(Line {
//!     one = "first",
//!     two,            // key defaults to the field name
//!     three = "two",  // takes precedence over `two`
//!     four = "three",
//! });
//!
//! let re = Regex::new(r"^(?P<first>.*)\|(?P<two>.*)\|(?P<three>.*)\|(?P<last>.*)$").unwrap();
//! let mut line = Line::default();
//! unmarshal("first|second|third|... and so on", &mut line, &re).unwrap();
//!
//! assert_eq!(line.one, "first");
//! assert_eq!(line.two, "");
//! assert_eq!(line.three, "second");
//! assert_eq!(line.four, "third");
//! ```

pub mod bind;
pub mod error;
pub mod parse;
pub mod record;
pub mod resolve;
pub mod schema;
pub mod splitter;
pub mod worker;

use tracing::instrument;

pub use bind::{Binding, ExtractedValue, Plan};
pub use error::{BindError, BindErrors, FixSuggestion, RemarshalError, SplitError};
pub use record::{
    Bindable, DynamicField, DynamicRecord, FieldDescriptor, FieldKind, FieldValue, Record,
    SetFieldError, ANNOTATION,
};
pub use resolve::{resolve_fields, LogicalField};
pub use schema::RecordSchema;
pub use splitter::{from_fn, split, Extracted, FnSplitter, Splitter};
pub use worker::Worker;

/// Split `text` and bind the values onto `record`.
///
/// Fatal errors (conflicting annotations, splitter failure) leave `record`
/// untouched. Otherwise every binding that can succeed does, and the rest
/// come back together as [`RemarshalError::Bind`].
#[instrument(skip_all, fields(record = std::any::type_name::<R>()))]
pub fn unmarshal<R, S>(text: &str, record: &mut R, splitter: &S) -> Result<(), RemarshalError>
where
    R: Record + ?Sized,
    S: Splitter + ?Sized,
{
    let worker = Worker::new(text, &*record, splitter)?;
    worker.apply(record)?;
    Ok(())
}
