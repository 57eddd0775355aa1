//! Splitters turn a source string into `key → value` pairs
//!
//! Provided:
//! - [`regex::Regex`]: named capture groups become keys
//! - [`FnSplitter`]: any closure, for formats a regex handles badly
//!   (`host:port` with IPv6, quoted CSV, ...)
//!
//! Anything else can implement [`Splitter`] directly.

use std::collections::HashMap;

use regex::Regex;

use crate::error::SplitError;

/// Output of a splitter: key → raw string value
pub type Extracted = HashMap<String, String>;

/// Produces a key → value mapping from a source string.
///
/// The method is `extract` rather than `split` so it never shadows
/// [`Regex::split`].
pub trait Splitter {
    fn extract(&self, text: &str) -> Result<Extracted, SplitError>;

    /// Short description for rendering (the pattern, for regexes)
    fn describe(&self) -> Option<String> {
        None
    }
}

impl Splitter for Regex {
    /// Unnamed groups are skipped. A named group that did not take part in
    /// the match yields an empty string.
    fn extract(&self, text: &str) -> Result<Extracted, SplitError> {
        let captures = self.captures(text).ok_or(SplitError::NoMatch)?;
        Ok(self
            .capture_names()
            .flatten()
            .map(|name| {
                let value = captures.name(name).map_or("", |m| m.as_str());
                (name.to_string(), value.to_string())
            })
            .collect())
    }

    fn describe(&self) -> Option<String> {
        Some(self.as_str().to_string())
    }
}

/// Wraps a closure as a [`Splitter`]
pub struct FnSplitter<F>(pub F);

impl<F> Splitter for FnSplitter<F>
where
    F: Fn(&str) -> Result<Extracted, SplitError>,
{
    fn extract(&self, text: &str) -> Result<Extracted, SplitError> {
        (self.0)(text)
    }
}

/// Shorthand for `FnSplitter(f)`
pub fn from_fn<F>(f: F) -> FnSplitter<F>
where
    F: Fn(&str) -> Result<Extracted, SplitError>,
{
    FnSplitter(f)
}

impl<S: Splitter + ?Sized> Splitter for &S {
    fn extract(&self, text: &str) -> Result<Extracted, SplitError> {
        (**self).extract(text)
    }

    fn describe(&self) -> Option<String> {
        (**self).describe()
    }
}

impl<S: Splitter + ?Sized> Splitter for Box<S> {
    fn extract(&self, text: &str) -> Result<Extracted, SplitError> {
        (**self).extract(text)
    }

    fn describe(&self) -> Option<String> {
        (**self).describe()
    }
}

/// Run any splitter over `text`
pub fn split<S: Splitter + ?Sized>(text: &str, splitter: &S) -> Result<Extracted, SplitError> {
    splitter.extract(text)
}
