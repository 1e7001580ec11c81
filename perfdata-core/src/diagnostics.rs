//! Non-fatal anomalies collected while parsing, merging and diffing.
//!
//! Nothing in this crate aborts on malformed input. Every anomaly is turned
//! into a [`Diagnostic`], logged through `tracing` at the moment it is
//! recorded, and handed back to the caller in a [`Diagnostics`] list next to
//! the primary result.

use serde::Serialize;
use thiserror::Error;

/// A single anomaly observed while processing benchmark data.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A line had the shape of a data point but carried the wrong tag.
    #[error("line [{line}] matched, but prefix does not match")]
    PrefixMismatch { line: String },

    /// A line had the right shape but its time or P field is not numeric.
    #[error("line [{line}] has a malformed {field} field: {value:?}")]
    MalformedField {
        line: String,
        field: &'static str,
        value: String,
    },

    /// A point without a benchmark name was dropped.
    #[error("found invalid point: {point}")]
    InvalidPoint { point: String },

    /// Two points with different keys were asked to merge.
    #[error("trying to merge other point with key {incoming} into this point with key {existing}")]
    KeyMismatch { existing: String, incoming: String },

    /// The duplicate-warning policy saw a key twice.
    #[error("duplicate data point {key}: existing = {existing}, new = {incoming}")]
    DuplicatePoint {
        key: String,
        existing: String,
        incoming: String,
    },

    /// A file contained a second description that differs from the first.
    #[error("desc = {current}. Found another description {found}")]
    DescriptionConflict { current: String, found: String },

    /// Two data sets with different descriptions were merged.
    #[error("merging data set {theirs:?} into data set {ours:?}")]
    DescriptionMismatch { ours: String, theirs: String },

    /// A diff saw a non-positive average time on either side.
    #[error("suspicious data point {key} with btime = {baseline:.6}, ntime = {new:.6}")]
    SuspiciousTimes { key: String, baseline: f64, new: f64 },

    /// A key exists only in the new data set of a diff.
    #[error("new data point: {key}")]
    NewDataPoint { key: String },
}

impl Diagnostic {
    /// Emit this diagnostic as a `tracing` event at its natural level.
    fn log(&self) {
        match self {
            Diagnostic::KeyMismatch { .. } => tracing::error!("{}", self),
            Diagnostic::NewDataPoint { .. } => tracing::info!("{}", self),
            _ => tracing::warn!("{}", self),
        }
    }
}

/// An ordered list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, logging it immediately.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.entries.push(diagnostic);
    }

    /// Record the diagnostic if there is one.
    pub fn record(&mut self, diagnostic: Option<Diagnostic>) {
        if let Some(d) = diagnostic {
            self.push(d);
        }
    }

    /// Move all diagnostics from `other` to the end of this list.
    ///
    /// The moved entries were already logged when first recorded.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
