//! Core types for perfdata.
//!
//! Benchmark logs carry measurement lines such as
//! `CILKPUB_DATA_POINT, 1.5, 4, fib, [n=30], [ok]`. This crate parses them
//! into [`DataPoint`]s, folds repeated observations into a [`DataSet`] under a
//! [`MergePolicy`], and compares two data sets in a [`DiffReport`].

pub mod dataset;
pub mod diagnostics;
pub mod parser;
pub mod point;
pub mod report;

// Re-export main types for convenience
pub use dataset::{DataSet, DataSetError};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use parser::{
    parse_data_point, parse_description_line, parse_file, parse_lines, parse_reader, parse_str,
    ParseError, ParseOptions, ParsedFile,
};
pub use point::{DataPoint, MergePolicy, PointKey, DATA_POINT_PREFIX};
pub use report::{
    DiffEntry, DiffReport, ReportError, Reporter, TerminalReporter, TextReporter, Thresholds,
};
