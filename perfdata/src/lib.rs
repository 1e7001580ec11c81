//! perfdata: merge and compare benchmark data points from run logs
//!
//! This library drives the `summarize` and `diff` commands on top of
//! `perfdata-core`, adding configuration, substring pre-filtering and the
//! command-line surface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;

// Re-export core types for convenience
pub use perfdata_core::{
    DataPoint, DataSet, Diagnostic, Diagnostics, DiffReport, MergePolicy, ParseOptions,
    ParsedFile, PointKey, Reporter, TerminalReporter, TextReporter, Thresholds,
};

// Re-export main types from this crate
pub use cli::Cli;
pub use commands::{diff, load_filtered, summarize, Comparison, OutputFormat, Summary};
pub use config::{Config, SummaryMode};
pub use filter::LineFilter;
