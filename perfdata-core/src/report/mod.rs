use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::dataset::DataSet;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::point::PointKey;

/// Percent difference substituted when either side has a non-positive time.
///
/// Large enough to land such entries in every section of the report.
pub const SUSPICIOUS_PERCENT_DIFF: f64 = 1e300;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Percent-change limits used to sort entries into report sections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Changes at least this large (either direction) count as slower/faster.
    pub large: f64,
    /// Changes at least this large (absolute) are listed as changed.
    pub report: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            large: 5.0,
            report: 1.0,
        }
    }
}

/// One key present in both data sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub key: PointKey,
    /// Row label, `bench, input_params, PP`.
    pub label: String,
    /// Trimmed average time of the baseline point.
    pub baseline_time: f64,
    /// Trimmed average time of the new point.
    pub new_time: f64,
    pub percent_diff: f64,
    /// Either time was non-positive and `percent_diff` is the sentinel.
    pub suspicious: bool,
}

/// Comparison of a new data set against a baseline.
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub baseline_description: String,
    pub new_description: String,
    pub thresholds: Thresholds,
    /// Compared entries in ascending key order.
    pub entries: Vec<DiffEntry>,
    /// Keys found only in the new data set.
    pub new_points: Vec<PointKey>,
    pub diagnostics: Diagnostics,
}

impl DiffReport {
    /// Compare every key of `new` against `baseline`.
    ///
    /// Keys missing from `new` are not visited. Keys missing from `baseline`
    /// are listed in `new_points` and left out of every section.
    pub fn compare(baseline: &DataSet, new: &DataSet, thresholds: Thresholds) -> Self {
        let mut diagnostics = Diagnostics::new();
        let mut entries = Vec::new();
        let mut new_points = Vec::new();

        for (key, n) in new {
            let Some(b) = baseline.get(key) else {
                diagnostics.push(Diagnostic::NewDataPoint {
                    key: n.key_string(),
                });
                new_points.push(key.clone());
                continue;
            };

            let baseline_time = b.average_time_excluding_extremes();
            let new_time = n.average_time_excluding_extremes();

            let suspicious = !(baseline_time > 0.0 && new_time > 0.0);
            let percent_diff = if suspicious {
                diagnostics.push(Diagnostic::SuspiciousTimes {
                    key: b.key_string(),
                    baseline: baseline_time,
                    new: new_time,
                });
                SUSPICIOUS_PERCENT_DIFF
            } else {
                (new_time - baseline_time) * 100.0 / baseline_time
            };

            entries.push(DiffEntry {
                key: key.clone(),
                label: b.key_string(),
                baseline_time,
                new_time,
                percent_diff,
                suspicious,
            });
        }

        Self {
            baseline_description: baseline.description().to_string(),
            new_description: new.description().to_string(),
            thresholds,
            entries,
            new_points,
            diagnostics,
        }
    }

    /// Entries that got slower by at least the large threshold.
    pub fn slower(&self) -> impl Iterator<Item = &DiffEntry> {
        let large = self.thresholds.large;
        self.entries.iter().filter(move |e| e.percent_diff >= large)
    }

    /// Entries that got faster by at least the large threshold.
    pub fn faster(&self) -> impl Iterator<Item = &DiffEntry> {
        let large = self.thresholds.large;
        self.entries
            .iter()
            .filter(move |e| e.percent_diff < large && e.percent_diff <= -large)
    }

    /// Entries whose change is at least the report threshold either way.
    pub fn changed(&self) -> impl Iterator<Item = &DiffEntry> {
        let report = self.thresholds.report;
        self.entries
            .iter()
            .filter(move |e| e.percent_diff.abs() >= report)
    }
}

/// Renders a [`DiffReport`].
pub trait Reporter: Send + Sync {
    fn report(&self, report: &DiffReport, writer: &mut dyn Write) -> Result<(), ReportError>;

    /// Render to standard output.
    fn report_to_stdout(&self, report: &DiffReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.report(report, &mut writer)
    }
}

mod format;
mod terminal;
mod text;

pub use format::format_g;
pub use terminal::TerminalReporter;
pub use text::TextReporter;
