//! A single benchmark measurement and the rules for combining repeated ones.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};

/// Tag that must open every data point line.
pub const DATA_POINT_PREFIX: &str = "CILKPUB_DATA_POINT";

/// How two observations of the same experiment are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Add times and counts, concatenate outputs.
    #[default]
    Sum,
    /// Keep the observation with the smaller time.
    Min,
    /// Keep the observation with the larger time.
    Max,
    /// Keep the most recent observation.
    Last,
    /// Keep the first observation and report the duplicate.
    Warn,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Sum => "sum",
            MergePolicy::Min => "min",
            MergePolicy::Max => "max",
            MergePolicy::Last => "last",
            MergePolicy::Warn => "warn",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(MergePolicy::Sum),
            "min" => Ok(MergePolicy::Min),
            "max" => Ok(MergePolicy::Max),
            "last" => Ok(MergePolicy::Last),
            "warn" => Ok(MergePolicy::Warn),
            other => Err(format!(
                "unknown merge policy '{}' (expected sum, min, max, last or warn)",
                other
            )),
        }
    }
}

/// Identity of one experiment configuration.
///
/// Ordering is lexicographic over benchmark, input parameters, then P, which
/// is the order data sets are written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PointKey {
    pub benchmark: String,
    pub input_params: String,
    pub processors: u32,
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {:02}",
            self.benchmark, self.input_params, self.processors
        )
    }
}

/// One measurement, possibly the aggregate of several observations.
///
/// `time` holds a single run time when `count` is 1. After a sum merge it
/// holds the total over `count` observations, and `min_time`/`max_time` track
/// the extremes seen so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    benchmark: String,
    processors: u32,
    time: f64,
    input_params: String,
    output_data: String,
    count: u32,
    min_time: f64,
    max_time: f64,
}

impl DataPoint {
    /// Create a point for a single observation.
    pub fn new(
        benchmark: impl Into<String>,
        processors: u32,
        time: f64,
        input_params: impl Into<String>,
        output_data: impl Into<String>,
    ) -> Self {
        Self::with_count(benchmark, processors, time, input_params, output_data, 1)
    }

    /// Create a point that already stands for `count` observations.
    ///
    /// Surrounding whitespace is stripped from the text fields, as it is
    /// when a point is parsed from a line.
    pub fn with_count(
        benchmark: impl Into<String>,
        processors: u32,
        time: f64,
        input_params: impl Into<String>,
        output_data: impl Into<String>,
        count: u32,
    ) -> Self {
        Self {
            benchmark: trimmed(benchmark.into()),
            processors,
            time,
            input_params: trimmed(input_params.into()),
            output_data: trimmed(output_data.into()),
            count,
            min_time: time,
            max_time: time,
        }
    }

    pub fn benchmark(&self) -> &str {
        &self.benchmark
    }

    pub fn processors(&self) -> u32 {
        self.processors
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn input_params(&self) -> &str {
        &self.input_params
    }

    pub fn output_data(&self) -> &str {
        &self.output_data
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn key(&self) -> PointKey {
        PointKey {
            benchmark: self.benchmark.clone(),
            input_params: self.input_params.clone(),
            processors: self.processors,
        }
    }

    /// The key rendered as `bench, input_params, PP`.
    pub fn key_string(&self) -> String {
        format!(
            "{}, {}, {:02}",
            self.benchmark, self.input_params, self.processors
        )
    }

    fn same_key(&self, other: &DataPoint) -> bool {
        self.benchmark == other.benchmark
            && self.input_params == other.input_params
            && self.processors == other.processors
    }

    pub fn is_valid(&self) -> bool {
        !self.benchmark.is_empty()
    }

    /// Average time with the smallest and largest observation thrown out.
    ///
    /// Only the running total and the extremes are known, so this is
    /// `(total - min - max) / (count - 2)`. With exactly two observations the
    /// result is `total - max`, i.e. the smaller of the two.
    pub fn average_time_excluding_extremes(&self) -> f64 {
        match self.count {
            0 | 1 => self.time,
            2 => self.time - self.max_time,
            n => (self.time - (self.min_time + self.max_time)) / f64::from(n - 2),
        }
    }

    /// Divide the time by the count and reset the count to 1.
    pub fn compute_average(&mut self) -> &mut Self {
        if self.count > 0 {
            self.time /= f64::from(self.count);
            self.count = 1;
        }
        self
    }

    /// Replace time, min and max by the trimmed average and reset the count.
    pub fn compute_average_excluding_extremes(&mut self) -> &mut Self {
        if self.count > 0 {
            let avg = self.average_time_excluding_extremes();
            self.time = avg;
            self.min_time = avg;
            self.max_time = avg;
            self.count = 1;
        }
        self
    }

    /// Fold `other` into this point.
    ///
    /// The keys must match; otherwise nothing changes and a
    /// [`Diagnostic::KeyMismatch`] is returned. The duplicate-warning policy
    /// also returns a diagnostic. Min and max times are widened for every
    /// policy.
    pub fn merge(&mut self, other: DataPoint, policy: MergePolicy) -> Option<Diagnostic> {
        if !self.same_key(&other) {
            return Some(Diagnostic::KeyMismatch {
                existing: self.key_string(),
                incoming: other.key_string(),
            });
        }

        if other.min_time < self.min_time {
            self.min_time = other.min_time;
        }
        if other.max_time > self.max_time {
            self.max_time = other.max_time;
        }

        match policy {
            MergePolicy::Sum => {
                self.time += other.time;
                if !self.output_data.is_empty() && !other.output_data.is_empty() {
                    self.output_data.push_str(", ");
                }
                self.output_data.push_str(&other.output_data);
                self.count += other.count;
                None
            }
            MergePolicy::Min => {
                if other.time < self.time {
                    self.replace_observation(other);
                }
                None
            }
            MergePolicy::Max => {
                if other.time > self.time {
                    self.replace_observation(other);
                }
                None
            }
            MergePolicy::Last => {
                self.replace_observation(other);
                None
            }
            MergePolicy::Warn => Some(Diagnostic::DuplicatePoint {
                key: self.key_string(),
                existing: self.describe(),
                incoming: other.describe(),
            }),
        }
    }

    fn replace_observation(&mut self, other: DataPoint) {
        self.time = other.time;
        self.output_data = other.output_data;
        self.count = other.count;
    }

    /// Debug form: `bench, P, time, input_params, output_data, count`.
    pub fn describe(&self) -> String {
        format!(
            "{}, {}, {:.6}, {}, {}, {}",
            self.benchmark,
            self.processors,
            self.time,
            self.input_params,
            self.output_data,
            self.count
        )
    }

    /// The canonical data point line.
    pub fn to_line(&self) -> String {
        format!(
            "{}, {}, {}, {}, [{}], [{}]",
            DATA_POINT_PREFIX,
            format_time(self.time),
            self.processors,
            self.benchmark,
            self.input_params,
            self.output_data
        )
    }

    /// Recognize a canonical data point line.
    ///
    /// Lines that do not have the six-field shape yield `None` silently.
    /// Lines with the shape but a wrong tag or non-numeric fields yield `None`
    /// and a diagnostic. Text after the output bracket is ignored.
    pub fn parse_line(line: &str, diagnostics: &mut Diagnostics) -> Option<DataPoint> {
        let caps = data_point_pattern().captures(line)?;

        if caps["prefix"].trim() != DATA_POINT_PREFIX {
            diagnostics.push(Diagnostic::PrefixMismatch {
                line: line.to_string(),
            });
            return None;
        }

        let time_token = caps["time"].trim();
        let time = match time_token.parse::<f64>() {
            Ok(t) => t,
            Err(_) => {
                diagnostics.push(Diagnostic::MalformedField {
                    line: line.to_string(),
                    field: "time",
                    value: time_token.to_string(),
                });
                return None;
            }
        };

        let p_token = caps["p"].trim();
        let processors = match p_token.parse::<u32>() {
            Ok(p) => p,
            Err(_) => {
                diagnostics.push(Diagnostic::MalformedField {
                    line: line.to_string(),
                    field: "P",
                    value: p_token.to_string(),
                });
                return None;
            }
        };

        Some(DataPoint::new(
            caps["bench"].trim(),
            processors,
            time,
            caps["input"].trim(),
            caps["output"].trim(),
        ))
    }
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

fn data_point_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?P<prefix>[^,]+),\s*(?P<time>[^,]+),\s*(?P<p>[^,]+),\s*(?P<bench>[^,]+),\s*\[(?P<input>.*)\]\s*,\s*\[(?P<output>.*)\]\s*(.*)$",
        )
        .expect("data point pattern is a valid regex")
    })
}

/// Six decimals when that reads back exactly, otherwise the shortest exact form.
fn trimmed(field: String) -> String {
    if field.trim().len() == field.len() {
        field
    } else {
        field.trim().to_string()
    }
}

fn format_time(time: f64) -> String {
    let fixed = format!("{:.6}", time);
    if fixed.parse::<f64>() == Ok(time) {
        fixed
    } else {
        time.to_string()
    }
}
