//! Configuration loading for perfdata.
//!
//! Supports loading configuration from TOML files, with defaults matching
//! the behavior of the command-line tools when no file is present.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use perfdata_core::parser::DEFAULT_DESCRIPTION_LABELS;
use perfdata_core::{MergePolicy, Thresholds, DATA_POINT_PREFIX};
use serde::{Deserialize, Serialize};

/// Top-level configuration for perfdata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for reading benchmark logs.
    pub parse: ParseConfig,
    /// Settings for comparing two runs.
    pub diff: DiffConfig,
    /// Settings for summarizing a single run.
    pub summarize: SummarizeConfig,
    /// Settings for terminal output.
    pub report: ReportConfig,
}

/// Configuration for reading benchmark logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Policy for points sharing a key within one filtered pass.
    pub merge_policy: MergePolicy,
    /// Labels recognized in `# label = value` description lines.
    pub description_labels: Vec<String>,
    /// Filter groups. Each group keeps the lines containing any of its
    /// strings; every group is parsed separately and the results summed.
    pub filters: Vec<Vec<String>>,
}

/// Configuration for comparing two runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Percent change flagged as a large slowdown or speedup.
    pub large_threshold: f64,
    /// Percent change reported at all.
    pub report_threshold: f64,
    /// Report file written when none is given on the command line.
    pub output: PathBuf,
}

/// Configuration for summarizing a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeConfig {
    /// How repeated observations are reduced.
    pub mode: SummaryMode,
    /// Output file used when none is given on the command line.
    pub output: PathBuf,
}

/// Configuration for terminal output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Whether to color terminal output.
    pub colors: bool,
}

/// Reduction applied by `summarize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Mean over all observations.
    #[default]
    Avg,
    /// Fastest observation.
    Min,
    /// Slowest observation.
    Max,
}

impl SummaryMode {
    /// Merge policy used while reading the log.
    pub fn policy(&self) -> MergePolicy {
        match self {
            SummaryMode::Avg => MergePolicy::Sum,
            SummaryMode::Min => MergePolicy::Min,
            SummaryMode::Max => MergePolicy::Max,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::Avg => "avg",
            SummaryMode::Min => "min",
            SummaryMode::Max => "max",
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::Sum,
            description_labels: DEFAULT_DESCRIPTION_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            filters: vec![vec![DATA_POINT_PREFIX.to_string()]],
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            large_threshold: 5.0,
            report_threshold: 1.0,
            output: PathBuf::from("perf_diff_output.txt"),
        }
    }
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            mode: SummaryMode::Avg,
            output: PathBuf::from("tmp_summary_output.dat"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { colors: true }
    }
}

impl DiffConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            large: self.large_threshold,
            report: self.report_threshold,
        }
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".perfdata.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_if_exists(path: &Path) -> Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}
