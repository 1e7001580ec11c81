//! Command-line interface for perfdata.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use perfdata_core::MergePolicy;

use crate::commands::OutputFormat;
use crate::config::{Config, SummaryMode, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(name = "perfdata")]
#[command(about = "Summarize and diff benchmark data points from run logs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Disable colored terminal output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge all data points with the same key in one log
    Summarize(SummarizeArgs),
    /// Compare the data points of two logs
    Diff(DiffArgs),
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Log file to summarize
    pub input: PathBuf,

    /// Output file; the mode is prefixed to its name
    pub output: Option<PathBuf>,

    /// How repeated observations are reduced
    #[arg(long, value_enum)]
    pub mode: Option<SummaryMode>,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Baseline log file
    pub base: PathBuf,

    /// New log file (defaults to comparing the baseline with itself)
    pub new: Option<PathBuf>,

    /// Report file to write
    pub output: Option<PathBuf>,

    /// Percent change flagged as a large slowdown or speedup
    #[arg(long)]
    pub large_threshold: Option<f64>,

    /// Percent change reported at all
    #[arg(long)]
    pub report_threshold: Option<f64>,

    /// Policy for repeated points within one log (sum, min, max, last, warn)
    #[arg(long)]
    pub merge_policy: Option<MergePolicy>,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only non-None optional values will override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if self.no_color {
            config.report.colors = false;
        }

        match &self.command {
            Command::Summarize(args) => {
                if let Some(mode) = args.mode {
                    config.summarize.mode = mode;
                }
                if let Some(output) = &args.output {
                    config.summarize.output = output.clone();
                }
            }
            Command::Diff(args) => {
                if let Some(large) = args.large_threshold {
                    config.diff.large_threshold = large;
                }
                if let Some(report) = args.report_threshold {
                    config.diff.report_threshold = report;
                }
                if let Some(policy) = args.merge_policy {
                    config.parse.merge_policy = policy;
                }
                if let Some(output) = &args.output {
                    config.diff.output = output.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summarize_minimal() {
        let cli = Cli::parse_from(["perfdata", "summarize", "run.log"]);

        let Command::Summarize(args) = &cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(args.input, PathBuf::from("run.log"));
        assert!(args.output.is_none());
        assert!(args.mode.is_none());
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(cli.config, PathBuf::from(".perfdata.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_summarize_full() {
        let cli = Cli::parse_from([
            "perfdata",
            "summarize",
            "run.log",
            "out.dat",
            "--mode",
            "min",
            "--format",
            "json",
            "--verbose",
        ]);

        let Command::Summarize(args) = &cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(args.output, Some(PathBuf::from("out.dat")));
        assert_eq!(args.mode, Some(SummaryMode::Min));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_diff() {
        let cli = Cli::parse_from([
            "perfdata",
            "diff",
            "base.log",
            "new.log",
            "report.txt",
            "--large-threshold",
            "10",
            "--merge-policy",
            "min",
            "--no-color",
        ]);

        let Command::Diff(args) = &cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.base, PathBuf::from("base.log"));
        assert_eq!(args.new, Some(PathBuf::from("new.log")));
        assert_eq!(args.output, Some(PathBuf::from("report.txt")));
        assert_eq!(args.large_threshold, Some(10.0));
        assert_eq!(args.report_threshold, None);
        assert_eq!(args.merge_policy, Some(MergePolicy::Min));
        assert!(cli.no_color);
    }

    #[test]
    fn test_parse_diff_rejects_unknown_policy() {
        let result = Cli::try_parse_from(["perfdata", "diff", "base.log", "--merge-policy", "median"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_to_config_diff_overrides() {
        let cli = Cli::parse_from([
            "perfdata",
            "diff",
            "base.log",
            "new.log",
            "report.txt",
            "--report-threshold",
            "0.5",
            "--no-color",
        ]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(config.diff.report_threshold, 0.5);
        assert_eq!(config.diff.large_threshold, 5.0); // Default unchanged
        assert_eq!(config.diff.output, PathBuf::from("report.txt"));
        assert!(!config.report.colors);
    }

    #[test]
    fn test_apply_to_config_summarize_overrides() {
        let cli = Cli::parse_from(["perfdata", "summarize", "run.log", "--mode", "max"]);

        let mut config = Config::default();
        cli.apply_to_config(&mut config);

        assert_eq!(config.summarize.mode, SummaryMode::Max);
        assert_eq!(config.summarize.output, PathBuf::from("tmp_summary_output.dat"));
        assert!(config.report.colors);
    }
}
