//! The `summarize` and `diff` drivers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use perfdata_core::{
    parse_file, parse_lines, DataSet, DiffReport, Diagnostics, MergePolicy, ParseOptions,
    ParsedFile, TextReporter, Thresholds,
};

use crate::config::{ParseConfig, SummaryMode};
use crate::filter::LineFilter;

/// Output encoding for `summarize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Canonical data point lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Result of summarizing one log.
#[derive(Debug)]
pub struct Summary {
    /// Where the summary was written.
    pub output_path: PathBuf,
    pub data_set: DataSet,
    pub diagnostics: Diagnostics,
}

/// Insert `<mode>_` in front of the file name of `path`.
pub fn mode_prefixed_path(path: &Path, mode: SummaryMode) -> PathBuf {
    match path.file_name() {
        Some(name) => path.with_file_name(format!("{}_{}", mode, name.to_string_lossy())),
        None => PathBuf::from(format!("{}_{}", mode, path.display())),
    }
}

/// Merge repeated observations in `input` and write one line per key.
///
/// Every point ends up averaged over its observations, so for `min` and
/// `max` this is the kept observation itself. The output lands next to
/// `output`, with the mode prefixed to its file name.
pub fn summarize(
    input: &Path,
    output: &Path,
    mode: SummaryMode,
    format: OutputFormat,
    parse_config: &ParseConfig,
) -> Result<Summary> {
    let default_description = mode_prefixed_path(input, mode).display().to_string();
    let output_path = mode_prefixed_path(output, mode);

    tracing::info!(input = %input.display(), output = %output_path.display(), %mode, "summarizing");

    let options = ParseOptions {
        policy: mode.policy(),
        default_description,
        compute_average: true,
        description_labels: parse_config.description_labels.clone(),
    };
    let ParsedFile {
        data_set,
        diagnostics,
    } = parse_file(input, &options)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    match format {
        OutputFormat::Text => data_set
            .save(&output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?,
        OutputFormat::Json => {
            let json = data_set.to_json_pretty()?;
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
        }
    }

    Ok(Summary {
        output_path,
        data_set,
        diagnostics,
    })
}

/// Read `path` through every filter group and sum the results.
///
/// Each group is parsed on its own with the path as default description,
/// then merged into the data set of the earlier groups. Invalid UTF-8 is
/// replaced, not rejected.
pub fn load_filtered(path: &Path, parse_config: &ParseConfig) -> Result<ParsedFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let description = path.display().to_string();

    let options = ParseOptions {
        policy: parse_config.merge_policy,
        default_description: description.clone(),
        compute_average: false,
        description_labels: parse_config.description_labels.clone(),
    };

    let mut data_set: Option<DataSet> = None;
    let mut diagnostics = Diagnostics::new();

    for group in &parse_config.filters {
        let filter = LineFilter::new(group.iter().cloned());
        tracing::debug!(path = %path.display(), patterns = ?filter.patterns(), "filtering");

        let parsed = parse_lines(filter.apply(&text), &options);
        diagnostics.extend(parsed.diagnostics);

        match data_set.as_mut() {
            Some(existing) => existing.merge(parsed.data_set, MergePolicy::Sum, &mut diagnostics),
            None => data_set = Some(parsed.data_set),
        }
    }

    let data_set = data_set.unwrap_or_else(|| DataSet::new(description));
    tracing::info!(path = %path.display(), points = data_set.len(), "loaded data set");

    Ok(ParsedFile {
        data_set,
        diagnostics,
    })
}

/// Result of comparing two logs.
#[derive(Debug)]
pub struct Comparison {
    pub baseline: DataSet,
    pub new: DataSet,
    pub report: DiffReport,
    /// Diagnostics from loading both inputs. The report carries its own.
    pub diagnostics: Diagnostics,
}

/// Compare `new` against `base` and write the text report to `output`.
///
/// Without `new`, the base log is compared against itself.
pub fn diff(
    base: &Path,
    new: Option<&Path>,
    output: &Path,
    thresholds: Thresholds,
    parse_config: &ParseConfig,
) -> Result<Comparison> {
    let baseline = load_filtered(base, parse_config)?;
    let mut diagnostics = baseline.diagnostics;
    let baseline = baseline.data_set;

    let new = match new {
        Some(path) => {
            let parsed = load_filtered(path, parse_config)?;
            diagnostics.extend(parsed.diagnostics);
            parsed.data_set
        }
        None => baseline.clone(),
    };

    let report = DiffReport::compare(&baseline, &new, thresholds);
    let dropped = baseline.keys().filter(|key| !new.contains_key(key)).count();
    if dropped > 0 {
        tracing::debug!(dropped, "baseline points absent from the new run");
    }
    TextReporter::new()
        .write_file(&report, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(output = %output.display(), entries = report.entries.len(), "wrote diff report");

    Ok(Comparison {
        baseline,
        new,
        report,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mode_prefixed_path() {
        assert_eq!(
            mode_prefixed_path(Path::new("out/summary.dat"), SummaryMode::Min),
            PathBuf::from("out/min_summary.dat")
        );
        assert_eq!(
            mode_prefixed_path(Path::new("run.log"), SummaryMode::Avg),
            PathBuf::from("avg_run.log")
        );
    }

    #[test]
    fn test_load_filtered_drops_description_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Branch = main").unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 1.0, 4, fib, [], []").unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 2.0, 4, fib, [], []").unwrap();

        let parsed = load_filtered(file.path(), &ParseConfig::default()).unwrap();

        // The description line does not contain the filter string.
        assert_eq!(parsed.data_set.description(), file.path().display().to_string());
        assert_eq!(parsed.data_set.len(), 1);
        let (_, fib) = parsed.data_set.iter().next().unwrap();
        assert_eq!(fib.time(), 3.0);
        assert_eq!(fib.count(), 2);
    }

    #[test]
    fn test_load_filtered_sums_groups() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 1.0, 4, fib, [], [] first").unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 5.0, 4, fib, [], [] second").unwrap();

        let config = ParseConfig {
            filters: vec![vec!["first".to_string()], vec!["second".to_string()]],
            ..ParseConfig::default()
        };
        let parsed = load_filtered(file.path(), &config).unwrap();

        let (_, fib) = parsed.data_set.iter().next().unwrap();
        assert_eq!(fib.time(), 6.0);
        assert_eq!(fib.count(), 2);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_load_filtered_without_groups() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 1.0, 4, fib, [], []").unwrap();

        let config = ParseConfig {
            filters: Vec::new(),
            ..ParseConfig::default()
        };
        let parsed = load_filtered(file.path(), &config).unwrap();
        assert!(parsed.data_set.is_empty());
    }

    #[test]
    fn test_load_filtered_tolerates_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"CILKPUB_DATA_POINT, 1.5, 4, fib, [], []\n").unwrap();
        file.write_all(b"CILKPUB_DATA_POINT \xff\xfe garbage\n").unwrap();
        file.write_all(b"CILKPUB_DATA_POINT, 2.5, 4, fib, [], []\n").unwrap();

        let parsed = load_filtered(file.path(), &ParseConfig::default()).unwrap();
        let (_, fib) = parsed.data_set.iter().next().unwrap();
        assert_eq!(fib.time(), 4.0);
        assert_eq!(fib.count(), 2);
    }

    #[test]
    fn test_load_filtered_missing_file() {
        let result = load_filtered(Path::new("/nonexistent/run.log"), &ParseConfig::default());
        assert!(result.is_err());
    }
}
