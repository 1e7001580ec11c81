//! Turning benchmark logs into data sets.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dataset::DataSet;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::point::{DataPoint, MergePolicy};

/// Labels accepted in `# label = value` description lines.
pub const DEFAULT_DESCRIPTION_LABELS: &[&str] = &["version", "branch"];

/// Description used when a file carries none.
pub const DEFAULT_DESCRIPTION: &str = "UNKNOWN";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Options controlling how a log is turned into a data set.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Policy for points that share a key.
    pub policy: MergePolicy,
    /// Description to use when the input has no description line.
    pub default_description: String,
    /// Divide every merged time by its count before returning.
    pub compute_average: bool,
    /// Labels recognized in description lines, matched case-insensitively.
    pub description_labels: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Sum,
            default_description: DEFAULT_DESCRIPTION.to_string(),
            compute_average: false,
            description_labels: DEFAULT_DESCRIPTION_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ParseOptions {
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        self.default_description = description.into();
        self
    }

    pub fn with_compute_average(mut self, compute_average: bool) -> Self {
        self.compute_average = compute_average;
        self
    }
}

/// A parsed data set and the anomalies seen while building it.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub data_set: DataSet,
    pub diagnostics: Diagnostics,
}

/// Try every known data point format on `line`.
///
/// Only the canonical format exists today. Points without a benchmark name
/// are rejected with a diagnostic.
pub fn parse_data_point(line: &str, diagnostics: &mut Diagnostics) -> Option<DataPoint> {
    let point = DataPoint::parse_line(line, diagnostics)?;
    if !point.is_valid() {
        diagnostics.push(Diagnostic::InvalidPoint {
            point: point.describe(),
        });
        return None;
    }
    Some(point)
}

/// Extract the value of a `# label = value` line.
///
/// Comment markers anywhere in the line are ignored. The line must contain
/// exactly one `=`, and the label must be one of `labels` ignoring case.
pub fn parse_description_line<S: AsRef<str>>(line: &str, labels: &[S]) -> Option<String> {
    let cleaned = line.replace('#', " ");
    let mut tokens = cleaned.split('=');
    let (label, value) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(label), Some(value), None) => (label.trim(), value.trim()),
        _ => return None,
    };

    if labels.iter().any(|l| l.as_ref().eq_ignore_ascii_case(label)) {
        Some(value.to_string())
    } else {
        tracing::debug!(line = %cleaned.trim(), "ignoring line");
        None
    }
}

/// Parse a log from any buffered reader.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// garbled line only affects itself.
pub fn parse_reader<R: BufRead>(mut reader: R, options: &ParseOptions) -> io::Result<ParsedFile> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    while reader.read_until(b'\n', &mut buf)? > 0 {
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
        buf.clear();
    }
    Ok(parse_lines(lines, options))
}

/// Parse a log held in memory.
pub fn parse_str(text: &str, options: &ParseOptions) -> ParsedFile {
    parse_lines(text.lines(), options)
}

/// Parse a log given as a sequence of lines.
pub fn parse_lines<I, S>(lines: I, options: &ParseOptions) -> ParsedFile
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut diagnostics = Diagnostics::new();
    let mut description: Option<String> = None;
    let mut points = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if let Some(point) = parse_data_point(line, &mut diagnostics) {
            points.push(point);
            continue;
        }

        let found = match parse_description_line(line, options.description_labels.as_slice()) {
            Some(found) if !found.is_empty() => found,
            _ => continue,
        };
        match &description {
            Some(current) if *current != found => {
                diagnostics.push(Diagnostic::DescriptionConflict {
                    current: current.clone(),
                    found,
                });
            }
            Some(_) => {}
            None => description = Some(found),
        }
    }

    tracing::debug!(points = points.len(), policy = %options.policy, "read data points");

    let description = description.unwrap_or_else(|| options.default_description.clone());
    let mut data_set = DataSet::from_points(description, points, options.policy, &mut diagnostics);
    if options.compute_average {
        data_set.compute_average();
    }

    ParsedFile {
        data_set,
        diagnostics,
    }
}

/// Parse a log file.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<ParsedFile, ParseError> {
    let io_err = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let parsed = parse_reader(BufReader::new(file), options).map_err(io_err)?;

    tracing::info!(
        path = %path.display(),
        points = parsed.data_set.len(),
        description = parsed.data_set.description(),
        "parsed data file"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::PointKey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key(bench: &str, input: &str, p: u32) -> PointKey {
        PointKey {
            benchmark: bench.to_string(),
            input_params: input.to_string(),
            processors: p,
        }
    }

    #[test]
    fn test_parse_description_line() {
        let labels = DEFAULT_DESCRIPTION_LABELS;
        assert_eq!(
            parse_description_line("# Branch = main", labels),
            Some("main".to_string())
        );
        assert_eq!(
            parse_description_line("VERSION=1.02", labels),
            Some("1.02".to_string())
        );
        assert_eq!(parse_description_line("# commit = abc", labels), None);
        assert_eq!(parse_description_line("# branch = a = b", labels), None);
        assert_eq!(parse_description_line("just text", labels), None);
    }

    #[test]
    fn test_parse_description_line_custom_labels() {
        let labels = vec!["run".to_string()];
        assert_eq!(
            parse_description_line("# Run = nightly", labels.as_slice()),
            Some("nightly".to_string())
        );
        assert_eq!(parse_description_line("# branch = main", labels.as_slice()), None);
    }

    #[test]
    fn test_parse_data_point_rejects_blank_benchmark() {
        let mut diagnostics = Diagnostics::new();
        let point = parse_data_point("CILKPUB_DATA_POINT, 1.0, 4,  , [], []", &mut diagnostics);
        assert!(point.is_none());
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::InvalidPoint { .. })
        ));
    }

    #[test]
    fn test_parse_str_merges_and_describes() {
        let text = "\
# Branch = main
starting run
CILKPUB_DATA_POINT, 1.0, 4, fib, [n=30], [ok]
CILKPUB_DATA_POINT, 3.0, 4, fib, [n=30], [ok]
CILKPUB_DATA_POINT, 2.0, 8, fib, [n=30], [ok]
done
";
        let parsed = parse_str(text, &ParseOptions::default());

        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.data_set.description(), "main");
        assert_eq!(parsed.data_set.len(), 2);
        let fib = parsed.data_set.get(&key("fib", "n=30", 4)).unwrap();
        assert_eq!(fib.time(), 4.0);
        assert_eq!(fib.count(), 2);
    }

    #[test]
    fn test_compute_average_option() {
        let text = "\
CILKPUB_DATA_POINT, 1.0, 4, fib, [], []
CILKPUB_DATA_POINT, 3.0, 4, fib, [], []
";
        let options = ParseOptions::default().with_compute_average(true);
        let parsed = parse_str(text, &options);

        let fib = parsed.data_set.get(&key("fib", "", 4)).unwrap();
        assert_eq!(fib.time(), 2.0);
        assert_eq!(fib.count(), 1);
        assert_eq!(fib.min_time(), 1.0);
        assert_eq!(fib.max_time(), 3.0);
    }

    #[test]
    fn test_min_policy_option() {
        let text = "\
CILKPUB_DATA_POINT, 3.0, 4, fib, [], [a]
CILKPUB_DATA_POINT, 1.0, 4, fib, [], [b]
";
        let options = ParseOptions::default().with_policy(MergePolicy::Min);
        let parsed = parse_str(text, &options);

        let fib = parsed.data_set.get(&key("fib", "", 4)).unwrap();
        assert_eq!(fib.time(), 1.0);
        assert_eq!(fib.output_data(), "b");
    }

    #[test]
    fn test_description_conflict_keeps_first() {
        let text = "\
# branch = main
# version = 2.0
# branch = main
";
        let parsed = parse_str(text, &ParseOptions::default());

        assert_eq!(parsed.data_set.description(), "main");
        assert_eq!(parsed.diagnostics.len(), 1);
        assert!(matches!(
            parsed.diagnostics.iter().next(),
            Some(Diagnostic::DescriptionConflict { .. })
        ));
    }

    #[test]
    fn test_empty_description_is_ignored() {
        let text = "# branch = \n# branch = main\n";
        let parsed = parse_str(text, &ParseOptions::default());
        assert_eq!(parsed.data_set.description(), "main");
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_no_data_uses_default_description() {
        let options = ParseOptions::default().with_default_description("run.log");
        let parsed = parse_str("nothing to see\nhere\n", &options);

        assert!(parsed.data_set.is_empty());
        assert_eq!(parsed.data_set.description(), "run.log");
    }

    #[test]
    fn test_prefix_mismatch_is_reported_and_skipped() {
        let text = "OTHER, 1.0, 4, fib, [], []\nCILKPUB_DATA_POINT, 1.0, 4, fib, [], []\n";
        let parsed = parse_str(text, &ParseOptions::default());

        assert_eq!(parsed.data_set.len(), 1);
        assert!(matches!(
            parsed.diagnostics.iter().next(),
            Some(Diagnostic::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Version = 1.02").unwrap();
        writeln!(file, "CILKPUB_DATA_POINT, 1.5, 4, mybench, [small], [ok]").unwrap();

        let parsed = parse_file(file.path(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed.data_set.description(), "1.02");
        assert_eq!(parsed.data_set.len(), 1);
    }

    #[test]
    fn test_parse_file_tolerates_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"CILKPUB_DATA_POINT, 1.5, 4, fib, [], []\r\n").unwrap();
        file.write_all(b"worker \xff\xfe garbage\n").unwrap();
        file.write_all(b"CILKPUB_DATA_POINT, 2.5, 4, fib, [], []").unwrap();

        let parsed = parse_file(file.path(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed.data_set.len(), 1);
        let fib = parsed.data_set.get(&key("fib", "", 4)).unwrap();
        assert_eq!(fib.time(), 4.0);
        assert_eq!(fib.count(), 2);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_file(Path::new("/nonexistent/perf.log"), &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }
}
