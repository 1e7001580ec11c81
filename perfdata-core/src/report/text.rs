use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{format_g, DiffEntry, DiffReport, ReportError, Reporter};

/// Writes the plain-text diff report: slower, faster, changed and all
/// entries, each under a comment header and a column header.
#[derive(Debug, Clone, Default)]
pub struct TextReporter;

impl TextReporter {
    pub fn new() -> Self {
        Self
    }

    fn header(report: &DiffReport) -> String {
        format!(
            "# {:>20} {:>15} {:>15} {:>8}",
            "Benchmark ", report.baseline_description, report.new_description, "Percent Diff"
        )
    }

    fn row(entry: &DiffEntry) -> String {
        format!(
            "{:>40}, {:>8}, {:>8}, {:>8}",
            entry.label,
            format_g(entry.baseline_time),
            format_g(entry.new_time),
            format_g(entry.percent_diff)
        )
    }

    fn write_rows<'a>(
        writer: &mut dyn Write,
        header: &str,
        entries: impl Iterator<Item = &'a DiffEntry>,
    ) -> std::io::Result<()> {
        writeln!(writer, "{}", header)?;
        for entry in entries {
            writeln!(writer, "{}", Self::row(entry))?;
        }
        Ok(())
    }

    /// Write the report to `path`, replacing any existing file.
    pub fn write_file(&self, report: &DiffReport, path: &Path) -> Result<(), ReportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.report(report, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl Reporter for TextReporter {
    fn report(&self, report: &DiffReport, writer: &mut dyn Write) -> Result<(), ReportError> {
        let header = Self::header(report);
        let large = report.thresholds.large;
        let any = report.thresholds.report;

        writeln!(writer, "#               [Test with change >= {:.6} percent]", large)?;
        writeln!(writer)?;
        Self::write_rows(writer, &header, report.slower())?;
        write!(writer, "\n\n")?;

        writeln!(writer, "#               [Test with change <= -{:.6} percent]", large)?;
        writeln!(writer)?;
        Self::write_rows(writer, &header, report.faster())?;
        write!(writer, "\n\n")?;

        writeln!(writer, "# Any diff >= {:.6} percent ", any)?;
        writeln!(writer)?;
        Self::write_rows(writer, &header, report.changed())?;
        write!(writer, "\n\n")?;

        writeln!(writer, "# All data ")?;
        Self::write_rows(writer, &header, report.entries.iter())?;
        writeln!(writer)?;

        Ok(())
    }
}
