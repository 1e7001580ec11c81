use std::io::{self, Write};

use colored::Colorize;

use super::{format_g, DiffEntry, DiffReport, ReportError, Reporter};

/// A reporter that prints the changed entries and a summary to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// Format the percent change, or mark the entry as suspicious.
    fn format_change(entry: &DiffEntry) -> String {
        if entry.suspicious {
            "suspicious".to_string()
        } else if entry.percent_diff > 0.0 {
            format!("+{:.2}%", entry.percent_diff)
        } else if entry.percent_diff < 0.0 {
            format!("-{:.2}%", entry.percent_diff.abs())
        } else {
            "0.00%".to_string()
        }
    }

    /// Format the change column, red for slower and green for faster.
    fn format_change_colored(&self, entry: &DiffEntry, large: f64) -> String {
        let change = Self::format_change(entry);
        if !self.use_colors {
            return change;
        }

        if entry.suspicious {
            change.yellow().bold().to_string()
        } else if entry.percent_diff >= large {
            change.red().bold().to_string()
        } else if entry.percent_diff <= -large {
            change.green().bold().to_string()
        } else {
            change.yellow().to_string()
        }
    }

    fn print_header(&self, writer: &mut dyn Write, report: &DiffReport) -> io::Result<()> {
        writeln!(writer)?;
        let header = format!(
            "{:<40} {:>14} {:>14} {:>12}",
            "Benchmark", report.baseline_description, report.new_description, "Change"
        );
        if self.use_colors {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(83))?;
        Ok(())
    }

    fn print_row(&self, writer: &mut dyn Write, entry: &DiffEntry, large: f64) -> io::Result<()> {
        let name = if entry.label.chars().count() > 38 {
            let truncated: String = entry.label.chars().take(35).collect();
            format!("{}...", truncated)
        } else {
            entry.label.clone()
        };

        let change = self.format_change_colored(entry, large);
        // ANSI escapes do not count towards the visible width.
        let padding = 12_usize.saturating_sub(Self::format_change(entry).len());

        writeln!(
            writer,
            "{:<40} {:>14} {:>14} {:>width$}{}",
            name,
            format_g(entry.baseline_time),
            format_g(entry.new_time),
            "",
            change,
            width = padding,
        )?;
        Ok(())
    }

    fn print_summary(&self, writer: &mut dyn Write, report: &DiffReport) -> io::Result<()> {
        let slower = report.slower().count();
        let faster = report.faster().count();
        let changed = report.changed().count();
        let compared = report.entries.len();
        let new = report.new_points.len();

        writeln!(writer)?;
        writeln!(writer, "{}", "-".repeat(83))?;

        let summary_label = "Summary:";
        if self.use_colors {
            write!(writer, "{} ", summary_label.bold())?;
        } else {
            write!(writer, "{} ", summary_label)?;
        }

        let slower_text = format!("{} slower", slower);
        let faster_text = format!("{} faster", faster);
        let changed_text = format!("{} changed", changed);
        let rest = format!("of {} compared, {} new", compared, new);

        if self.use_colors {
            writeln!(
                writer,
                "{}, {}, {} {}",
                slower_text.red(),
                faster_text.green(),
                changed_text.yellow(),
                rest
            )?;
        } else {
            writeln!(writer, "{}, {}, {} {}", slower_text, faster_text, changed_text, rest)?;
        }

        writeln!(writer)?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &DiffReport, writer: &mut dyn Write) -> Result<(), ReportError> {
        let large = report.thresholds.large;

        self.print_header(writer, report)?;
        for entry in report.changed() {
            self.print_row(writer, entry, large)?;
        }
        self.print_summary(writer, report)?;

        Ok(())
    }
}
