use anyhow::{Context, Result};
use clap::Parser;
use perfdata::cli::{Command, DiffArgs, SummarizeArgs};
use perfdata::{Cli, Config, Diagnostics, Reporter, TerminalReporter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config and apply CLI overrides
    let mut config = Config::load_if_exists(&cli.config)?;
    cli.apply_to_config(&mut config);
    tracing::debug!(?config, "configuration");

    if !config.report.colors {
        colored::control::set_override(false);
    }

    match &cli.command {
        Command::Summarize(args) => run_summarize(args, &config),
        Command::Diff(args) => run_diff(args, &config),
    }
}

fn run_summarize(args: &SummarizeArgs, config: &Config) -> Result<()> {
    let summary = perfdata::summarize(
        &args.input,
        &config.summarize.output,
        config.summarize.mode,
        args.format,
        &config.parse,
    )?;

    report_diagnostics(&summary.diagnostics);
    eprintln!(
        "Wrote {} data points to {}",
        summary.data_set.len(),
        summary.output_path.display()
    );
    Ok(())
}

fn run_diff(args: &DiffArgs, config: &Config) -> Result<()> {
    let comparison = perfdata::diff(
        &args.base,
        args.new.as_deref(),
        &config.diff.output,
        config.diff.thresholds(),
        &config.parse,
    )?;

    report_diagnostics(&comparison.diagnostics);
    report_diagnostics(&comparison.report.diagnostics);

    let reporter = if config.report.colors {
        TerminalReporter::new()
    } else {
        TerminalReporter::without_colors()
    };
    reporter
        .report_to_stdout(&comparison.report)
        .context("Failed to print summary")?;

    eprintln!("Wrote diff report to {}", config.diff.output.display());
    Ok(())
}

fn report_diagnostics(diagnostics: &Diagnostics) {
    if !diagnostics.is_empty() {
        tracing::warn!(count = diagnostics.len(), "input contained anomalies");
    }
}
