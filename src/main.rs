use anyhow::{Context, Result};
use clap::Parser;
use lapso::cli::{Cli, OutputFormat};
use lapso::csv_output::CsvReport;
use lapso::probe::{MemorySource, ProcProbe};
use lapso::{Report, ReportOptions, Tracker, TrackerConfig};
use std::process::{Command, ExitStatus};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Build the tracker configuration from the config file and CLI toggles
fn build_config(args: &Cli) -> TrackerConfig {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load_or_default(path),
        None => TrackerConfig::default(),
    };
    if args.no_bandwidth {
        config.track_bandwidth = false;
    }
    if args.no_memory {
        config.track_memory = false;
    }
    config
}

/// Run the command inside `section`; probe failures only cost the metric
fn run_command(tracker: &Tracker, section: &str, command: &[String]) -> Result<ExitStatus> {
    let (program, args) = command
        .split_first()
        .context("Must specify a command. Usage: lapso -- COMMAND [ARGS...]")?;

    if let Err(e) = tracker.start(section) {
        tracing::warn!("{}", e);
    }

    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run {}", program))?;

    if let Err(e) = tracker.end(section) {
        tracing::warn!("{}", e);
    }
    Ok(status)
}

fn render(report: &Report, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => {
            let mut json = report.to_json_pretty()?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => CsvReport::new(report).to_csv(),
    })
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let command = args.command.clone().unwrap_or_default();
    if command.is_empty() {
        anyhow::bail!("Must specify a command. Usage: lapso -- COMMAND [ARGS...]");
    }

    // Memory is the peak of the command, not of lapso itself
    let config = build_config(&args);
    let probe = ProcProbe::from_config(&config).with_memory_source(MemorySource::Children);
    let tracker = Tracker::builder(config).probe(probe).build();
    let status = run_command(&tracker, &args.section, &command)?;

    let options = if args.all_metrics {
        ReportOptions::all_metrics()
    } else {
        ReportOptions::timers_only()
    }
    .with_human_bytes(args.human);

    let report = match tracker.end_and_report_with(&options) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("{}", e);
            tracker.build_report_with(&options)
        }
    };

    print!("{}", render(&report, args.format)?);

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
