//! CLI argument parsing for lapso

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the section report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "lapso")]
#[command(version)]
#[command(
    about = "Run a command inside a tracked section and report time, memory and bandwidth",
    long_about = "Run a command inside a tracked section and report time, memory and bandwidth.\n\n\
                  Memory is the peak resident memory of the command (getrusage of waited-for \
                  children). Bandwidth is the network byte counter of the host's first \
                  interface, or of all interfaces with bandwidthScope = \"all-interfaces\"."
)]
pub struct Cli {
    /// Tracker configuration file (TOML, `[tracker]` table)
    #[arg(short = 'C', long = "config", value_name = "FILE", env = "LAPSO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the section wrapping the command
    #[arg(short = 's', long = "section", value_name = "NAME", default_value = "Command")]
    pub section: String,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Include memory, peak memory and bandwidth per section
    #[arg(short = 'a', long = "all-metrics")]
    pub all_metrics: bool,

    /// Render byte counts as "18 MB" instead of raw bytes
    #[arg(short = 'H', long = "human")]
    pub human: bool,

    /// Do not snapshot network counters
    #[arg(long = "no-bandwidth")]
    pub no_bandwidth: bool,

    /// Do not snapshot the command's peak memory
    #[arg(long = "no-memory")]
    pub no_memory: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Command to run (everything after --)
    #[arg(last = true)]
    pub command: Option<Vec<String>>,
}
