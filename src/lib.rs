//! Lapso - named section tracker for running programs
//!
//! This library records named sections of a program (start/end marks) with
//! their wall time and, optionally, process memory and network bandwidth, and
//! aggregates them into a report on demand.

pub mod cli;
pub mod clock;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod format;
pub mod global;
pub mod probe;
pub mod report;
pub mod section;
pub mod tracker;

pub use config::{BandwidthScope, TrackerConfig};
pub use error::{Result, TrackerError};
pub use report::{Report, ReportOptions};
pub use section::{Action, SectionState, MAIN_SECTION};
pub use tracker::{SectionGuard, Tracker, TrackerBuilder};
