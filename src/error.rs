//! Error types for the section tracker

use thiserror::Error;

/// Errors produced by the tracker, its probes and its configuration
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A section was read before it was ever started, or the metric is not tracked
    #[error("Invalid state for section '{section}': {reason}")]
    InvalidState { section: String, reason: String },

    /// An OS-level metric query failed
    #[error("{probe} probe failed: {reason}")]
    ProbeFailure { probe: &'static str, reason: String },

    /// Configuration source present but malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Raised by `Tracker::end_and_fail`, carrying the message and the timer report
    #[error("{0}")]
    Aborted(String),
}

impl TrackerError {
    pub(crate) fn invalid_state(section: &str, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            section: section.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn probe(probe: &'static str, reason: impl Into<String>) -> Self {
        Self::ProbeFailure {
            probe,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
