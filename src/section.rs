//! Section data model: a timer plus optional counter snapshots

use crate::clock::elapsed_between;

/// Name of the section started when a tracker is constructed
pub const MAIN_SECTION: &str = "Main";

/// What a `mark` call records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    End,
}

impl Action {
    /// Case-insensitive parse; anything but `end` means `Start`
    pub fn parse(action: &str) -> Self {
        if action.trim().eq_ignore_ascii_case("end") {
            Action::End
        } else {
            Action::Start
        }
    }
}

/// Lifecycle position of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Uncreated,
    Started,
    Ended,
}

/// Wall-clock timer of a section (epoch seconds)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timer {
    /// `None` only when `end` was called on a name that was never started
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub elapsed: Option<f64>,
}

impl Timer {
    pub fn record(&mut self, action: Action, now: f64) {
        match action {
            Action::Start => {
                self.start = Some(now);
                self.end = None;
                self.elapsed = None;
            }
            Action::End => {
                self.end = Some(now);
                self.elapsed = Some(elapsed_between(self.start.unwrap_or_default(), now));
            }
        }
    }
}

/// Start/end snapshots of a byte counter and their signed difference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub delta: Option<i64>,
}

impl Counter {
    /// Counter whose baseline is `value`
    pub fn from_start(value: u64) -> Self {
        Self {
            start: Some(value),
            ..Self::default()
        }
    }

    pub fn record(&mut self, action: Action, value: u64) {
        match action {
            Action::Start => {
                self.start = Some(value);
                self.end = None;
                self.delta = None;
            }
            Action::End => {
                self.end = Some(value);
                self.delta = Some(signed_diff(value, self.start.unwrap_or_default()));
            }
        }
    }
}

pub(crate) fn signed_diff(end: u64, start: u64) -> i64 {
    (end as i128 - start as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// A named unit of work tracked between `start` and `end`
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub timer: Timer,
    pub bandwidth: Option<Counter>,
    pub memory: Option<Counter>,
    pub peak_memory: Option<Counter>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timer: Timer::default(),
            bandwidth: None,
            memory: None,
            peak_memory: None,
        }
    }

    /// A section ended without ever being started still counts as `Uncreated`
    pub fn state(&self) -> SectionState {
        match (self.timer.start, self.timer.end) {
            (None, _) => SectionState::Uncreated,
            (Some(_), None) => SectionState::Started,
            (Some(_), Some(_)) => SectionState::Ended,
        }
    }

    pub fn is_started(&self) -> bool {
        self.timer.start.is_some()
    }
}
