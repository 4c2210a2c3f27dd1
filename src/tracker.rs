//! Section tracker
//!
//! A `Tracker` records named sections of a running program. Every `start` or
//! `end` mark snapshots the clock and, when enabled, the process memory and
//! the network byte counters. The recorded data is turned into a `Report` on
//! demand.
//!
//! # Example
//! ```
//! use lapso::{Tracker, TrackerConfig};
//!
//! # fn main() -> lapso::Result<()> {
//! let config = TrackerConfig {
//!     track_bandwidth: false,
//!     ..TrackerConfig::default()
//! };
//! let tracker = Tracker::new(config);
//!
//! tracker.start("load")?;
//! // ... work ...
//! tracker.end("load")?;
//!
//! let report = tracker.end_and_report(false)?;
//! assert!(report.timer("load").unwrap().elapsed.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! All calls on one tracker are serialized behind a mutex, so a tracker can
//! be shared across threads (e.g. in an `Arc`).

use crate::clock::{elapsed_between, Clock, MonotonicClock};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::probe::{ProcProbe, SystemProbe};
use crate::report::{Report, ReportOptions};
use crate::section::{signed_diff, Action, Counter, Section, SectionState, MAIN_SECTION};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Sections in first-start order, plus the metrics still being probed
#[derive(Debug)]
struct Registry {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
    bandwidth_enabled: bool,
    memory_enabled: bool,
}

impl Registry {
    fn new(config: &TrackerConfig) -> Self {
        Self {
            sections: Vec::new(),
            index: HashMap::new(),
            bandwidth_enabled: config.track_bandwidth,
            memory_enabled: config.track_memory,
        }
    }

    fn get(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&i| &self.sections[i])
    }

    fn get_or_insert(&mut self, name: &str) -> &mut Section {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.sections.push(Section::new(name));
                let i = self.sections.len() - 1;
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.sections[i]
    }
}

/// Builder for a `Tracker` with a custom probe or clock
pub struct TrackerBuilder {
    config: TrackerConfig,
    probe: Option<Box<dyn SystemProbe>>,
    clock: Option<Box<dyn Clock>>,
}

impl TrackerBuilder {
    pub fn probe(mut self, probe: impl SystemProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Construct the tracker and start the `Main` section
    pub fn build(self) -> Tracker {
        if let Some(tz) = &self.config.timezone {
            tracing::debug!("Setting process timezone to {}", tz);
            std::env::set_var("TZ", tz);
        }

        let probe = self.probe.unwrap_or_else(|| {
            Box::new(ProcProbe::from_config(&self.config)) as Box<dyn SystemProbe>
        });
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()) as Box<dyn Clock>);

        let tracker = Tracker {
            state: Mutex::new(Registry::new(&self.config)),
            config: self.config,
            probe,
            clock,
        };

        if let Err(e) = tracker.start(MAIN_SECTION) {
            // The timer is recorded even when a probe fails
            tracing::warn!("Main section started without all metrics: {}", e);
        }
        tracker
    }
}

/// Registry of named sections
pub struct Tracker {
    config: TrackerConfig,
    probe: Box<dyn SystemProbe>,
    clock: Box<dyn Clock>,
    state: Mutex<Registry>,
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("config", &self.config)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracker {
    /// Create a tracker with the procfs probe and the monotonic clock
    pub fn new(config: TrackerConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: TrackerConfig) -> TrackerBuilder {
        TrackerBuilder {
            config,
            probe: None,
            clock: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn check_ips(&self) -> &[String] {
        &self.config.check_ips
    }

    pub fn proxy_ips(&self) -> &[String] {
        &self.config.proxy_ips
    }

    pub fn is_check_ip(&self, ip: &str) -> bool {
        self.config.check_ips.iter().any(|known| known == ip.trim())
    }

    pub fn is_proxy_ip(&self, ip: &str) -> bool {
        self.config.proxy_ips.iter().any(|known| known == ip.trim())
    }

    /// Whether marks still snapshot bandwidth (false once its probe failed)
    pub fn is_tracking_bandwidth(&self) -> bool {
        self.lock().bandwidth_enabled
    }

    /// Whether marks still snapshot memory (false once its probe failed)
    pub fn is_tracking_memory(&self) -> bool {
        self.lock().memory_enabled
    }

    /// Record a `start` or `end` for `name`
    ///
    /// The first `start` creates the section; a later `start` restarts it and
    /// replaces every baseline. `end` computes `elapsed` and the counter
    /// differences against the last start. An `end` on a section that was never
    /// started only records the timer.
    ///
    /// A probe failure disables that metric for the rest of the tracker's life
    /// and is returned as `ProbeFailure`. The timer is recorded regardless.
    pub fn mark(&self, name: &str, action: Action) -> Result<()> {
        let mut registry = self.lock();
        let now = self.clock.now();
        let mut failure: Option<TrackerError> = None;

        let bandwidth = if registry.bandwidth_enabled {
            match self.probe.bandwidth() {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!("Disabling bandwidth tracking: {}", e);
                    registry.bandwidth_enabled = false;
                    failure = failure.or(Some(e));
                    None
                }
            }
        } else {
            None
        };

        let memory = if registry.memory_enabled {
            match self.probe.memory() {
                Ok(sample) => Some(sample),
                Err(e) => {
                    tracing::warn!("Disabling memory tracking: {}", e);
                    registry.memory_enabled = false;
                    failure = failure.or(Some(e));
                    None
                }
            }
        } else {
            None
        };

        let section = registry.get_or_insert(name);
        let was_started = section.is_started();
        section.timer.record(action, now);

        match action {
            // A restart only keeps the baselines sampled by this mark
            Action::Start => {
                section.bandwidth = bandwidth.map(Counter::from_start);
                section.memory = memory.map(|sample| Counter::from_start(sample.resident));
                section.peak_memory = memory.map(|sample| Counter::from_start(sample.peak));
            }
            Action::End if !was_started => {
                tracing::warn!("Section '{}' ended before it was started", name);
            }
            Action::End => {
                if let (Some(counter), Some(bytes)) = (section.bandwidth.as_mut(), bandwidth) {
                    counter.record(action, bytes);
                }
                if let Some(sample) = memory {
                    if let Some(counter) = section.memory.as_mut() {
                        counter.record(action, sample.resident);
                    }
                    if let Some(counter) = section.peak_memory.as_mut() {
                        counter.record(action, sample.peak);
                    }
                }
            }
        }

        tracing::debug!(section = name, ?action, elapsed = ?section.timer.elapsed, "mark");

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn start(&self, name: &str) -> Result<()> {
        self.mark(name, Action::Start)
    }

    pub fn end(&self, name: &str) -> Result<()> {
        self.mark(name, Action::End)
    }

    /// Seconds since `name` was started, measured now (the section need not be ended)
    pub fn elapsed(&self, name: &str) -> Result<f64> {
        let registry = self.lock();
        let start = registry
            .get(name)
            .and_then(|s| s.timer.start)
            .ok_or_else(|| TrackerError::invalid_state(name, "section was never started"))?;
        Ok(elapsed_between(start, self.clock.now()))
    }

    /// Bytes transferred since `name` was started, measured now
    pub fn bandwidth_usage(&self, name: &str) -> Result<i64> {
        let registry = self.lock();
        let section = registry
            .get(name)
            .filter(|s| s.is_started())
            .ok_or_else(|| TrackerError::invalid_state(name, "section was never started"))?;

        if !registry.bandwidth_enabled {
            return Err(TrackerError::invalid_state(name, "bandwidth tracking is disabled"));
        }

        let start = section
            .bandwidth
            .as_ref()
            .and_then(|c| c.start)
            .ok_or_else(|| TrackerError::invalid_state(name, "no bandwidth snapshot at start"))?;

        let current = self.probe.bandwidth()?;
        Ok(signed_diff(current, start))
    }

    pub fn state(&self, name: &str) -> SectionState {
        self.lock()
            .get(name)
            .map_or(SectionState::Uncreated, Section::state)
    }

    /// Section names in first-start order
    pub fn section_names(&self) -> Vec<String> {
        self.lock().sections.iter().map(|s| s.name.clone()).collect()
    }

    /// Report over the recorded data; takes no new measurements
    pub fn build_report(&self, include_all_metrics: bool) -> Report {
        let options = if include_all_metrics {
            ReportOptions::all_metrics()
        } else {
            ReportOptions::timers_only()
        };
        self.build_report_with(&options)
    }

    pub fn build_report_with(&self, options: &ReportOptions) -> Report {
        let registry = self.lock();
        Report::new(&registry.sections, options)
    }

    /// End `Main`, then build and emit the report
    pub fn end_and_report(&self, include_all_metrics: bool) -> Result<Report> {
        let options = if include_all_metrics {
            ReportOptions::all_metrics()
        } else {
            ReportOptions::timers_only()
        };
        self.end_and_report_with(&options)
    }

    pub fn end_and_report_with(&self, options: &ReportOptions) -> Result<Report> {
        self.end(MAIN_SECTION)?;
        let report = self.build_report_with(options);
        match report.to_json() {
            Ok(json) => tracing::info!(report = %json, "Section report"),
            Err(e) => tracing::warn!("Failed to serialize section report: {}", e),
        }
        Ok(report)
    }

    /// End `Main` and fail with `message` followed by the timer report
    ///
    /// Always returns `Err(TrackerError::Aborted)`, so callers can write
    /// `return tracker.end_and_fail("...")`.
    pub fn end_and_fail<T>(&self, message: impl fmt::Display) -> Result<T> {
        if let Err(e) = self.end(MAIN_SECTION) {
            tracing::warn!("Main section ended without all metrics: {}", e);
        }
        let timers = self
            .build_report(false)
            .to_json()
            .unwrap_or_else(|e| format!("<report unavailable: {}>", e));
        Err(TrackerError::Aborted(format!("{}\n{}", message, timers)))
    }

    /// Start `name` and end it when the returned guard is dropped
    pub fn section(&self, name: &str) -> Result<SectionGuard<'_>> {
        self.start(name)?;
        Ok(SectionGuard {
            tracker: self,
            name: name.to_string(),
            ended: false,
        })
    }

    /// Run `f` inside section `name`
    pub fn measure<F, R>(&self, name: &str, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        self.start(name)?;
        let result = f();
        self.end(name)?;
        Ok(result)
    }
}

/// Ends its section when dropped
///
/// Errors while ending on drop are logged; call `end` to observe them.
#[must_use = "the section ends as soon as the guard is dropped"]
pub struct SectionGuard<'a> {
    tracker: &'a Tracker,
    name: String,
    ended: bool,
}

impl SectionGuard<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn end(mut self) -> Result<()> {
        self.ended = true;
        self.tracker.end(&self.name)
    }
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if !self.ended {
            if let Err(e) = self.tracker.end(&self.name) {
                tracing::warn!("Failed to end section '{}': {}", self.name, e);
            }
        }
    }
}
