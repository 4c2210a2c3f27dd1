// Integration test utilities
//
// Deterministic clock and probe for driving a Tracker from tests

#![allow(dead_code)]

use lapso::clock::Clock;
use lapso::probe::{MemorySample, SystemProbe};
use lapso::{Tracker, TrackerConfig, TrackerError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Clock set by hand; clones share the same time
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(secs: f64) -> Self {
        let clock = Self::default();
        clock.set(secs);
        clock
    }

    pub fn set(&self, secs: f64) {
        self.0.store(secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }
}

/// Probe returning counters set by the test; clones share state
#[derive(Clone, Default)]
pub struct FakeProbe {
    bandwidth: Arc<AtomicU64>,
    resident: Arc<AtomicU64>,
    peak: Arc<AtomicU64>,
    fail_memory: Arc<AtomicBool>,
}

impl FakeProbe {
    pub fn set_bandwidth(&self, bytes: u64) {
        self.bandwidth.store(bytes, Ordering::SeqCst);
    }

    pub fn set_memory(&self, resident: u64, peak: u64) {
        self.resident.store(resident, Ordering::SeqCst);
        self.peak.store(peak, Ordering::SeqCst);
    }

    pub fn fail_memory(&self) {
        self.fail_memory.store(true, Ordering::SeqCst);
    }
}

impl SystemProbe for FakeProbe {
    fn bandwidth(&self) -> lapso::Result<u64> {
        Ok(self.bandwidth.load(Ordering::SeqCst))
    }

    fn memory(&self) -> lapso::Result<MemorySample> {
        if self.fail_memory.load(Ordering::SeqCst) {
            return Err(TrackerError::ProbeFailure {
                probe: "memory",
                reason: "fake probe failure".to_string(),
            });
        }
        Ok(MemorySample {
            resident: self.resident.load(Ordering::SeqCst),
            peak: self.peak.load(Ordering::SeqCst),
        })
    }
}

/// Tracker on a manual clock starting at `t = 1000.0` and a fake probe
pub fn fake_tracker(config: TrackerConfig) -> (Tracker, ManualClock, FakeProbe) {
    let clock = ManualClock::at(1000.0);
    let probe = FakeProbe::default();
    let tracker = Tracker::builder(config)
        .clock(clock.clone())
        .probe(probe.clone())
        .build();
    (tracker, clock, probe)
}
