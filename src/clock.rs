//! Timestamp source for section timers
//!
//! Timestamps are seconds since the UNIX epoch as `f64`. The default clock
//! reads `SystemTime` once and advances with `Instant`, so values look like
//! wall-clock time but never move backward.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Fractional digits kept for elapsed seconds
pub const ELAPSED_PRECISION: u32 = 5;

/// Source of timestamps (seconds since the UNIX epoch)
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Epoch-anchored monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch_offset: f64,
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let epoch_offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Self {
            epoch_offset,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch_offset + self.anchor.elapsed().as_secs_f64()
    }
}

/// Round to `digits` fractional digits
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Elapsed seconds between two timestamps, rounded to `ELAPSED_PRECISION`
pub fn elapsed_between(start: f64, end: f64) -> f64 {
    round_to(end - start, ELAPSED_PRECISION)
}
