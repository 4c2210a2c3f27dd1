//! Process-wide tracker
//!
//! Libraries that cannot thread a `Tracker` through their call sites can use
//! the shared instance here instead. It is built on first access from the
//! configuration file named by `LAPSO_CONFIG` (defaults if unset or broken).
//! `reset` drops it so the next access builds a fresh one; that is meant for
//! test isolation.

use crate::config::TrackerConfig;
use crate::tracker::Tracker;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static GLOBAL: Mutex<Option<Arc<Tracker>>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Arc<Tracker>>> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The shared tracker, constructed (and `Main` started) on first call
pub fn tracker() -> Arc<Tracker> {
    let mut slot = slot();
    Arc::clone(slot.get_or_insert_with(|| {
        tracing::debug!("Constructing process-wide tracker");
        Arc::new(Tracker::new(TrackerConfig::from_env()))
    }))
}

/// Replace the shared tracker
pub fn install(tracker: Tracker) -> Arc<Tracker> {
    let tracker = Arc::new(tracker);
    *slot() = Some(Arc::clone(&tracker));
    tracker
}

/// Build the shared tracker now when `auto_start_tracker` is set
///
/// Returns `None` when the tracker is left to be built lazily on first access.
pub fn bootstrap(config: TrackerConfig) -> Option<Arc<Tracker>> {
    if config.auto_start_tracker {
        Some(install(Tracker::new(config)))
    } else {
        None
    }
}

/// Whether a shared tracker currently exists
pub fn is_initialized() -> bool {
    slot().is_some()
}

/// Drop the shared tracker; the next `tracker()` call builds a new one
pub fn reset() {
    *slot() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{SectionState, MAIN_SECTION};
    use serial_test::serial;

    fn quiet_config() -> TrackerConfig {
        TrackerConfig {
            track_bandwidth: false,
            track_memory: false,
            ..TrackerConfig::default()
        }
    }

    #[test]
    #[serial]
    fn test_tracker_returns_same_instance() {
        reset();
        let first = tracker();
        let second = tracker();
        assert!(Arc::ptr_eq(&first, &second));
        reset();
    }

    #[test]
    #[serial]
    fn test_reset_builds_fresh_instance() {
        reset();
        let first = tracker();
        first.start("Sec1").unwrap_or(());
        reset();
        assert!(!is_initialized());

        let second = tracker();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.state("Sec1"), SectionState::Uncreated);
        assert_eq!(second.state(MAIN_SECTION), SectionState::Started);
        reset();
    }

    #[test]
    #[serial]
    fn test_bootstrap_honors_auto_start() {
        reset();
        let lazy = TrackerConfig {
            auto_start_tracker: false,
            ..quiet_config()
        };
        assert!(bootstrap(lazy).is_none());
        assert!(!is_initialized());

        let eager = bootstrap(quiet_config()).unwrap();
        assert!(Arc::ptr_eq(&eager, &tracker()));
        reset();
    }
}
