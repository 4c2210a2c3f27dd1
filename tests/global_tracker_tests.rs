//! Integration tests for the process-wide tracker
//!
//! Every test touches the shared instance, so they run serially and reset it
//! on entry.

use lapso::config::CONFIG_ENV;
use lapso::{global, SectionState, Tracker, TrackerConfig, MAIN_SECTION};
use serial_test::serial;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
#[serial]
fn test_reset_yields_fresh_main_with_growing_elapsed() {
    global::reset();

    let tracker = global::tracker();
    assert_eq!(tracker.state(MAIN_SECTION), SectionState::Started);

    let first = tracker.elapsed(MAIN_SECTION).unwrap();
    thread::sleep(Duration::from_millis(20));
    let second = tracker.elapsed(MAIN_SECTION).unwrap();
    assert!(second > first, "{} !> {}", second, first);

    global::reset();
}

#[test]
#[serial]
fn test_sections_are_shared_between_accesses() {
    global::reset();

    let _ = global::tracker().start("Shared");
    assert_eq!(global::tracker().state("Shared"), SectionState::Started);

    let handle = thread::spawn(|| {
        let _ = global::tracker().end("Shared");
    });
    handle.join().unwrap();
    assert_eq!(global::tracker().state("Shared"), SectionState::Ended);

    global::reset();
    assert_eq!(global::tracker().state("Shared"), SectionState::Uncreated);
    global::reset();
}

#[test]
#[serial]
fn test_configuration_from_environment() {
    global::reset();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[tracker]\ntrackBandwidth = false\ntrackMemory = false\ncheckIPs = \"127.0.0.1,::1\""
    )
    .unwrap();

    std::env::set_var(CONFIG_ENV, file.path());
    let tracker = global::tracker();
    std::env::remove_var(CONFIG_ENV);

    assert!(!tracker.is_tracking_bandwidth());
    assert!(!tracker.is_tracking_memory());
    assert!(tracker.is_check_ip("::1"));

    global::reset();
}

#[test]
#[serial]
fn test_malformed_configuration_falls_back_to_defaults() {
    global::reset();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "tracker = [1, 2]").unwrap();

    std::env::set_var(CONFIG_ENV, file.path());
    let tracker = global::tracker();
    std::env::remove_var(CONFIG_ENV);

    assert!(tracker.config().track_memory);
    assert!(tracker.check_ips().is_empty());

    global::reset();
}

#[test]
#[serial]
fn test_install_replaces_instance() {
    global::reset();
    let before = global::tracker();

    let installed = global::install(Tracker::default());
    assert!(Arc::ptr_eq(&installed, &global::tracker()));
    assert!(!Arc::ptr_eq(&before, &installed));

    global::reset();
}

#[test]
#[serial]
fn test_timezone_is_applied_at_construction() {
    let previous = std::env::var_os("TZ");

    let config = TrackerConfig {
        timezone: Some("America/Chicago".to_string()),
        track_bandwidth: false,
        track_memory: false,
        ..TrackerConfig::default()
    };
    let tracker = Tracker::new(config);
    assert_eq!(std::env::var("TZ").as_deref(), Ok("America/Chicago"));
    assert_eq!(tracker.state(MAIN_SECTION), SectionState::Started);

    match previous {
        Some(tz) => std::env::set_var("TZ", tz),
        None => std::env::remove_var("TZ"),
    }
}

#[test]
#[serial]
fn test_no_timezone_leaves_tz_untouched() {
    std::env::set_var("TZ", "UTC");
    let _tracker = Tracker::new(TrackerConfig {
        track_bandwidth: false,
        track_memory: false,
        ..TrackerConfig::default()
    });
    assert_eq!(std::env::var("TZ").as_deref(), Ok("UTC"));
    std::env::remove_var("TZ");
}
