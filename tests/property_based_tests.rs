//! Property-based tests for the tracker and its helpers

mod utils;

use lapso::format::format_bytes;
use lapso::probe::network::parse_net_dev;
use lapso::{Action, TrackerConfig};
use proptest::prelude::*;
use utils::fake_tracker;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_elapsed_is_end_minus_start(
        start_offset in 0.0f64..10_000.0,
        duration in 0.0f64..1_000.0,
    ) {
        let (tracker, clock, _) = fake_tracker(TrackerConfig::default());
        clock.set(1_700_000_000.0 + start_offset);
        tracker.start("S").unwrap();
        clock.advance(duration);
        tracker.end("S").unwrap();

        let report = tracker.build_report(false);
        let timer = report.timer("S").unwrap();
        let exact = timer.end.unwrap() - timer.start.unwrap();
        prop_assert!((timer.elapsed.unwrap() - exact).abs() <= 0.5e-5 + 1e-9);
    }

    #[test]
    fn prop_counter_diff_is_signed_difference(start in 0u64..1 << 40, end in 0u64..1 << 40) {
        let (tracker, _, probe) = fake_tracker(TrackerConfig::default());
        probe.set_memory(start, start);
        probe.set_bandwidth(start);
        tracker.start("S").unwrap();
        probe.set_memory(end, end);
        probe.set_bandwidth(end);
        tracker.end("S").unwrap();

        let json = serde_json::to_value(tracker.build_report(true)).unwrap();
        let expected = end as i64 - start as i64;
        prop_assert_eq!(json["S"]["memory"]["diff"].as_i64(), Some(expected));
        prop_assert_eq!(json["S"]["bandwidth"]["net"].as_i64(), Some(expected));
    }

    #[test]
    fn prop_build_report_is_idempotent(names in prop::collection::vec("[a-z]{1,8}", 0..10)) {
        let (tracker, clock, _) = fake_tracker(TrackerConfig::default());
        for (i, name) in names.iter().enumerate() {
            tracker.mark(name, if i % 2 == 0 { Action::Start } else { Action::End }).unwrap();
            clock.advance(0.1);
        }

        prop_assert_eq!(tracker.build_report(true), tracker.build_report(true));
        prop_assert_eq!(
            tracker.build_report(false).to_json().unwrap(),
            tracker.build_report(false).to_json().unwrap()
        );
    }

    #[test]
    fn prop_action_parse_never_panics(action in ".*") {
        let parsed = Action::parse(&action);
        if action.trim().eq_ignore_ascii_case("end") {
            prop_assert_eq!(parsed, Action::End);
        } else {
            prop_assert_eq!(parsed, Action::Start);
        }
    }

    #[test]
    fn prop_format_bytes_has_unit(bytes in any::<i64>(), precision in 0usize..4) {
        let text = format_bytes(bytes, precision);
        let unit = text.rsplit(' ').next().unwrap();
        prop_assert!(["B", "KB", "MB", "GB", "TB", "PB", "EB"].contains(&unit));
        prop_assert_eq!(text.starts_with('-'), bytes < 0);

        let number: f64 = text.trim_start_matches('-').split(' ').next().unwrap().parse().unwrap();
        if unit != "EB" {
            prop_assert!(number < 1024.0, "{}", text);
        }
    }

    #[test]
    fn prop_parse_net_dev_never_panics(content in ".*") {
        let interfaces = parse_net_dev(&content);
        prop_assert!(interfaces.iter().all(|i| !i.name.is_empty()));
    }
}
