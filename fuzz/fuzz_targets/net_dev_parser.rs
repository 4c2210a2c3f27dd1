#![no_main]

use lapso::config::BandwidthScope;
use lapso::probe::network::{bandwidth_total, parse_net_dev};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing arbitrary /proc/net/dev contents must never panic
        let interfaces = parse_net_dev(input);
        let _ = bandwidth_total(&interfaces, BandwidthScope::FirstInterface);
        let _ = bandwidth_total(&interfaces, BandwidthScope::AllInterfaces);
    }
});
