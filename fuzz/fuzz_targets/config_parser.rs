#![no_main]

use lapso::TrackerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed configuration is an error, never a panic
        let _ = TrackerConfig::from_toml_str(input);
    }
});
