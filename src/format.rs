//! Human-readable byte counts ("18 MB", "1.46 GB")

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Format a signed byte count in powers of 1024
///
/// The value is rounded to `precision` fractional digits and trailing zeros
/// are dropped, so `18 * 1024 * 1024` renders as `"18 MB"`.
///
/// # Example
/// ```
/// use lapso::format::format_bytes;
///
/// assert_eq!(format_bytes(1_567_000_000, 2), "1.46 GB");
/// assert_eq!(format_bytes(-2048, 2), "-2 KB");
/// ```
pub fn format_bytes(bytes: i64, precision: usize) -> String {
    let sign = if bytes < 0 { "-" } else { "" };
    let magnitude = bytes.unsigned_abs() as f64;

    // Compare the rounded value so 1023.999 KB at two digits becomes 1 MB
    let scale = 10f64.powi(precision.min(15) as i32);
    let rounded = |v: f64| (v * scale).round() / scale;

    let mut unit = 0;
    let mut value = magnitude;
    while rounded(value) >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{:.*}", precision, value);
    let rendered = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };

    format!("{}{} {}", sign, rendered, UNITS[unit])
}
