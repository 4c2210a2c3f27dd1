//! Process memory from `/proc/self/status` (or `getrusage` elsewhere), and
//! the peak memory of waited-for child processes

use crate::error::{Result, TrackerError};

/// Resident and peak-resident memory of the current process, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySample {
    pub resident: u64,
    pub peak: u64,
}

/// Parse `VmRSS` and `VmHWM` (reported in kB) out of a `status` file
pub fn parse_status(content: &str) -> Result<MemorySample> {
    let mut resident = None;
    let mut peak = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            resident = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("VmHWM:") {
            peak = parse_kb(rest);
        }
    }

    match (resident, peak) {
        (Some(resident), Some(peak)) => Ok(MemorySample { resident, peak }),
        (Some(resident), None) => Ok(MemorySample {
            resident,
            peak: resident,
        }),
        _ => Err(TrackerError::probe("memory", "VmRSS missing from status")),
    }
}

fn parse_kb(value: &str) -> Option<u64> {
    let kb: u64 = value.split_whitespace().next()?.parse().ok()?;
    kb.checked_mul(1024)
}

#[cfg(target_os = "linux")]
pub fn read_memory() -> Result<MemorySample> {
    let content = std::fs::read_to_string("/proc/self/status")
        .map_err(|e| TrackerError::probe("memory", format!("/proc/self/status: {}", e)))?;
    parse_status(&content)
}

/// Without procfs only the peak is known; it stands in for resident memory too
#[cfg(all(unix, not(target_os = "linux")))]
pub fn read_memory() -> Result<MemorySample> {
    rusage_peak(nix::sys::resource::UsageWho::RUSAGE_SELF)
}

/// Largest peak resident memory among the children waited for so far
///
/// Only the peak is known, so it is reported as resident memory too. Before
/// any child has exited both values are zero.
#[cfg(unix)]
pub fn read_children_memory() -> Result<MemorySample> {
    rusage_peak(nix::sys::resource::UsageWho::RUSAGE_CHILDREN)
}

#[cfg(not(unix))]
pub fn read_children_memory() -> Result<MemorySample> {
    Err(TrackerError::probe("memory", "unsupported platform"))
}

#[cfg(unix)]
fn rusage_peak(who: nix::sys::resource::UsageWho) -> Result<MemorySample> {
    let usage =
        nix::sys::resource::getrusage(who).map_err(|e| TrackerError::probe("memory", e.to_string()))?;
    let max_rss = u64::try_from(usage.max_rss()).unwrap_or(0);
    // macOS reports bytes, Linux and the BSDs kilobytes
    let peak = if cfg!(target_os = "macos") {
        Some(max_rss)
    } else {
        max_rss.checked_mul(1024)
    }
    .ok_or_else(|| TrackerError::probe("memory", "ru_maxrss out of range"))?;
    Ok(MemorySample {
        resident: peak,
        peak,
    })
}

#[cfg(not(unix))]
pub fn read_memory() -> Result<MemorySample> {
    Err(TrackerError::probe("memory", "unsupported platform"))
}
