//! Network byte counters from `/proc/net/dev`
//!
//! ```text
//! Inter-|   Receive                                                |  Transmit
//!  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets ...
//!     lo:  123456     789    0    0    0     0          0         0   123456     789 ...
//!   eth0: 9876543    4321    0    0    0     0          0         0  1234567    1234 ...
//! ```

use crate::config::BandwidthScope;
use crate::error::{Result, TrackerError};
use std::path::PathBuf;

/// Number of receive columns preceding the transmit byte count
const RECEIVE_COLUMNS: usize = 8;

/// Byte counters of one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCounters {
    pub name: String,
    pub receive: u64,
    pub transmit: u64,
}

impl InterfaceCounters {
    pub fn total(&self) -> u64 {
        self.receive.saturating_add(self.transmit)
    }
}

/// Parse the contents of a `net/dev` file, keeping the kernel's interface order
///
/// Header lines and lines that do not carry numeric counters are skipped.
pub fn parse_net_dev(content: &str) -> Vec<InterfaceCounters> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<InterfaceCounters> {
    let (name, counters) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains('|') {
        return None;
    }

    let fields: Vec<&str> = counters.split_whitespace().collect();
    let receive = fields.first()?.parse().ok()?;
    let transmit = fields.get(RECEIVE_COLUMNS)?.parse().ok()?;

    Some(InterfaceCounters {
        name: name.to_string(),
        receive,
        transmit,
    })
}

/// Collapse interface counters into the tracker's bandwidth signal
///
/// `FirstInterface` uses only the first listed interface (usually `lo`).
pub fn bandwidth_total(interfaces: &[InterfaceCounters], scope: BandwidthScope) -> Result<u64> {
    match scope {
        BandwidthScope::FirstInterface => interfaces
            .first()
            .map(InterfaceCounters::total)
            .ok_or_else(|| TrackerError::probe("bandwidth", "no network interfaces listed")),
        BandwidthScope::AllInterfaces => {
            if interfaces.is_empty() {
                return Err(TrackerError::probe("bandwidth", "no network interfaces listed"));
            }
            Ok(interfaces
                .iter()
                .fold(0u64, |acc, iface| acc.saturating_add(iface.total())))
        }
    }
}

/// Path of the counters file, per process when a PID is given
pub fn net_dev_path(pid: Option<u32>) -> PathBuf {
    match pid {
        Some(pid) => PathBuf::from(format!("/proc/{}/net/dev", pid)),
        None => PathBuf::from("/proc/net/dev"),
    }
}

/// Read and parse the counters of every interface
#[cfg(target_os = "linux")]
pub fn read_interfaces(pid: Option<u32>) -> Result<Vec<InterfaceCounters>> {
    let path = net_dev_path(pid);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| TrackerError::probe("bandwidth", format!("{}: {}", path.display(), e)))?;
    Ok(parse_net_dev(&content))
}

#[cfg(not(target_os = "linux"))]
pub fn read_interfaces(_pid: Option<u32>) -> Result<Vec<InterfaceCounters>> {
    Err(TrackerError::probe("bandwidth", "unsupported platform"))
}
