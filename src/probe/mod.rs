//! System probes queried by the tracker on every `start`/`end`
//!
//! The tracker only talks to the `SystemProbe` trait; `ProcProbe` is the
//! procfs-backed implementation used by default.

pub mod memory;
pub mod network;

pub use memory::MemorySample;
pub use network::InterfaceCounters;

use crate::config::{BandwidthScope, TrackerConfig};
use crate::error::Result;

/// Source of the memory and bandwidth counters recorded per section
pub trait SystemProbe: Send + Sync {
    /// Current network byte counter (rx+tx) in bytes
    fn bandwidth(&self) -> Result<u64>;

    /// Current resident and peak-resident memory in bytes
    fn memory(&self) -> Result<MemorySample>;
}

/// Whose memory a `ProcProbe` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemorySource {
    /// The tracking process itself
    #[default]
    Process,
    /// Child processes that have exited and been waited for
    Children,
}

/// Probe reading `/proc/net/dev` and `/proc/self/status`
#[derive(Debug, Clone, Default)]
pub struct ProcProbe {
    pid: Option<u32>,
    scope: BandwidthScope,
    memory_source: MemorySource,
}

impl ProcProbe {
    pub fn new(pid: Option<u32>, scope: BandwidthScope) -> Self {
        Self {
            pid,
            scope,
            memory_source: MemorySource::Process,
        }
    }

    pub fn with_memory_source(mut self, source: MemorySource) -> Self {
        self.memory_source = source;
        self
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.bandwidth_pid, config.bandwidth_scope)
    }

    /// Per-interface counters, in kernel order
    pub fn interfaces(&self) -> Result<Vec<InterfaceCounters>> {
        network::read_interfaces(self.pid)
    }
}

impl SystemProbe for ProcProbe {
    fn bandwidth(&self) -> Result<u64> {
        network::bandwidth_total(&self.interfaces()?, self.scope)
    }

    fn memory(&self) -> Result<MemorySample> {
        match self.memory_source {
            MemorySource::Process => memory::read_memory(),
            MemorySource::Children => memory::read_children_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = TrackerConfig {
            bandwidth_pid: Some(1),
            bandwidth_scope: BandwidthScope::AllInterfaces,
            ..TrackerConfig::default()
        };
        let probe = ProcProbe::from_config(&config);
        assert_eq!(probe.pid, Some(1));
        assert_eq!(probe.scope, BandwidthScope::AllInterfaces);
        assert_eq!(probe.memory_source, MemorySource::Process);

        let probe = probe.with_memory_source(MemorySource::Children);
        assert_eq!(probe.memory_source, MemorySource::Children);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_probe_reads_counters() {
        let probe = ProcProbe::default();
        // Containers without a network namespace still list `lo`
        if let Ok(interfaces) = probe.interfaces() {
            if !interfaces.is_empty() {
                assert!(probe.bandwidth().is_ok());
            }
        }
        assert!(probe.memory().unwrap().resident > 0);
    }
}
