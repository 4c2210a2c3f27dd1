//! Tracker configuration loaded from a `lapso.toml` file
//!
//! All keys live under a `[tracker]` table. Keys use the camelCase spelling of
//! the original configuration files; snake_case aliases are accepted too.
//!
//! # Example lapso.toml
//!
//! ```toml
//! [tracker]
//! autoStartTracker = true
//! defaultTimezone = "UTC"
//! checkIPs = "127.0.0.1, 10.0.0.7"
//! proxyIPs = ["10.0.0.1"]
//! trackBandwidth = true
//! trackMemory = true
//! bandwidthScope = "first-interface"
//! ```
//!
//! A missing file or key is never an error: defaults apply.

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Environment variable naming the configuration file used by the process-wide tracker
pub const CONFIG_ENV: &str = "LAPSO_CONFIG";

/// Which interfaces contribute to the bandwidth signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BandwidthScope {
    /// rx+tx of the first interface listed by the kernel
    #[default]
    FirstInterface,
    /// rx+tx summed across every listed interface
    AllInterfaces,
}

/// Typed tracker configuration, resolved once when a tracker is constructed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Build the process-wide tracker eagerly in `global::bootstrap`
    #[serde(alias = "auto_start_tracker")]
    pub auto_start_tracker: bool,

    /// Applied process-wide (as `TZ`) at construction
    #[serde(rename = "defaultTimezone", alias = "default_timezone")]
    pub timezone: Option<String>,

    /// Always-trusted caller addresses
    #[serde(rename = "checkIPs", alias = "check_ips", deserialize_with = "ip_list")]
    pub check_ips: Vec<String>,

    /// Known proxy addresses
    #[serde(rename = "proxyIPs", alias = "proxy_ips", deserialize_with = "ip_list")]
    pub proxy_ips: Vec<String>,

    #[serde(alias = "track_bandwidth")]
    pub track_bandwidth: bool,

    #[serde(alias = "track_memory")]
    pub track_memory: bool,

    /// Read `/proc/<pid>/net/dev` instead of the system-wide counters
    #[serde(alias = "bandwidth_pid")]
    pub bandwidth_pid: Option<u32>,

    #[serde(alias = "bandwidth_scope")]
    pub bandwidth_scope: BandwidthScope,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_start_tracker: true,
            timezone: None,
            check_ips: Vec::new(),
            proxy_ips: Vec::new(),
            track_bandwidth: true,
            track_memory: true,
            bandwidth_pid: None,
            bandwidth_scope: BandwidthScope::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tracker: TrackerConfig,
}

impl TrackerConfig {
    /// Parse configuration from TOML text
    ///
    /// Returns `TrackerError::Configuration` when the text is not valid TOML or
    /// the `tracker` entry is not a table.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str::<ConfigFile>(content)
            .map(|file| file.tracker)
            .map_err(|e| TrackerError::Configuration(e.to_string()))
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No tracker configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TrackerError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Best-effort load: any failure is logged and replaced with the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Ignoring tracker configuration {}: {}",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load from the file named by `LAPSO_CONFIG`, or the defaults if unset
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_or_default(path),
            None => Self::default(),
        }
    }
}

/// Split a comma-separated address list, dropping blanks
pub fn split_ip_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IpList {
    Joined(String),
    List(Vec<String>),
}

fn ip_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match IpList::deserialize(deserializer)? {
        IpList::Joined(joined) => split_ip_list(&joined),
        IpList::List(list) => list
            .iter()
            .map(|ip| ip.trim())
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
