//! Aggregated section report
//!
//! A report is an ordered map of section name to either the timer record
//! (timers-only) or a nested `{timer, bandwidth, memory, peak_memory}` map.
//! Serialized with serde_json it looks like:
//!
//! ```json
//! {"Main": {"start": 1747692775.0152, "end": 1747692776.139, "elapsed": 1.12378}}
//! ```

use crate::format::format_bytes;
use crate::section::{Counter, Section, Timer};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::Write as _;

/// What a report includes and how byte values are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Include bandwidth, memory and peak memory per section
    pub all_metrics: bool,
    /// Render byte counts as strings like "18 MB"
    pub human_bytes: bool,
    /// Fractional digits for human-readable byte counts
    pub precision: usize,
}

impl ReportOptions {
    pub fn timers_only() -> Self {
        Self {
            all_metrics: false,
            human_bytes: false,
            precision: 2,
        }
    }

    pub fn all_metrics() -> Self {
        Self {
            all_metrics: true,
            ..Self::timers_only()
        }
    }

    pub fn with_human_bytes(mut self, human_bytes: bool) -> Self {
        self.human_bytes = human_bytes;
        self
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::timers_only()
    }
}

/// A byte count, raw or formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ByteValue {
    Bytes(i64),
    Human(String),
}

impl ByteValue {
    fn new(bytes: i64, options: &ReportOptions) -> Self {
        if options.human_bytes {
            ByteValue::Human(format_bytes(bytes, options.precision))
        } else {
            ByteValue::Bytes(bytes)
        }
    }

    /// Raw byte count, if not formatted
    pub fn as_bytes(&self) -> Option<i64> {
        match self {
            ByteValue::Bytes(bytes) => Some(*bytes),
            ByteValue::Human(_) => None,
        }
    }
}

impl std::fmt::Display for ByteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteValue::Bytes(bytes) => write!(f, "{}", bytes),
            ByteValue::Human(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

impl From<&Timer> for TimerRecord {
    fn from(timer: &Timer) -> Self {
        Self {
            start: timer.start,
            end: timer.end,
            elapsed: timer.elapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandwidthRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ByteValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ByteValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<ByteValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<ByteValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<ByteValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ByteValue>,
}

fn snapshot(value: Option<u64>, options: &ReportOptions) -> Option<ByteValue> {
    value.map(|v| ByteValue::new(i64::try_from(v).unwrap_or(i64::MAX), options))
}

fn bandwidth_record(counter: &Counter, options: &ReportOptions) -> BandwidthRecord {
    BandwidthRecord {
        start: snapshot(counter.start, options),
        end: snapshot(counter.end, options),
        net: counter.delta.map(|d| ByteValue::new(d, options)),
    }
}

fn memory_record(counter: &Counter, options: &ReportOptions) -> MemoryRecord {
    MemoryRecord {
        start: snapshot(counter.start, options),
        end: snapshot(counter.end, options),
        diff: counter.delta.map(|d| ByteValue::new(d, options)),
    }
}

/// Per-section entry of a full report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    #[serde(skip)]
    pub name: String,
    pub timer: TimerRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<BandwidthRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory: Option<MemoryRecord>,
}

impl SectionReport {
    pub fn from_section(section: &Section, options: &ReportOptions) -> Self {
        let metrics = options.all_metrics;
        Self {
            name: section.name.clone(),
            timer: TimerRecord::from(&section.timer),
            bandwidth: section
                .bandwidth
                .as_ref()
                .filter(|_| metrics)
                .map(|c| bandwidth_record(c, options)),
            memory: section
                .memory
                .as_ref()
                .filter(|_| metrics)
                .map(|c| memory_record(c, options)),
            peak_memory: section
                .peak_memory
                .as_ref()
                .filter(|_| metrics)
                .map(|c| memory_record(c, options)),
        }
    }
}

/// Report over every section, in first-start order
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    all_metrics: bool,
    sections: Vec<SectionReport>,
}

impl Report {
    pub fn new<'a, I>(sections: I, options: &ReportOptions) -> Self
    where
        I: IntoIterator<Item = &'a Section>,
    {
        Self {
            all_metrics: options.all_metrics,
            sections: sections
                .into_iter()
                .map(|s| SectionReport::from_section(s, options))
                .collect(),
        }
    }

    pub fn includes_all_metrics(&self) -> bool {
        self.all_metrics
    }

    pub fn sections(&self) -> &[SectionReport] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn timer(&self, name: &str) -> Option<&TimerRecord> {
        self.section(name).map(|s| &s.timer)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Aligned text table, one row per section
    pub fn render_text(&self) -> String {
        let width = self
            .sections
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max("section".len());

        let mut out = String::new();
        let _ = write!(out, "{:<width$}  {:>12}", "section", "elapsed", width = width);
        if self.all_metrics {
            let _ = write!(out, "  {:>14}  {:>14}  {:>14}", "memory", "peak memory", "bandwidth");
        }
        out.push('\n');

        for section in &self.sections {
            let elapsed = match section.timer.elapsed {
                Some(secs) => format!("{:.5}s", secs),
                None => "running".to_string(),
            };
            let _ = write!(out, "{:<width$}  {:>12}", section.name, elapsed, width = width);
            if self.all_metrics {
                let memory = section.memory.as_ref().and_then(|m| m.diff.as_ref());
                let peak = section.peak_memory.as_ref().and_then(|m| m.diff.as_ref());
                let bandwidth = section.bandwidth.as_ref().and_then(|b| b.net.as_ref());
                let _ = write!(
                    out,
                    "  {:>14}  {:>14}  {:>14}",
                    cell(memory),
                    cell(peak),
                    cell(bandwidth)
                );
            }
            out.push('\n');
        }
        out
    }
}

fn cell(value: Option<&ByteValue>) -> String {
    value.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            if self.all_metrics {
                map.serialize_entry(&section.name, section)?;
            } else {
                map.serialize_entry(&section.name, &section.timer)?;
            }
        }
        map.end()
    }
}
