//! CSV output format for section reports
//!
//! One row per section, for spreadsheet analysis. Metric columns are only
//! present for reports built with all metrics.

use crate::report::{BandwidthRecord, ByteValue, MemoryRecord, Report, SectionReport};

const TIMER_COLUMNS: [&str; 4] = ["section", "start", "end", "elapsed"];

const METRIC_COLUMNS: [&str; 9] = [
    "memory_start",
    "memory_end",
    "memory_diff",
    "peak_memory_start",
    "peak_memory_end",
    "peak_memory_diff",
    "bandwidth_start",
    "bandwidth_end",
    "bandwidth_net",
];

/// CSV formatter over a report
#[derive(Debug)]
pub struct CsvReport<'a> {
    report: &'a Report,
}

impl<'a> CsvReport<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Header row based on the report's contents
    fn header(&self) -> String {
        let mut headers = TIMER_COLUMNS.to_vec();
        if self.report.includes_all_metrics() {
            headers.extend_from_slice(&METRIC_COLUMNS);
        }
        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_section(&self, section: &SectionReport) -> String {
        let mut fields = vec![
            Self::escape_field(&section.name),
            number(section.timer.start),
            number(section.timer.end),
            number(section.timer.elapsed),
        ];

        if self.report.includes_all_metrics() {
            fields.extend(memory_fields(section.memory.as_ref()));
            fields.extend(memory_fields(section.peak_memory.as_ref()));
            fields.extend(bandwidth_fields(section.bandwidth.as_ref()));
        }

        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for section in self.report.sections() {
            output.push_str(&self.format_section(section));
            output.push('\n');
        }

        output
    }
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn bytes(value: Option<&ByteValue>) -> String {
    value
        .map(|v| CsvReport::escape_field(&v.to_string()))
        .unwrap_or_default()
}

fn memory_fields(record: Option<&MemoryRecord>) -> [String; 3] {
    match record {
        Some(r) => [bytes(r.start.as_ref()), bytes(r.end.as_ref()), bytes(r.diff.as_ref())],
        None => Default::default(),
    }
}

fn bandwidth_fields(record: Option<&BandwidthRecord>) -> [String; 3] {
    match record {
        Some(r) => [bytes(r.start.as_ref()), bytes(r.end.as_ref()), bytes(r.net.as_ref())],
        None => Default::default(),
    }
}
