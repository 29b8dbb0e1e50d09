//! Core formatting trait and the monitoring-line implementations
//!
//! The Nagios formatter produces one status line with performance data,
//! followed by one `warning:` line per target that failed to resolve.

use crate::{
    error::{AppError, Result},
    models::{RttEntry, Status, Verdict},
    PKG_NAME,
};
use std::fmt::Write as _;
use std::time::Duration;

/// Renders a verdict for stdout
pub trait OutputFormatter {
    /// Format the full report for a verdict
    fn format_verdict(&self, verdict: &Verdict) -> Result<String>;
}

/// Seconds with up to six decimals, trailing zeros trimmed
pub fn format_seconds(duration: Duration) -> String {
    let formatted = format!("{:.6}", duration.as_secs_f64());
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Milliseconds rounded to the nearest integer
pub fn format_millis(duration: Duration) -> String {
    format!("{}", (duration.as_secs_f64() * 1000.0).round() as u64)
}

/// Monitoring-plugin status line with perfdata
#[derive(Debug, Clone, Default)]
pub struct NagiosFormatter;

impl NagiosFormatter {
    pub fn new() -> Self {
        Self
    }

    /// One perfdata item: `'addr'=0.0123s;0.05;0.5;0`, or `U` without a value
    pub fn perfdata_entry(entry: &RttEntry, verdict: &Verdict) -> String {
        let value = match entry.rtt {
            Some(rtt) => format!("{}s", format_seconds(rtt)),
            None => "U".to_string(),
        };
        format!(
            "'{}'={};{};{};0",
            entry.target.addr,
            value,
            format_seconds(verdict.thresholds.warning),
            format_seconds(verdict.thresholds.critical)
        )
    }

    pub fn perfdata(verdict: &Verdict) -> String {
        verdict
            .table
            .iter()
            .map(|entry| Self::perfdata_entry(entry, verdict))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn status_line(verdict: &Verdict) -> String {
        if verdict.table.is_empty() {
            return format!("{}: {} - no targets found", PKG_NAME, Status::Unknown);
        }

        let summary = match &verdict.best {
            Some(best) => format!(
                "best rtt {} ms (for {})",
                format_millis(best.rtt),
                best.target.display_name()
            ),
            None => "no data".to_string(),
        };

        format!("{}: {} - {} | {}", PKG_NAME, verdict.status, summary, Self::perfdata(verdict))
    }
}

impl OutputFormatter for NagiosFormatter {
    fn format_verdict(&self, verdict: &Verdict) -> Result<String> {
        let mut output = Self::status_line(verdict);

        for failure in &verdict.warnings {
            write!(output, "\nwarning: {}", failure)
                .map_err(|e| AppError::io(format!("Failed to format warning: {}", e)))?;
        }

        Ok(output)
    }
}

/// The verdict as one JSON document
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_verdict(&self, verdict: &Verdict) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(verdict)?
        } else {
            serde_json::to_string(verdict)?
        };
        Ok(rendered)
    }
}
