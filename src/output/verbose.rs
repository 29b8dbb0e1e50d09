//! Verbose per-address table
//!
//! Written to stderr next to the monitoring line so the line itself stays
//! machine readable.

use crate::{
    executor::ExecutionSummary,
    models::{RttEntry, Status, Verdict},
};
use super::formatter::format_seconds;
use colored::{Color, Colorize};
use std::time::Duration;

/// Text alignment options
#[derive(Debug, Clone, Copy)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    const fn new(header: &'static str, alignment: Alignment, min_width: usize) -> Self {
        Self { header, alignment, min_width }
    }
}

const COLUMNS: [Column; 4] = [
    Column::new("Target", Alignment::Left, 6),
    Column::new("Address", Alignment::Left, 7),
    Column::new("RTT", Alignment::Right, 8),
    Column::new("Result", Alignment::Left, 6),
];

/// Table of every probed address plus a short summary
pub struct VerboseFormatter {
    use_color: bool,
}

impl VerboseFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Format the table, the verdict line and any resolution warnings
    pub fn format_report(&self, verdict: &Verdict, summary: Option<&ExecutionSummary>) -> String {
        let mut output = String::new();

        if verdict.table.is_empty() {
            output.push_str("No addresses were probed\n");
        } else {
            let rows: Vec<Vec<String>> = verdict.table.iter().map(Self::row).collect();
            output.push_str(&self.create_table(&rows, &verdict.table));
            output.push('\n');
        }

        for failure in &verdict.warnings {
            let line = format!("unresolved: {}", failure);
            output.push_str(&self.paint(&line, Color::Yellow));
            output.push('\n');
        }

        if let Some(summary) = summary {
            output.push_str(&format!(
                "{}/{} address(es) answered ({:.0}%) in {:.1}ms",
                summary.successful,
                summary.total,
                summary.success_rate(),
                summary.elapsed.as_secs_f64() * 1000.0
            ));
            if summary.deadline_hit {
                output.push_str(&format!(", {} cut off by the deadline", summary.deadline_exceeded));
            }
            if summary.cancelled > 0 {
                output.push_str(&format!(", {} cancelled", summary.cancelled));
            }
            output.push('\n');
        }

        let status = format!("Status: {}", verdict.status);
        output.push_str(&self.paint(&status, Self::status_color(verdict.status)));
        output.push('\n');
        output
    }

    fn row(entry: &RttEntry) -> Vec<String> {
        let (rtt, result) = match (&entry.rtt, &entry.failure) {
            (Some(rtt), _) => (Self::format_rtt(*rtt), "reply".to_string()),
            (None, Some(failure)) => ("no data".to_string(), failure.to_string()),
            (None, None) => ("no data".to_string(), String::new()),
        };
        vec![entry.target.host.clone(), entry.target.addr.to_string(), rtt, result]
    }

    fn format_rtt(rtt: Duration) -> String {
        let ms = rtt.as_secs_f64() * 1000.0;
        if ms < 1.0 {
            format!("{}s", format_seconds(rtt))
        } else {
            format!("{:.1}ms", ms)
        }
    }

    pub fn status_color(status: Status) -> Color {
        match status {
            Status::Ok => Color::Green,
            Status::Warning => Color::Yellow,
            Status::Critical => Color::Red,
            Status::Unknown => Color::Magenta,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn create_table(&self, rows: &[Vec<String>], entries: &[RttEntry]) -> String {
        let widths: Vec<usize> = COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                rows.iter()
                    .map(|row| row[idx].chars().count())
                    .chain([column.min_width, column.header.len()])
                    .max()
                    .unwrap_or(column.min_width)
            })
            .collect();

        let border = Self::horizontal_border(&widths);
        let headers: Vec<String> = COLUMNS.iter().map(|c| c.header.to_string()).collect();

        let mut output = String::new();
        output.push_str(&self.paint(&border, Color::BrightBlack));
        output.push('\n');
        output.push_str(&Self::create_row(&headers, &widths, |cell| cell.bold().to_string(), self.use_color));
        output.push('\n');
        output.push_str(&self.paint(&border, Color::BrightBlack));
        output.push('\n');

        for (row, entry) in rows.iter().zip(entries) {
            let color = if entry.rtt.is_some() { Color::Green } else { Color::Red };
            output.push_str(&Self::create_row(row, &widths, |cell| cell.color(color).to_string(), self.use_color));
            output.push('\n');
        }

        output.push_str(&self.paint(&border, Color::BrightBlack));
        output
    }

    /// Pad before painting so escape codes don't skew the widths
    fn create_row(
        cells: &[String],
        widths: &[usize],
        paint: impl Fn(&str) -> String,
        use_color: bool,
    ) -> String {
        let mut row = String::from("|");
        for ((cell, width), column) in cells.iter().zip(widths).zip(COLUMNS.iter()) {
            let padded = Self::align_text(cell, *width, column.alignment);
            row.push(' ');
            if use_color {
                row.push_str(&paint(&padded));
            } else {
                row.push_str(&padded);
            }
            row.push_str(" |");
        }
        row
    }

    fn horizontal_border(widths: &[usize]) -> String {
        let mut border = String::from("+");
        for width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
        match alignment {
            Alignment::Left => format!("{:<width$}", text, width = width),
            Alignment::Right => format!("{:>width$}", text, width = width),
        }
    }
}
