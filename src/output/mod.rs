//! Output formatting
//!
//! The verdict goes to stdout as a monitoring line or as JSON. Verbose mode
//! adds a per-address table on stderr.

mod formatter;
mod verbose;

pub use formatter::{format_millis, format_seconds, JsonFormatter, NagiosFormatter, OutputFormatter};
pub use verbose::{Alignment, Column, VerboseFormatter};

use crate::types::OutputFormat;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create the stdout formatter for the requested format
    pub fn create(format: OutputFormat) -> Box<dyn OutputFormatter + Send + Sync> {
        match format {
            OutputFormat::Nagios => Box::new(NagiosFormatter::new()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
        }
    }

    /// Create the stderr table formatter
    pub fn create_verbose(enable_color: bool) -> VerboseFormatter {
        VerboseFormatter::new(enable_color)
    }
}
