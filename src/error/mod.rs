//! Error handling for multiping
//!
//! Only failures that abort a run live here. Per-target resolution failures
//! and per-address probe failures are data (see [`crate::models::probe`]) and
//! never surface as an [`AppError`].

use crate::models::Status;
use thiserror::Error;

/// Errors that abort a multiping run
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or conflicting settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (numbers, addresses, enum values)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// DNS resolver construction errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// The ICMP transport could not be opened
    #[error("Transport setup error: {0}")]
    TransportSetup(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// A bug, not an environment problem
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// The run cannot probe at all; reported as UNKNOWN
    pub fn transport_setup<S: Into<String>>(message: S) -> Self {
        Self::TransportSetup(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::DnsResolution(_) => "DNS",
            Self::TransportSetup(_) => "TRANSPORT",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, MULTIPING_* variables or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check thresholds, timeouts and DNS server addresses.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse value: {}\n\nSuggestion: Numbers are milliseconds, addresses must be literal IPs.", msg)
            }
            Self::DnsResolution(msg) => {
                format!("DNS resolver setup failed: {}\n\nSuggestion: Check the --dns-server addresses or fall back to the system resolver.", msg)
            }
            Self::TransportSetup(msg) => {
                format!("Cannot open ICMP socket: {}\n\nSuggestion: Run with CAP_NET_RAW, as root, or allow unprivileged ICMP via net.ipv4.ping_group_range.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    ///
    /// Monitoring plugins report every failure to produce a result as UNKNOWN.
    pub fn exit_code(&self) -> i32 {
        Status::Unknown.exit_code()
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::DnsResolution(_) | Self::TransportSetup(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("JSON serialization error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Render the report for an error without printing it
    pub fn render(&self, error: &AppError) -> String {
        let mut rendered = format!("{}: {}", crate::PKG_NAME, error.format_for_console(self.use_color));
        if self.verbose {
            rendered.push_str("\n\n");
            rendered.push_str(&error.user_friendly_message());
        }
        rendered
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
