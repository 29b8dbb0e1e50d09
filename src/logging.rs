//! Structured logging for multiping
//!
//! Entries are leveled, carry structured fields and render as console text,
//! JSON or a compact one-liner. Everything goes to stderr: stdout belongs to
//! the monitoring line.

use crate::error::{AppError, Result};
use crate::models::{Config, ProbeOutcome, ProbeTarget, ResolutionFailure, Verdict};
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// The run is aborted
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::White,
            LogLevel::Debug => Color::Cyan,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
            LogLevel::Fatal => Color::Magenta,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component that wrote the entry (APP, PROBE, ERR)
    pub logger: String,
    /// Ties together the entries of one address or one session
    pub correlation_id: Option<String>,
    /// Sorted so console output is stable
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable, the default
    Console,
    /// One JSON object per line, used with `--debug`
    Json,
    Compact,
}

/// Logger writing structured entries to stderr
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    /// Set once by the factory, shared by clones
    session_id: Arc<RwLock<Option<String>>>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Warn,
            use_color: true,
            format: LogFormat::Console,
            name,
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Warn by default, Info with `--verbose`, Debug rendered as JSON with
    /// `--debug`
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            ..Self::new(name)
        }
    }

    /// A logger that only lets fatal entries through
    pub fn silent() -> Self {
        Self {
            min_level: LogLevel::Fatal,
            format: LogFormat::Compact,
            ..Self::new("SILENT".to_string())
        }
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub async fn set_session_id(&self, session_id: String) {
        *self.session_id.write().await = Some(session_id);
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Error, message)
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        if let Some(session_id) = self.session_id.read().await.as_ref() {
            let session = serde_json::Value::String(session_id.clone());
            entry.fields.insert("session".to_string(), session);
        }

        let _ = writeln!(io::stderr(), "{}", self.render(&entry));
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let level = format!("{:>5}", entry.level.as_str());
        let level = if self.use_color {
            level.color(entry.level.color()).to_string()
        } else {
            level
        };

        let mut output = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields: Vec<String> =
                entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|_| {
            format!("{{\"level\":\"{}\",\"unserializable\":true}}", entry.level.as_str())
        })
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        format!(
            "{} {} {}: {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Fluent builder, finished with [`LogEntryBuilder::log`]
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field; values that fail to serialize are dropped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add the fields describing one probe outcome
    pub fn outcome(self, target: &ProbeTarget, outcome: &ProbeOutcome) -> Self {
        let builder = self
            .field("target", &target.host)
            .field("address", target.addr)
            .field("success", outcome.is_success());
        match outcome {
            ProbeOutcome::Success { rtt } => builder.field("rtt_ms", rtt.as_secs_f64() * 1000.0),
            ProbeOutcome::Failure(reason) => builder.field("failure", reason),
        }
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for resolution, transport and probe events
#[derive(Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PROBE".to_string(), config),
        }
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn log_resolution(&self, host: &str, addresses: &[ProbeTarget], duration: Duration) {
        let addrs: Vec<_> = addresses.iter().map(|t| t.addr).collect();
        self.logger
            .debug(&format!("Resolved {} to {} address(es)", host, addresses.len()))
            .field("target", host)
            .field("addresses", addrs)
            .field("duration_ms", duration.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    pub async fn log_resolution_failure(&self, failure: &ResolutionFailure) {
        self.logger
            .warn(&format!("Could not resolve {}: {}", failure.target, failure.reason))
            .field("target", &failure.target)
            .field("reason", &failure.reason)
            .log()
            .await;
    }

    pub async fn log_transport_open(&self, family: &str, kind: &str) {
        self.logger
            .debug(&format!("Opened {} ICMP socket ({})", family, kind))
            .field("family", family)
            .field("socket", kind)
            .log()
            .await;
    }

    pub async fn log_transport_unavailable(&self, family: &str) {
        self.logger
            .warn(&format!("No {} ICMP socket, {} addresses will fail", family, family))
            .field("family", family)
            .log()
            .await;
    }

    pub async fn log_probe_outcome(
        &self,
        target: &ProbeTarget,
        attempt: u32,
        outcome: &ProbeOutcome,
    ) {
        let name = target.display_name();
        let message = match outcome {
            ProbeOutcome::Success { rtt } => {
                format!("Reply from {} in {:.3}ms", name, rtt.as_secs_f64() * 1000.0)
            }
            ProbeOutcome::Failure(reason) => format!("No reply from {}: {}", name, reason),
        };

        self.logger
            .debug(&message)
            .correlation_id(&target.addr.to_string())
            .field("attempt", attempt)
            .outcome(target, outcome)
            .log()
            .await;
    }

    pub async fn log_deadline(&self, outstanding: usize, deadline: Duration) {
        let message = format!(
            "Deadline of {}ms reached with {} probe(s) outstanding",
            deadline.as_millis(),
            outstanding
        );
        self.logger
            .info(&message)
            .field("outstanding", outstanding)
            .field("deadline_ms", deadline.as_millis() as u64)
            .log()
            .await;
    }

    pub async fn log_verdict(&self, verdict: &Verdict, elapsed: Duration) {
        let message = format!(
            "Verdict {}: {}/{} address(es) answered",
            verdict.status,
            verdict.successful_count(),
            verdict.table.len()
        );
        let mut builder = self
            .logger
            .info(&message)
            .field("status", verdict.status)
            .field("elapsed_ms", elapsed.as_secs_f64() * 1000.0);

        if let Some(best) = &verdict.best {
            builder = builder
                .field("best_rtt_ms", best.rtt.as_secs_f64() * 1000.0)
                .field("best_address", best.target.addr);
        }

        builder.log().await;
    }
}

/// Logger for fatal errors, used in debug mode
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    /// Log an error with its category and optional context
    pub async fn log_error(
        &self,
        error: &AppError,
        context: Option<&str>,
        correlation_id: Option<&str>,
    ) {
        let message = if let Some(ctx) = context {
            format!("{}: {}", ctx, error)
        } else {
            error.to_string()
        };

        let mut builder = self.logger.error(&message).error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }

        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Logger factory sharing one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::from_logger(self.create_logger("PROBE").await)
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::new(&self.config)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
