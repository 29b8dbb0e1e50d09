//! multiping
//!
//! Pings several hosts at once to test outside connectivity. Every target is
//! resolved to its addresses, all addresses are probed concurrently with ICMP
//! echo requests under one global deadline, and the lowest round-trip time is
//! reported in a format monitoring systems (Nagios, Icinga) understand.

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod icmp;
pub mod logging;
pub mod models;
pub mod output;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, ProbeFailure, ProbeOutcome, ProbeSet, ProbeTarget, Status, Thresholds, Verdict};
pub use executor::{ProbeCoordinator, Prober};
pub use output::{OutputFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Version string shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    " for ",
    env!("TARGET_TRIPLE"),
    ")"
);

/// Default configuration values
pub mod defaults {
    /// RTT at or above which the check turns WARNING
    pub const DEFAULT_WARNING_MS: u64 = 50;
    /// RTT at or above which the check turns CRITICAL
    pub const DEFAULT_CRITICAL_MS: u64 = 500;
    /// Upper bound for a single echo/reply cycle
    pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_000;
    /// Upper bound for the whole invocation
    pub const DEFAULT_DEADLINE_MS: u64 = 5_000;
    pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 2_000;
    pub const DEFAULT_ATTEMPTS: u32 = 1;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MAX_TIMEOUT_MS: u64 = 60_000;
    pub const MAX_ATTEMPTS: u32 = 10;
}
