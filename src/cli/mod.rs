//! Command-line interface

use crate::types::{AddressFamily, OutputFormat, SocketKind};
use clap::{ArgAction, Parser};

/// Ping several hosts at once and report the best round-trip time
///
/// Every target is resolved to all of its addresses and every address is
/// probed concurrently. The result is a monitoring-plugin status line with
/// perfdata; the exit code is 0 (OK), 1 (WARNING), 2 (CRITICAL) or
/// 3 (UNKNOWN).
#[derive(Parser, Debug, Clone)]
#[command(name = "multiping")]
#[command(version = crate::VERSION, long_version = crate::LONG_VERSION, about, long_about)]
pub struct Cli {
    /// Host names or literal addresses to probe
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Best RTT (ms) at or above which the check is WARNING [default: 50]
    #[arg(short, long, value_name = "MS")]
    pub warning: Option<u64>,

    /// Best RTT (ms) at or above which the check is CRITICAL [default: 500]
    #[arg(short, long, value_name = "MS")]
    pub critical: Option<u64>,

    /// Per-probe timeout in milliseconds [default: 1000]
    #[arg(short, long, value_name = "MS", value_parser = parse_millis)]
    pub timeout: Option<u64>,

    /// Global deadline in milliseconds, resolution included [default: 5000]
    #[arg(short, long, value_name = "MS", value_parser = parse_millis)]
    pub deadline: Option<u64>,

    /// Name resolution timeout in milliseconds [default: 2000]
    #[arg(long, value_name = "MS", value_parser = parse_millis)]
    pub resolve_timeout: Option<u64>,

    /// Echo requests per address; retries stop once one beats the warning threshold [default: 1]
    #[arg(short = 'n', long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Only probe IPv4 addresses
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Only probe IPv6 addresses
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// Stop at the first address that answers instead of waiting for all
    #[arg(long)]
    pub first_success: bool,

    /// ICMP socket kind [default: auto]
    #[arg(long, value_enum, value_name = "KIND")]
    pub socket: Option<SocketKind>,

    /// Query this name server instead of the system resolver (repeatable)
    #[arg(long = "dns-server", value_name = "IP", action = ArgAction::Append)]
    pub dns_servers: Vec<String>,

    /// Report format on stdout
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Print an example .env file and exit
    #[arg(long)]
    pub env_example: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print a per-address table on stderr
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Address family selected by `-4`/`-6`, if any
    pub fn address_family(&self) -> Option<AddressFamily> {
        match (self.ipv4, self.ipv6) {
            (true, _) => Some(AddressFamily::V4),
            (_, true) => Some(AddressFamily::V6),
            _ => None,
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse a millisecond count, rejecting zero
fn parse_millis(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|ms| {
            if ms == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if ms > crate::defaults::MAX_TIMEOUT_MS {
                Err(format!("Duration cannot exceed {}ms", crate::defaults::MAX_TIMEOUT_MS))
            } else {
                Ok(ms)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    cfg!(unix)
}
