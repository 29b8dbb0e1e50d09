//! Configuration data model and validation

use crate::defaults::*;
use crate::models::verdict::Thresholds;
use crate::types::{AddressFamily, AppError, CompletionPolicy, DnsConfig, OutputFormat, Result, SocketKind};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Prefix shared by every environment variable multiping reads
pub const ENV_PREFIX: &str = "MULTIPING_";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target specifiers (hostnames or literal addresses)
    #[serde(default)]
    pub targets: Vec<String>,

    /// RTT at or above which the check is WARNING
    #[serde(default = "default_warning_ms")]
    pub warning_ms: u64,

    /// RTT at or above which the check is CRITICAL
    #[serde(default = "default_critical_ms")]
    pub critical_ms: u64,

    /// Per-probe timeout
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Global deadline for the whole invocation, resolution included
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Echo requests per address
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default)]
    pub address_family: AddressFamily,

    #[serde(default)]
    pub socket_kind: SocketKind,

    #[serde(default)]
    pub completion_policy: CompletionPolicy,

    /// Name servers to query instead of the system resolver
    #[serde(default)]
    pub dns_servers: Vec<String>,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            warning_ms: default_warning_ms(),
            critical_ms: default_critical_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            deadline_ms: default_deadline_ms(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            attempts: default_attempts(),
            address_family: AddressFamily::default(),
            socket_kind: SocketKind::default(),
            completion_policy: CompletionPolicy::default(),
            dns_servers: Vec::new(),
            output_format: OutputFormat::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::from_millis(self.warning_ms, self.critical_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Resolution budget, never longer than the global deadline
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms.min(self.deadline_ms))
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(AppError::validation("At least one target is required"));
        }

        if self.targets.iter().any(|target| target.trim().is_empty()) {
            return Err(AppError::validation("Target cannot be empty"));
        }

        if self.warning_ms > self.critical_ms {
            return Err(AppError::validation(format!(
                "Warning threshold ({} ms) cannot exceed critical threshold ({} ms)",
                self.warning_ms, self.critical_ms
            )));
        }

        for (name, value) in [
            ("Probe timeout", self.probe_timeout_ms),
            ("Deadline", self.deadline_ms),
            ("Resolve timeout", self.resolve_timeout_ms),
        ] {
            if value == 0 {
                return Err(AppError::validation(format!("{} must be greater than 0", name)));
            }
            if value > MAX_TIMEOUT_MS {
                return Err(AppError::validation(format!(
                    "{} cannot exceed {} ms",
                    name, MAX_TIMEOUT_MS
                )));
            }
        }

        if self.probe_timeout_ms > self.deadline_ms {
            return Err(AppError::validation(format!(
                "Probe timeout ({} ms) cannot exceed the deadline ({} ms)",
                self.probe_timeout_ms, self.deadline_ms
            )));
        }

        if self.attempts == 0 {
            return Err(AppError::validation("Attempts must be greater than 0"));
        }

        if self.attempts > MAX_ATTEMPTS {
            return Err(AppError::validation(format!("Attempts cannot exceed {}", MAX_ATTEMPTS)));
        }

        for dns_server in &self.dns_servers {
            if IpAddr::from_str(dns_server).is_err() {
                return Err(AppError::validation(format!("Invalid DNS server IP address: {}", dns_server)));
            }
        }

        Ok(())
    }

    /// Resolver configuration derived from the DNS server list
    pub fn dns_config(&self) -> Result<DnsConfig> {
        if self.dns_servers.is_empty() {
            return Ok(DnsConfig::System);
        }

        let servers = self
            .dns_servers
            .iter()
            .map(|server| {
                IpAddr::from_str(server).map_err(|e| {
                    AppError::dns_resolution(format!("Failed to parse DNS server {}: {}", server, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DnsConfig::Custom { servers })
    }

    /// Merge `MULTIPING_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(targets) = env_var("TARGETS") {
            self.targets = split_list(&targets);
        }

        if let Some(dns_servers) = env_var("DNS_SERVERS") {
            self.dns_servers = split_list(&dns_servers);
        }

        merge_parsed("WARNING_MS", &mut self.warning_ms)?;
        merge_parsed("CRITICAL_MS", &mut self.critical_ms)?;
        merge_parsed("TIMEOUT_MS", &mut self.probe_timeout_ms)?;
        merge_parsed("DEADLINE_MS", &mut self.deadline_ms)?;
        merge_parsed("RESOLVE_TIMEOUT_MS", &mut self.resolve_timeout_ms)?;
        merge_parsed("ATTEMPTS", &mut self.attempts)?;
        merge_parsed("ADDRESS_FAMILY", &mut self.address_family)?;
        merge_parsed("SOCKET", &mut self.socket_kind)?;
        merge_parsed("ENABLE_COLOR", &mut self.enable_color)?;

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn merge_parsed<T>(name: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = env_var(name) {
        *slot = raw.trim().parse().map_err(|e| {
            AppError::config(format!("Invalid {}{} value '{}': {}", ENV_PREFIX, name, raw, e))
        })?;
    }
    Ok(())
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default value functions for serde
fn default_warning_ms() -> u64 {
    DEFAULT_WARNING_MS
}

fn default_critical_ms() -> u64 {
    DEFAULT_CRITICAL_MS
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_deadline_ms() -> u64 {
    DEFAULT_DEADLINE_MS
}

fn default_resolve_timeout_ms() -> u64 {
    DEFAULT_RESOLVE_TIMEOUT_MS
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}

fn default_enable_color() -> bool {
    DEFAULT_ENABLE_COLOR
}
