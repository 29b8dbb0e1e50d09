//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::config::{split_list, ENV_PREFIX};
use crate::types::{AddressFamily, SocketKind};
use std::net::IpAddr;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    ///
    /// Variables already present in the environment win over the file.
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# multiping configuration
#
# Values here are used as defaults and can be overridden by real
# environment variables and by command-line arguments.

# Targets to probe (comma-separated host names or addresses)
# MULTIPING_TARGETS=example.net,192.0.2.1,2001:db8::1

# Best RTT thresholds in milliseconds
# MULTIPING_WARNING_MS=50
# MULTIPING_CRITICAL_MS=500

# Per-probe timeout, global deadline and name resolution timeout (ms)
# MULTIPING_TIMEOUT_MS=1000
# MULTIPING_DEADLINE_MS=5000
# MULTIPING_RESOLVE_TIMEOUT_MS=2000

# Echo requests per address (1-10)
# MULTIPING_ATTEMPTS=1

# Address family: any, ipv4 or ipv6
# MULTIPING_ADDRESS_FAMILY=any

# ICMP socket kind: auto, dgram or raw
# MULTIPING_SOCKET=auto

# Name servers to query instead of the system resolver (comma-separated)
# MULTIPING_DNS_SERVERS=192.0.2.53,2001:db8::53

# Enable colored output (true/false)
# MULTIPING_ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Validate one variable, given its name without the prefix
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| AppError::config(format!("Invalid {}{} value '{}': {}", ENV_PREFIX, key, value, reason));

        match key {
            "TARGETS" => {
                if split_list(value).is_empty() {
                    return Err(invalid("no targets listed".to_string()));
                }
            }
            "DNS_SERVERS" => {
                for server in split_list(value) {
                    server.parse::<IpAddr>().map_err(|e| invalid(format!("{}: {}", server, e)))?;
                }
            }
            "WARNING_MS" | "CRITICAL_MS" => {
                value.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
            }
            "TIMEOUT_MS" | "DEADLINE_MS" | "RESOLVE_TIMEOUT_MS" => {
                let ms: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if ms == 0 || ms > crate::defaults::MAX_TIMEOUT_MS {
                    return Err(invalid(format!("must be between 1 and {}", crate::defaults::MAX_TIMEOUT_MS)));
                }
            }
            "ATTEMPTS" => {
                let attempts: u32 = value.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if attempts == 0 || attempts > crate::defaults::MAX_ATTEMPTS {
                    return Err(invalid(format!("must be between 1 and {}", crate::defaults::MAX_ATTEMPTS)));
                }
            }
            "ADDRESS_FAMILY" => {
                value.parse::<AddressFamily>().map_err(|e| invalid(e.to_string()))?;
            }
            "SOCKET" => {
                value.parse::<SocketKind>().map_err(|e| invalid(e.to_string()))?;
            }
            "ENABLE_COLOR" => {
                value.trim().parse::<bool>().map_err(|e| invalid(e.to_string()))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("MULTIPING_TARGETS", "Comma-separated targets to probe", "example.net,192.0.2.1"),
            ("MULTIPING_WARNING_MS", "WARNING threshold in ms", "50"),
            ("MULTIPING_CRITICAL_MS", "CRITICAL threshold in ms", "500"),
            ("MULTIPING_TIMEOUT_MS", "Per-probe timeout in ms", "1000"),
            ("MULTIPING_DEADLINE_MS", "Global deadline in ms", "5000"),
            ("MULTIPING_RESOLVE_TIMEOUT_MS", "Name resolution timeout in ms", "2000"),
            ("MULTIPING_ATTEMPTS", "Echo requests per address (1-10)", "1"),
            ("MULTIPING_ADDRESS_FAMILY", "any, ipv4 or ipv6", "any"),
            ("MULTIPING_SOCKET", "auto, dgram or raw", "auto"),
            ("MULTIPING_DNS_SERVERS", "Comma-separated name server IPs", "192.0.2.53"),
            ("MULTIPING_ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Check every set `MULTIPING_*` variable, failing on the first bad value
    pub fn validate_current_env() -> Result<()> {
        for (var_name, _, _) in Self::get_supported_env_vars() {
            let (Some(key), Ok(value)) = (var_name.strip_prefix(ENV_PREFIX), std::env::var(var_name)) else {
                continue;
            };
            Self::validate_env_var(key, &value)?;
        }
        Ok(())
    }
}
