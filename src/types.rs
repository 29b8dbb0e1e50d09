//! Type definitions and aliases

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// DNS configuration variants supported by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DnsConfig {
    /// Use the platform resolver (honours /etc/hosts)
    System,
    /// Query these name servers directly
    Custom { servers: Vec<IpAddr> },
}

impl DnsConfig {
    /// Get a human-readable name for this DNS configuration
    pub fn name(&self) -> String {
        match self {
            DnsConfig::System => "system".to_string(),
            DnsConfig::Custom { servers } => {
                if servers.len() == 1 {
                    format!("custom DNS ({})", servers[0])
                } else {
                    format!("custom DNS ({} servers)", servers.len())
                }
            }
        }
    }
}

/// Address family filter applied to resolved addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    #[default]
    Any,
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
}

impl AddressFamily {
    /// Whether `addr` passes this filter
    pub fn matches(&self, addr: &IpAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }

    /// Short label used in messages ("IP", "IPv4", "IPv6")
    pub fn label(&self) -> &'static str {
        match self {
            AddressFamily::Any => "IP",
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl FromStr for AddressFamily {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" | "" => Ok(AddressFamily::Any),
            "ipv4" | "v4" | "4" => Ok(AddressFamily::V4),
            "ipv6" | "v6" | "6" => Ok(AddressFamily::V6),
            other => Err(AppError::parse(format!("Invalid address family: {}", other))),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressFamily::Any => "any",
            AddressFamily::V4 => "ipv4",
            AddressFamily::V6 => "ipv6",
        };
        f.write_str(name)
    }
}

/// Kind of ICMP socket to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SocketKind {
    /// Try an unprivileged datagram socket, then fall back to a raw socket
    #[default]
    Auto,
    /// Unprivileged ICMP datagram socket
    Dgram,
    /// Raw ICMP socket (needs CAP_NET_RAW or root)
    Raw,
}

impl FromStr for SocketKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(SocketKind::Auto),
            "dgram" | "datagram" => Ok(SocketKind::Dgram),
            "raw" => Ok(SocketKind::Raw),
            other => Err(AppError::parse(format!("Invalid socket kind: {}", other))),
        }
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocketKind::Auto => "auto",
            SocketKind::Dgram => "dgram",
            SocketKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// When the probe coordinator considers a run complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Wait for every probe to finish or the deadline, so the best RTT is known
    #[default]
    WaitForAll,
    /// Stop as soon as any address answers
    FirstSuccess,
}

/// Report rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Monitoring plugin line with perfdata
    #[default]
    Nagios,
    /// Serialized verdict
    Json,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nagios" => Ok(OutputFormat::Nagios),
            "json" => Ok(OutputFormat::Json),
            other => Err(AppError::parse(format!("Invalid output format: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_family_filter() {
        let v4: IpAddr = "192.0.2.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(AddressFamily::Any.matches(&v4));
        assert!(AddressFamily::Any.matches(&v6));
        assert!(AddressFamily::V4.matches(&v4));
        assert!(!AddressFamily::V4.matches(&v6));
        assert!(AddressFamily::V6.matches(&v6));
        assert!(!AddressFamily::V6.matches(&v4));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("IPv6".parse::<AddressFamily>().unwrap(), AddressFamily::V6);
        assert_eq!("4".parse::<AddressFamily>().unwrap(), AddressFamily::V4);
        assert!("ipv5".parse::<AddressFamily>().is_err());

        assert_eq!("Raw".parse::<SocketKind>().unwrap(), SocketKind::Raw);
        assert_eq!("datagram".parse::<SocketKind>().unwrap(), SocketKind::Dgram);
        assert!("stream".parse::<SocketKind>().is_err());

        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_dns_config_name() {
        assert_eq!(DnsConfig::System.name(), "system");
        let single = DnsConfig::Custom { servers: vec!["9.9.9.9".parse().unwrap()] };
        assert_eq!(single.name(), "custom DNS (9.9.9.9)");
    }
}
