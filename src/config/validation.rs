//! Configuration validation beyond the hard rules in `Config::validate`
//!
//! These checks never reject a configuration. They point out settings that
//! are legal but probably not what the operator meant.

use crate::{error::Result, models::Config, types::SocketKind};
use std::collections::HashSet;
use std::net::IpAddr;

/// Configuration validator with advisory rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run `Config::validate`, then collect advisory warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_targets(config));
        warnings.extend(Self::validate_timing(config));
        warnings.extend(Self::validate_thresholds(config));
        warnings.extend(Self::validate_transport(config));
        Ok(warnings)
    }

    fn validate_targets(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for target in &config.targets {
            let target = target.trim();
            if !seen.insert(target.to_lowercase()) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Target '{}' is listed more than once", target),
                ));
            }

            if let Ok(addr) = target.parse::<IpAddr>() {
                if addr.is_loopback() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("Target '{}' is a loopback address and says nothing about outside connectivity", target),
                    ));
                }
                if !config.address_family.matches(&addr) {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("Target '{}' is excluded by the {} address filter", target, config.address_family),
                    ));
                }
            }
        }

        if !config.dns_servers.is_empty() && config.targets.iter().all(|t| t.trim().parse::<IpAddr>().is_ok()) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "DNS servers are configured but every target is a literal address".to_string(),
            ));
        }

        warnings
    }

    fn validate_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let needed = u64::from(config.attempts) * config.probe_timeout_ms;
        if config.attempts > 1 && needed > config.deadline_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} attempts of {}ms may not fit in the {}ms deadline",
                    config.attempts, config.probe_timeout_ms, config.deadline_ms
                ),
            ));
        }

        if config.resolve_timeout_ms >= config.deadline_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Resolve timeout of {}ms can use up the whole {}ms deadline",
                    config.resolve_timeout_ms, config.deadline_ms
                ),
            ));
        }

        warnings
    }

    fn validate_thresholds(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.warning_ms == config.critical_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Warning and critical thresholds are equal, the check never reports WARNING".to_string(),
            ));
        }

        if config.probe_timeout_ms <= config.warning_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Probe timeout of {}ms is not above the {}ms warning threshold; slow replies count as lost",
                    config.probe_timeout_ms, config.warning_ms
                ),
            ));
        } else if config.probe_timeout_ms <= config.critical_ms {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Probe timeout of {}ms is not above the {}ms critical threshold; CRITICAL only means no reply",
                    config.probe_timeout_ms, config.critical_ms
                ),
            ));
        }

        warnings
    }

    fn validate_transport(config: &Config) -> Vec<ValidationWarning> {
        match config.socket_kind {
            SocketKind::Raw => vec![ValidationWarning::new(
                ValidationLevel::Info,
                "Raw ICMP sockets need root or CAP_NET_RAW".to_string(),
            )],
            _ => Vec::new(),
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }
}

/// Convenience function for comprehensive validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressFamily;

    fn config(targets: &[&str]) -> Config {
        Config {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Config::default()
        }
    }

    fn messages(config: &Config) -> Vec<String> {
        validate_config(config)
            .unwrap()
            .into_iter()
            .map(|w| w.message)
            .collect()
    }

    #[test]
    fn test_defaults_are_quiet() {
        assert!(messages(&config(&["example.net", "192.0.2.1"])).is_empty());
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(validate_config(&config(&[])).is_err());
    }

    #[test]
    fn test_attempts_exceeding_deadline() {
        let config = Config {
            attempts: 6,
            ..config(&["example.net"])
        };
        let messages = messages(&config);
        assert!(messages.iter().any(|m| m.contains("may not fit in the 5000ms deadline")));
    }

    #[test]
    fn test_target_checks() {
        let config = Config {
            address_family: AddressFamily::V6,
            ..config(&["127.0.0.1", "Example.net", "example.net"])
        };
        let messages = messages(&config);

        assert!(messages.iter().any(|m| m.contains("loopback")));
        assert!(messages.iter().any(|m| m.contains("excluded by the ipv6 address filter")));
        assert!(messages.iter().any(|m| m.contains("listed more than once")));
    }

    #[test]
    fn test_threshold_checks() {
        let config = Config {
            warning_ms: 100,
            critical_ms: 100,
            probe_timeout_ms: 100,
            ..config(&["example.net"])
        };
        let warnings = validate_config(&config).unwrap();

        assert!(warnings.iter().any(|w| w.message.contains("never reports WARNING")));
        assert!(warnings
            .iter()
            .any(|w| w.level == ValidationLevel::Warning && w.message.contains("slow replies count as lost")));
    }

    #[test]
    fn test_literal_targets_with_dns_servers() {
        let config = Config {
            dns_servers: vec!["192.0.2.53".to_string()],
            ..config(&["192.0.2.1"])
        };
        assert!(messages(&config).iter().any(|m| m.contains("every target is a literal address")));
    }
}
