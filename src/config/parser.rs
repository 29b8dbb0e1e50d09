//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
    types::CompletionPolicy,
};

/// Configuration parser that layers defaults, `.env`, environment and CLI
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.load_env_file()?;
        self.parse_without_env_file()
    }

    /// Build the configuration from the current environment and the CLI only
    pub fn parse_without_env_file(&self) -> Result<Config> {
        EnvManager::validate_current_env()?;
        let mut config = Config::default();
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Load .env file if it exists
    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if !cli.targets.is_empty() {
            config.targets = cli.targets.clone();
        }
        if !cli.dns_servers.is_empty() {
            config.dns_servers = cli.dns_servers.clone();
        }

        override_with(&mut config.warning_ms, cli.warning);
        override_with(&mut config.critical_ms, cli.critical);
        override_with(&mut config.probe_timeout_ms, cli.timeout);
        override_with(&mut config.deadline_ms, cli.deadline);
        override_with(&mut config.resolve_timeout_ms, cli.resolve_timeout);
        override_with(&mut config.attempts, cli.attempts);
        override_with(&mut config.address_family, cli.address_family());
        override_with(&mut config.socket_kind, cli.socket);
        override_with(&mut config.output_format, cli.format);

        if cli.first_success {
            config.completion_policy = CompletionPolicy::FirstSuccess;
        }

        if cli.no_color {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let dns = match config.dns_config() {
        Ok(dns) => dns.name(),
        Err(_) => config.dns_servers.join(", "),
    };

    let summary = [
        format!("Targets: {}", config.targets.join(", ")),
        format!("Thresholds: warning {}ms, critical {}ms", config.warning_ms, config.critical_ms),
        format!(
            "Timeouts: probe {}ms, resolve {}ms, deadline {}ms",
            config.probe_timeout_ms, config.resolve_timeout_ms, config.deadline_ms
        ),
        format!("Attempts: {}", config.attempts),
        format!("Address family: {}", config.address_family),
        format!("Socket: {}", config.socket_kind),
        format!("Completion: {:?}", config.completion_policy),
        format!("DNS: {}", dns),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
