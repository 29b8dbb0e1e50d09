//! Main application orchestration and execution
//!
//! One invocation: resolve every target, open the ICMP sockets the resolved
//! addresses need, probe them all under the global deadline, and reduce the
//! results to a verdict.

use crate::{
    dns::{DnsManager, ResolvedTargets},
    error::Result,
    executor::{ExecutionConfig, ExecutionSummary, ProbeCoordinator, Prober},
    icmp::{IpVersion, Pinger},
    logging::{LoggerFactory, ProbeLogger},
    models::{Config, ProbeSet, ProbeTarget, ResolutionFailure, Verdict},
    output::{OutputFormatterFactory, VerboseFormatter},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub verdict: Verdict,
    /// Absent when no address was resolved and nothing was probed
    pub summary: Option<ExecutionSummary>,
    /// Report for stdout
    pub rendered: String,
    /// Per-address table for stderr, in verbose mode
    pub verbose: Option<String>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    loggers: LoggerFactory,
}

impl App {
    /// Create a new application instance from a validated configuration
    pub fn new(config: Config) -> Self {
        let loggers = LoggerFactory::new(config.clone());
        Self { config, loggers }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn loggers(&self) -> &LoggerFactory {
        &self.loggers
    }

    /// Run one check against real ICMP sockets
    pub async fn run(&self) -> Result<RunReport> {
        let kind = self.config.socket_kind;
        self.run_with(|versions: &[IpVersion]| {
            let pinger = Pinger::open(kind, versions)?;
            let opened: Vec<(IpVersion, String)> = versions
                .iter()
                .filter_map(|&version| pinger.socket_kind(version).map(|kind| (version, kind.to_string())))
                .collect();
            Ok((Arc::new(pinger) as Arc<dyn Prober>, opened))
        })
        .await
    }

    /// Run one check, probing through whatever `open` returns
    ///
    /// `open` is only called when at least one address was resolved, with the
    /// IP versions those addresses need. Its error aborts the run; a version
    /// missing from the opened list only fails the addresses of that family.
    pub async fn run_with<F>(&self, open: F) -> Result<RunReport>
    where
        F: FnOnce(&[IpVersion]) -> Result<(Arc<dyn Prober>, Vec<(IpVersion, String)>)>,
    {
        let started = Instant::now();
        let deadline = started + self.config.deadline();
        let logger = self.loggers.create_probe_logger().await;

        let resolved = self.resolve(deadline, &logger).await?;

        let (probe_set, summary) = if resolved.is_empty() {
            (ProbeSet::new(), None)
        } else {
            let versions = IpVersion::required_by(&resolved.targets);
            let (prober, opened) = open(&versions)?;
            for (version, kind) in &opened {
                logger.log_transport_open(&version.to_string(), kind).await;
            }
            for version in versions.iter().filter(|v| !opened.iter().any(|(o, _)| o == *v)) {
                logger.log_transport_unavailable(&version.to_string()).await;
            }

            let coordinator = ProbeCoordinator::new(prober, ExecutionConfig::from(&self.config))
                .with_logger(logger.clone());
            let run = coordinator.run_until(&resolved.targets, deadline).await;
            (run.probe_set, Some(run.summary))
        };

        let probe_set = probe_set.with_resolution_failures(resolved.failures);
        let verdict = Verdict::evaluate(&probe_set, &self.config.thresholds());
        logger.log_verdict(&verdict, started.elapsed()).await;

        let rendered = OutputFormatterFactory::create(self.config.output_format).format_verdict(&verdict)?;
        let verbose = self.config.verbose.then(|| {
            VerboseFormatter::new(self.config.enable_color).format_report(&verdict, summary.as_ref())
        });

        Ok(RunReport {
            verdict,
            summary,
            rendered,
            verbose,
        })
    }

    /// Resolve all targets, giving up on the stragglers at the deadline
    async fn resolve(&self, deadline: Instant, logger: &ProbeLogger) -> Result<ResolvedTargets> {
        let dns = DnsManager::new(
            &self.config.dns_config()?,
            self.config.address_family,
            self.config.resolve_timeout(),
        )?;

        let started = Instant::now();
        let resolved = match tokio::time::timeout_at(deadline, dns.resolve_all(&self.config.targets)).await {
            Ok(resolved) => resolved,
            Err(_) => ResolvedTargets {
                targets: Vec::new(),
                failures: self
                    .config
                    .targets
                    .iter()
                    .map(|target| ResolutionFailure::new(target.trim(), "deadline exceeded during resolution"))
                    .collect(),
            },
        };
        let elapsed = started.elapsed();

        let mut by_host: BTreeMap<&str, Vec<ProbeTarget>> = BTreeMap::new();
        for target in &resolved.targets {
            by_host.entry(target.host.as_str()).or_default().push(target.clone());
        }
        for (host, addresses) in &by_host {
            logger.log_resolution(host, addresses, elapsed).await;
        }
        for failure in &resolved.failures {
            logger.log_resolution_failure(failure).await;
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{ProbeFailure, ProbeOutcome, Status};
    use crate::types::{AddressFamily, OutputFormat};
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Answers IPv4 after a fixed delay, never answers IPv6
    struct V4Only(Duration);

    #[async_trait]
    impl Prober for V4Only {
        async fn probe(&self, addr: IpAddr, timeout: Duration) -> ProbeOutcome {
            if addr.is_ipv4() && self.0 < timeout {
                tokio::time::sleep(self.0).await;
                ProbeOutcome::success(self.0)
            } else {
                tokio::time::sleep(timeout).await;
                ProbeOutcome::failure(ProbeFailure::Timeout)
            }
        }
    }

    fn app(targets: &[&str], configure: impl FnOnce(&mut Config)) -> App {
        let mut config = Config {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Config::default()
        };
        configure(&mut config);
        App::new(config)
    }

    fn opener(
        prober: Arc<dyn Prober>,
    ) -> impl FnOnce(&[IpVersion]) -> Result<(Arc<dyn Prober>, Vec<(IpVersion, String)>)> {
        move |versions: &[IpVersion]| Ok((prober, versions.iter().map(|v| (*v, "dgram".to_string())).collect()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_family_run() {
        let app = app(&["192.0.2.1", "2001:db8::1"], |_| {});

        let report = app.run_with(opener(Arc::new(V4Only(Duration::from_millis(20))))).await.unwrap();

        assert_eq!(report.verdict.status, Status::Ok);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.verdict.table.len(), 2);
        assert!(report.rendered.starts_with("multiping: OK - best rtt 20 ms (for 192.0.2.1) | "));
        assert!(report.rendered.contains("'2001:db8::1'=U;0.05;0.5;0"));
        assert!(report.verbose.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_resolved_skips_transport() {
        let app = app(&["192.0.2.1"], |config| config.address_family = AddressFamily::V6);
        let opened = AtomicBool::new(false);

        let report = app
            .run_with(|_: &[IpVersion]| {
                opened.store(true, Ordering::SeqCst);
                Err(AppError::transport_setup("should not be opened"))
            })
            .await
            .unwrap();

        assert!(!opened.load(Ordering::SeqCst));
        assert_eq!(report.verdict.status, Status::Unknown);
        assert_eq!(report.exit_code(), 3);
        assert!(report.summary.is_none());
        assert_eq!(
            report.rendered,
            "multiping: UNKNOWN - no targets found\nwarning: 192.0.2.1: no IPv6 address found"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_fatal() {
        let app = app(&["192.0.2.1"], |_| {});

        let error = app
            .run_with(|_: &[IpVersion]| Err(AppError::transport_setup("cannot create IPv4 ICMP socket")))
            .await
            .unwrap_err();

        assert_eq!(error.category(), "TRANSPORT");
        assert_eq!(error.exit_code(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_needed_versions_requested() {
        let app = app(&["192.0.2.1", "192.0.2.2"], |_| {});
        let prober: Arc<dyn Prober> = Arc::new(V4Only(Duration::from_millis(5)));

        let report = app
            .run_with(move |versions: &[IpVersion]| {
                assert_eq!(versions, &[IpVersion::V4]);
                Ok((prober, Vec::new()))
            })
            .await
            .unwrap();

        assert_eq!(report.summary.unwrap().successful, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_by_deadline() {
        let app = app(&["2001:db8::1", "2001:db8::2"], |config| {
            config.probe_timeout_ms = 800;
            config.deadline_ms = 1_000;
            config.attempts = 3;
        });

        let started = Instant::now();
        let report = app.run_with(opener(Arc::new(V4Only(Duration::ZERO)))).await.unwrap();

        assert!(started.elapsed() <= Duration::from_millis(1_010));
        assert_eq!(report.verdict.status, Status::Critical);
        assert!(report.rendered.starts_with("multiping: CRITICAL - no data | "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_and_verbose_output() {
        let app = app(&["192.0.2.1"], |config| {
            config.output_format = OutputFormat::Json;
            config.verbose = true;
            config.enable_color = false;
            config.warning_ms = 10;
        });

        let report = app.run_with(opener(Arc::new(V4Only(Duration::from_millis(20))))).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&report.rendered).unwrap();
        assert_eq!(value["status"], "WARNING");
        let verbose = report.verbose.unwrap();
        assert!(verbose.contains("192.0.2.1"));
        assert!(verbose.contains("Status: WARNING"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unopened_family_fails_only_its_addresses() {
        let app = app(&["192.0.2.1", "2001:db8::1"], |_| {});
        let prober: Arc<dyn Prober> = Arc::new(V4Only(Duration::from_millis(30)));

        let report = app
            .run_with(move |versions: &[IpVersion]| {
                assert_eq!(versions, &[IpVersion::V4, IpVersion::V6]);
                Ok((prober, vec![(IpVersion::V4, "dgram".to_string())]))
            })
            .await
            .unwrap();

        assert_eq!(report.verdict.status, Status::Ok);
        let summary = report.summary.unwrap();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert!(report.rendered.contains("'2001:db8::1'=U;"));
    }
}
