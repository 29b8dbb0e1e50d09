//! Probe execution engine
//!
//! This module contains:
//! - The [`Prober`] seam between the coordinator and the ICMP machinery
//! - Per-address probe sessions with repeated attempts and an early cutoff
//! - The [`ProbeCoordinator`], which fans out one task per address under a
//!   global deadline and collects exactly one outcome per address

use crate::{
    icmp::Pinger,
    logging::ProbeLogger,
    models::{Config, ProbeFailure, ProbeOutcome, ProbeSet, ProbeTarget},
    types::CompletionPolicy,
};
use async_trait::async_trait;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Sends one probe to one address
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `addr` once, giving up after `timeout`
    async fn probe(&self, addr: IpAddr, timeout: Duration) -> ProbeOutcome;
}

#[async_trait]
impl Prober for Pinger {
    async fn probe(&self, addr: IpAddr, timeout: Duration) -> ProbeOutcome {
        self.ping(addr, timeout).await
    }
}

/// Execution parameters for one coordinator run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionConfig {
    /// Upper bound for a single attempt
    pub probe_timeout: Duration,
    /// Upper bound for the whole run
    pub deadline: Duration,
    /// Attempts per address
    pub attempts: u32,
    /// Stop retrying an address once it answers faster than this
    pub cutoff: Option<Duration>,
    pub policy: CompletionPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(crate::defaults::DEFAULT_PROBE_TIMEOUT_MS),
            deadline: Duration::from_millis(crate::defaults::DEFAULT_DEADLINE_MS),
            attempts: crate::defaults::DEFAULT_ATTEMPTS,
            cutoff: None,
            policy: CompletionPolicy::WaitForAll,
        }
    }
}

impl From<&Config> for ExecutionConfig {
    fn from(config: &Config) -> Self {
        Self {
            probe_timeout: config.probe_timeout(),
            deadline: config.deadline(),
            attempts: config.attempts.max(1),
            cutoff: Some(config.thresholds().warning),
            policy: config.completion_policy,
        }
    }
}

/// Counts describing how a run went
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    /// Addresses probed
    pub total: usize,
    pub successful: usize,
    /// Failed addresses, including deadline and cancellation failures
    pub failed: usize,
    pub deadline_exceeded: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
    /// Whether the global deadline cut the run short
    pub deadline_hit: bool,
}

impl ExecutionSummary {
    fn from_probe_set(probe_set: &ProbeSet, elapsed: Duration, deadline_hit: bool) -> Self {
        let mut summary = Self {
            total: probe_set.len(),
            elapsed,
            deadline_hit,
            ..Self::default()
        };

        for (_, outcome) in probe_set.iter() {
            match outcome {
                ProbeOutcome::Success { .. } => summary.successful += 1,
                ProbeOutcome::Failure(reason) => {
                    summary.failed += 1;
                    match reason {
                        ProbeFailure::DeadlineExceeded => summary.deadline_exceeded += 1,
                        ProbeFailure::Cancelled => summary.cancelled += 1,
                        _ => {}
                    }
                }
            }
        }
        summary
    }

    /// Percentage of addresses that answered
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

/// Outcome of a coordinator run
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub probe_set: ProbeSet,
    pub summary: ExecutionSummary,
}

/// Sequential attempts against one address
struct ProbeSession {
    prober: Arc<dyn Prober>,
    target: ProbeTarget,
    probe_timeout: Duration,
    attempts: u32,
    cutoff: Option<Duration>,
    deadline: Instant,
    logger: Option<ProbeLogger>,
}

impl ProbeSession {
    /// Best RTT over the attempts, or the last failure if none succeeded
    async fn run(self) -> ProbeOutcome {
        let mut best: Option<Duration> = None;
        let mut last_failure = ProbeFailure::DeadlineExceeded;

        for attempt in 1..=self.attempts {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let outcome = self
                .prober
                .probe(self.target.addr, self.probe_timeout.min(remaining))
                .await;
            if let Some(logger) = &self.logger {
                logger.log_probe_outcome(&self.target, attempt, &outcome).await;
            }

            match outcome {
                ProbeOutcome::Success { rtt } => {
                    best = Some(best.map_or(rtt, |current| current.min(rtt)));
                    if self.cutoff.map_or(false, |cutoff| rtt < cutoff) {
                        break;
                    }
                }
                // Retrying cannot help without privileges
                ProbeOutcome::Failure(ProbeFailure::PermissionDenied) => {
                    last_failure = ProbeFailure::PermissionDenied;
                    break;
                }
                ProbeOutcome::Failure(reason) => last_failure = reason,
            }
        }

        match best {
            Some(rtt) => ProbeOutcome::success(rtt),
            None => ProbeOutcome::failure(last_failure),
        }
    }
}

/// Resolves once the cancellation flag is raised
async fn cancellation(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Coordinator gone; the task is about to be aborted
            std::future::pending::<()>().await;
        }
    }
}

/// Probes many addresses concurrently under one deadline
pub struct ProbeCoordinator {
    prober: Arc<dyn Prober>,
    config: ExecutionConfig,
    logger: Option<ProbeLogger>,
}

impl ProbeCoordinator {
    pub fn new(prober: Arc<dyn Prober>, config: ExecutionConfig) -> Self {
        Self {
            prober,
            config,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Probe `targets` with the configured deadline starting now
    pub async fn run(&self, targets: &[ProbeTarget]) -> ProbeRun {
        self.run_until(targets, Instant::now() + self.config.deadline).await
    }

    /// Probe `targets`, returning no later than `deadline`
    ///
    /// Every target gets exactly one outcome in the returned set, in target
    /// order. Targets are expected to have distinct addresses.
    pub async fn run_until(&self, targets: &[ProbeTarget], deadline: Instant) -> ProbeRun {
        let started = Instant::now();
        let (result_tx, mut result_rx) = mpsc::channel(targets.len().max(1));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().enumerate() {
            let session = ProbeSession {
                prober: self.prober.clone(),
                target: target.clone(),
                probe_timeout: self.config.probe_timeout,
                attempts: self.config.attempts.max(1),
                cutoff: self.config.cutoff,
                deadline,
                logger: self.logger.clone(),
            };
            let result_tx = result_tx.clone();
            let mut cancel_rx = cancel_rx.clone();

            tasks.spawn(async move {
                let outcome = tokio::select! {
                    outcome = session.run() => outcome,
                    _ = cancellation(&mut cancel_rx) => ProbeOutcome::failure(ProbeFailure::Cancelled),
                };
                let _ = result_tx.send((index, outcome)).await;
            });
        }
        drop(result_tx);

        let mut slots: Vec<Option<ProbeOutcome>> = vec![None; targets.len()];
        let mut received = 0;
        let mut cancelled = false;
        let mut deadline_hit = false;
        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);

        while received < targets.len() {
            tokio::select! {
                message = result_rx.recv() => match message {
                    Some((index, outcome)) => {
                        if slots[index].is_none() {
                            received += 1;
                        }
                        let success = outcome.is_success();
                        slots[index] = Some(outcome);

                        if success && self.config.policy == CompletionPolicy::FirstSuccess && !cancelled {
                            cancelled = true;
                            let _ = cancel_tx.send(true);
                        }
                    }
                    None => break,
                },
                _ = &mut expiry => {
                    deadline_hit = true;
                    break;
                }
            }
        }
        tasks.abort_all();

        if deadline_hit {
            if let Some(logger) = &self.logger {
                logger
                    .log_deadline(targets.len() - received, deadline.saturating_duration_since(started))
                    .await;
            }
        }

        let mut probe_set = ProbeSet::new();
        for (target, slot) in targets.iter().zip(slots) {
            let outcome = slot.unwrap_or(ProbeOutcome::failure(ProbeFailure::DeadlineExceeded));
            probe_set.insert(target.clone(), outcome);
        }

        let summary = ExecutionSummary::from_probe_set(&probe_set, started.elapsed(), deadline_hit);
        ProbeRun { probe_set, summary }
    }
}
