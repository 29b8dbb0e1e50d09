//! Probe targets, probe outcomes and the per-run probe set

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::net::IpAddr;
use std::time::Duration;

/// A concrete address to probe, attributed to the target it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeTarget {
    /// Target specifier as given by the user
    pub host: String,
    /// Resolved address
    pub addr: IpAddr,
}

impl ProbeTarget {
    pub fn new<S: Into<String>>(host: S, addr: IpAddr) -> Self {
        Self { host: host.into(), addr }
    }

    /// Whether the target was given as a literal address
    pub fn is_literal(&self) -> bool {
        self.host == self.addr.to_string()
    }

    /// `host/addr`, collapsed to `addr` for literal targets
    pub fn display_name(&self) -> String {
        if self.is_literal() {
            self.addr.to_string()
        } else {
            format!("{}/{}", self.host, self.addr)
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Why probing an address produced no RTT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// No matching reply within the probe timeout
    Timeout,
    /// Network or host unreachable
    Unreachable,
    /// The OS refused to send for lack of privilege
    PermissionDenied,
    /// Any other transport error
    Io(String),
    /// The global deadline fired before the probe finished
    DeadlineExceeded,
    /// Abandoned after another address answered first
    Cancelled,
}

impl ProbeFailure {
    /// Classify a send/receive error
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => ProbeFailure::PermissionDenied,
            io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::AddrNotAvailable => ProbeFailure::Unreachable,
            io::ErrorKind::TimedOut => ProbeFailure::Timeout,
            _ => ProbeFailure::Io(error.to_string()),
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => f.write_str("timeout"),
            ProbeFailure::Unreachable => f.write_str("unreachable"),
            ProbeFailure::PermissionDenied => f.write_str("permission denied"),
            ProbeFailure::Io(msg) => write!(f, "I/O error: {}", msg),
            ProbeFailure::DeadlineExceeded => f.write_str("deadline exceeded"),
            ProbeFailure::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of probing one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success { rtt: Duration },
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    pub fn success(rtt: Duration) -> Self {
        ProbeOutcome::Success { rtt }
    }

    pub fn failure(reason: ProbeFailure) -> Self {
        ProbeOutcome::Failure(reason)
    }

    pub fn rtt(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Success { rtt } => Some(*rtt),
            ProbeOutcome::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure(reason) => Some(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// A target that produced no address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub target: String,
    pub reason: String,
}

impl ResolutionFailure {
    pub fn new<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        Self {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

/// All probe outcomes of one run, at most one per address
///
/// Insertion order is kept so reports list addresses in target order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSet {
    results: Vec<(ProbeTarget, ProbeOutcome)>,
    resolution_failures: Vec<ResolutionFailure>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for an address. Returns false, leaving the set
    /// untouched, if the address already has an outcome.
    pub fn insert(&mut self, target: ProbeTarget, outcome: ProbeOutcome) -> bool {
        if self.contains(&target.addr) {
            return false;
        }
        self.results.push((target, outcome));
        true
    }

    pub fn with_resolution_failures(mut self, failures: Vec<ResolutionFailure>) -> Self {
        self.resolution_failures.extend(failures);
        self
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.results.iter().any(|(target, _)| target.addr == *addr)
    }

    pub fn get(&self, addr: &IpAddr) -> Option<&ProbeOutcome> {
        self.results
            .iter()
            .find(|(target, _)| target.addr == *addr)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProbeTarget, &ProbeOutcome)> {
        self.results.iter().map(|(target, outcome)| (target, outcome))
    }

    /// Successful probes with their RTT
    pub fn successes(&self) -> impl Iterator<Item = (&ProbeTarget, Duration)> {
        self.iter()
            .filter_map(|(target, outcome)| outcome.rtt().map(|rtt| (target, rtt)))
    }

    pub fn resolution_failures(&self) -> &[ResolutionFailure] {
        &self.resolution_failures
    }

    /// Number of probed addresses
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
