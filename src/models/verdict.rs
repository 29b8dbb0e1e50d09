//! Reduction of a probe set to a single monitoring verdict

use crate::models::probe::{ProbeFailure, ProbeSet, ProbeTarget, ResolutionFailure};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Monitoring-plugin status, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Process exit code under monitoring-plugin convention
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    /// Classify a single RTT. Both thresholds are inclusive.
    pub fn check(rtt: Duration, thresholds: &Thresholds) -> Self {
        if rtt >= thresholds.critical {
            Status::Critical
        } else if rtt >= thresholds.warning {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Warning and critical RTT thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    #[serde(with = "seconds")]
    pub warning: Duration,
    #[serde(with = "seconds")]
    pub critical: Duration,
}

impl Thresholds {
    pub fn new(warning: Duration, critical: Duration) -> Self {
        Self { warning, critical }
    }

    pub fn from_millis(warning_ms: u64, critical_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(warning_ms),
            Duration::from_millis(critical_ms),
        )
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_millis(
            crate::defaults::DEFAULT_WARNING_MS,
            crate::defaults::DEFAULT_CRITICAL_MS,
        )
    }
}

/// The lowest RTT and where it was measured
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestRtt {
    #[serde(with = "seconds")]
    pub rtt: Duration,
    pub target: ProbeTarget,
}

/// One row of the per-address table; `rtt` is `None` for "no data"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RttEntry {
    pub target: ProbeTarget,
    #[serde(with = "optional_seconds")]
    pub rtt: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

/// Final result of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub status: Status,
    pub best: Option<BestRtt>,
    pub table: Vec<RttEntry>,
    pub thresholds: Thresholds,
    pub warnings: Vec<ResolutionFailure>,
}

impl Verdict {
    /// Reduce a probe set to a verdict
    ///
    /// Pure: the same set and thresholds always give the same verdict. On RTT
    /// ties the first address in the set wins.
    pub fn evaluate(probe_set: &ProbeSet, thresholds: &Thresholds) -> Self {
        let table: Vec<RttEntry> = probe_set
            .iter()
            .map(|(target, outcome)| RttEntry {
                target: target.clone(),
                rtt: outcome.rtt(),
                failure: outcome.failure_reason().cloned(),
            })
            .collect();

        let best = probe_set
            .successes()
            .min_by_key(|(_, rtt)| *rtt)
            .map(|(target, rtt)| BestRtt {
                rtt,
                target: target.clone(),
            });

        let status = if probe_set.is_empty() {
            Status::Unknown
        } else {
            match &best {
                Some(best) => Status::check(best.rtt, thresholds),
                None => Status::Critical,
            }
        };

        Self {
            status,
            best,
            table,
            thresholds: *thresholds,
            warnings: probe_set.resolution_failures().to_vec(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    /// Number of addresses that answered
    pub fn successful_count(&self) -> usize {
        self.table.iter().filter(|entry| entry.rtt.is_some()).count()
    }
}

mod seconds {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

mod optional_seconds {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::probe::ProbeOutcome;

    fn target(host: &str, addr: &str) -> ProbeTarget {
        ProbeTarget::new(host, addr.parse().unwrap())
    }

    #[test]
    fn test_status_check_boundaries() {
        let thresholds = Thresholds::from_millis(50, 500);

        assert_eq!(Status::check(Duration::from_millis(49), &thresholds), Status::Ok);
        assert_eq!(Status::check(Duration::from_millis(50), &thresholds), Status::Warning);
        assert_eq!(Status::check(Duration::from_millis(499), &thresholds), Status::Warning);
        assert_eq!(Status::check(Duration::from_millis(500), &thresholds), Status::Critical);
    }

    #[test]
    fn test_status_ordering_and_exit_codes() {
        assert!(Status::Ok < Status::Warning);
        assert!(Status::Warning < Status::Critical);
        assert!(Status::Critical < Status::Unknown);

        let codes: Vec<i32> = [Status::Ok, Status::Warning, Status::Critical, Status::Unknown]
            .iter()
            .map(Status::exit_code)
            .collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        assert_eq!(Status::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_empty_set_is_unknown() {
        let set = ProbeSet::new()
            .with_resolution_failures(vec![ResolutionFailure::new("nowhere.invalid", "no address")]);
        let verdict = Verdict::evaluate(&set, &Thresholds::default());

        assert_eq!(verdict.status, Status::Unknown);
        assert!(verdict.best.is_none());
        assert!(verdict.table.is_empty());
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_tie_goes_to_first_address() {
        let mut set = ProbeSet::new();
        set.insert(target("a.example", "192.0.2.1"), ProbeOutcome::success(Duration::from_millis(20)));
        set.insert(target("b.example", "192.0.2.2"), ProbeOutcome::success(Duration::from_millis(20)));

        let verdict = Verdict::evaluate(&set, &Thresholds::default());
        assert_eq!(verdict.best.unwrap().target.host, "a.example");
    }

    #[test]
    fn test_json_serialization_uses_seconds() {
        let mut set = ProbeSet::new();
        set.insert(target("192.0.2.1", "192.0.2.1"), ProbeOutcome::success(Duration::from_millis(250)));
        set.insert(target("192.0.2.2", "192.0.2.2"), ProbeOutcome::failure(ProbeFailure::Timeout));

        let verdict = Verdict::evaluate(&set, &Thresholds::default());
        let json = serde_json::to_value(&verdict).unwrap();

        assert_eq!(json["status"], "WARNING");
        assert_eq!(json["best"]["rtt"], 0.25);
        assert_eq!(json["thresholds"]["warning"], 0.05);
        assert!(json["table"][1]["rtt"].is_null());
        assert_eq!(json["table"][1]["failure"]["kind"], "timeout");
    }
}
