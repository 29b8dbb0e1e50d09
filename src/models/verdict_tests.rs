//! Property-based and scenario tests for verdict evaluation
//!
//! The generators build probe sets with distinct addresses and a mix of
//! successes and failures, so the invariants hold for any arrival order.

use super::probe::{ProbeFailure, ProbeOutcome, ProbeSet, ProbeTarget, ResolutionFailure};
use super::verdict::{Status, Thresholds, Verdict};
use proptest::collection::vec;
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Property-based test generators
mod generators {
    use super::*;

    pub fn failure() -> impl Strategy<Value = ProbeFailure> {
        prop_oneof![
            Just(ProbeFailure::Timeout),
            Just(ProbeFailure::Unreachable),
            Just(ProbeFailure::DeadlineExceeded),
            Just(ProbeFailure::Cancelled),
            "[a-z ]{1,20}".prop_map(ProbeFailure::Io),
        ]
    }

    pub fn outcome() -> impl Strategy<Value = ProbeOutcome> {
        prop_oneof![
            (1u64..2_000_000).prop_map(|micros| ProbeOutcome::success(Duration::from_micros(micros))),
            failure().prop_map(ProbeOutcome::failure),
        ]
    }

    /// Sets of up to 32 distinct IPv4 addresses
    pub fn probe_set() -> impl Strategy<Value = ProbeSet> {
        vec(outcome(), 0..32).prop_map(|outcomes| {
            let mut set = ProbeSet::new();
            for (index, outcome) in outcomes.into_iter().enumerate() {
                let addr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, index as u8 + 1));
                set.insert(ProbeTarget::new(format!("host{}.example", index), addr), outcome);
            }
            set
        })
    }

    pub fn thresholds() -> impl Strategy<Value = Thresholds> {
        (1u64..1000, 0u64..1000)
            .prop_map(|(warning, extra)| Thresholds::from_millis(warning, warning + extra))
    }
}

mod property_tests {
    use super::*;

    proptest! {
        /// The best RTT is the minimum over all successes
        #[test]
        fn best_is_minimum_of_successes(set in generators::probe_set(), thresholds in generators::thresholds()) {
            let verdict = Verdict::evaluate(&set, &thresholds);
            let min = set.successes().map(|(_, rtt)| rtt).min();

            prop_assert_eq!(verdict.best.as_ref().map(|best| best.rtt), min);
            if let Some(best) = &verdict.best {
                prop_assert_eq!(set.get(&best.target.addr).and_then(|o| o.rtt()), Some(best.rtt));
            }
        }

        /// Every probed address has exactly one table row
        #[test]
        fn table_covers_every_address(set in generators::probe_set(), thresholds in generators::thresholds()) {
            let verdict = Verdict::evaluate(&set, &thresholds);

            prop_assert_eq!(verdict.table.len(), set.len());
            for entry in &verdict.table {
                let outcome = set.get(&entry.target.addr);
                prop_assert!(outcome.is_some());
                prop_assert_eq!(entry.rtt, outcome.and_then(|o| o.rtt()));
            }
        }

        /// No success with at least one probe is always CRITICAL
        #[test]
        fn all_failures_are_critical(failures in vec(generators::failure(), 1..16), thresholds in generators::thresholds()) {
            let mut set = ProbeSet::new();
            for (index, failure) in failures.into_iter().enumerate() {
                let addr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, index as u8 + 1));
                set.insert(ProbeTarget::new(addr.to_string(), addr), ProbeOutcome::failure(failure));
            }

            let verdict = Verdict::evaluate(&set, &thresholds);
            prop_assert_eq!(verdict.status, Status::Critical);
            prop_assert!(verdict.best.is_none());
        }

        /// Status agrees with classifying the best RTT on its own
        #[test]
        fn status_matches_best_classification(set in generators::probe_set(), thresholds in generators::thresholds()) {
            let verdict = Verdict::evaluate(&set, &thresholds);
            let expected = match (&verdict.best, set.is_empty()) {
                (_, true) => Status::Unknown,
                (Some(best), false) => Status::check(best.rtt, &thresholds),
                (None, false) => Status::Critical,
            };
            prop_assert_eq!(verdict.status, expected);
        }

        /// Evaluating twice gives the same verdict
        #[test]
        fn evaluation_is_idempotent(set in generators::probe_set(), thresholds in generators::thresholds()) {
            prop_assert_eq!(Verdict::evaluate(&set, &thresholds), Verdict::evaluate(&set, &thresholds));
        }
    }
}

mod scenario_tests {
    use super::*;

    fn literal(addr: &str) -> ProbeTarget {
        ProbeTarget::new(addr, addr.parse().unwrap())
    }

    #[test]
    fn test_one_slow_one_unresolved_one_silent() {
        let mut set = ProbeSet::new()
            .with_resolution_failures(vec![ResolutionFailure::new("b.invalid", "no address found")]);
        set.insert(literal("192.0.2.10"), ProbeOutcome::success(Duration::from_millis(100)));
        set.insert(literal("192.0.2.30"), ProbeOutcome::failure(ProbeFailure::Timeout));

        let verdict = Verdict::evaluate(&set, &Thresholds::from_millis(50, 500));

        assert_eq!(verdict.status, Status::Warning);
        let best = verdict.best.as_ref().unwrap();
        assert_eq!(best.rtt, Duration::from_millis(100));
        assert_eq!(best.target.addr.to_string(), "192.0.2.10");
        assert_eq!(verdict.table.len(), 2);
        assert_eq!(verdict.table[0].rtt, Some(Duration::from_millis(100)));
        assert_eq!(verdict.table[1].rtt, None);
        assert_eq!(verdict.warnings[0].target, "b.invalid");
    }

    #[test]
    fn test_everything_times_out() {
        let mut set = ProbeSet::new();
        for addr in ["192.0.2.1", "192.0.2.2", "2001:db8::1"] {
            set.insert(literal(addr), ProbeOutcome::failure(ProbeFailure::Timeout));
        }

        let verdict = Verdict::evaluate(&set, &Thresholds::default());

        assert_eq!(verdict.status, Status::Critical);
        assert!(verdict.best.is_none());
        assert!(verdict.table.iter().all(|entry| entry.rtt.is_none()));
        assert_eq!(verdict.successful_count(), 0);
    }

    #[test]
    fn test_single_fast_reply_is_ok() {
        let mut set = ProbeSet::new();
        set.insert(literal("192.0.2.1"), ProbeOutcome::success(Duration::from_millis(10)));

        let verdict = Verdict::evaluate(&set, &Thresholds::default());

        assert_eq!(verdict.status, Status::Ok);
        assert_eq!(verdict.best.as_ref().unwrap().rtt, Duration::from_millis(10));
        assert_eq!(verdict.exit_code(), 0);
    }

    #[test]
    fn test_best_above_critical() {
        let mut set = ProbeSet::new();
        set.insert(literal("192.0.2.1"), ProbeOutcome::success(Duration::from_millis(750)));

        let verdict = Verdict::evaluate(&set, &Thresholds::from_millis(50, 500));
        assert_eq!(verdict.status, Status::Critical);
        assert!(verdict.best.is_some());
    }
}
