//! Data models and structures for multiping

pub mod config;
pub mod probe;
pub mod verdict;

// Re-export main model types
pub use config::Config;
pub use probe::{ProbeFailure, ProbeOutcome, ProbeSet, ProbeTarget, ResolutionFailure};
pub use verdict::{BestRtt, RttEntry, Status, Thresholds, Verdict};

// Property-based tests for the aggregator
#[cfg(test)]
mod verdict_tests;
