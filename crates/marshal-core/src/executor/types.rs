//! Per-target outcomes and per-phase tallies

use crate::target::Target;
use serde::Serialize;
use std::time::Duration;

/// Settled outcome of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { reason: String },
}

impl Outcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Outcome for a specific target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub target: Target,
    pub outcome: Outcome,
}

/// A target whose action failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub target: Target,
    pub reason: String,
}

/// Aggregate success/failure counts for one phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<TargetFailure>,
}

impl Tally {
    pub fn record(&mut self, target: &Target, outcome: &Outcome) {
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Failure { reason } => {
                self.failed += 1;
                self.failures.push(TargetFailure {
                    target: target.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Targets were attempted and none succeeded
    pub fn is_total_failure(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }
}

/// Everything one executor run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    /// One entry per input target, in input order
    pub results: Vec<ExecutionResult>,
    pub tally: Tally,
    /// Number of chunks launched
    pub chunks: usize,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl ExecutionReport {
    /// Targets whose action failed, ready to be re-submitted
    pub fn failed_targets(&self) -> Vec<Target> {
        self.tally.failures.iter().map(|f| f.target.clone()).collect()
    }
}
