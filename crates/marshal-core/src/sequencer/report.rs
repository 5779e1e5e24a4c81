//! Terminal reports of a sequence run

use crate::elevation::{ElevationError, ElevationReport};
use crate::error::{MarshalError, MarshalResult};
use crate::executor::{ExecutionReport, Tally};
use crate::target::{EntityId, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Why a sequence stopped before its last phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceAbort {
    #[error("invoker '{invoker}' lacks administrator rights")]
    InvokerNotAuthorized { invoker: EntityId },

    #[error("preflight check failed: {0}")]
    Preflight(String),

    #[error("required elevation failed: {0}")]
    ElevationFailed(ElevationError),

    #[error("phase '{phase}' failed for all {targets} targets")]
    PhaseTotalFailure { phase: String, targets: usize },

    #[error("phase '{phase}' could not resolve its targets: {error}")]
    TargetResolution { phase: String, error: String },
}

/// Result of the elevation step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElevationStatus {
    #[default]
    NotAttempted,
    Elevated(ElevationReport),
    Failed(ElevationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    Completed,
    Aborted(SequenceAbort),
}

/// One executed phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub name: String,
    pub execution: ExecutionReport,
}

impl PhaseReport {
    pub fn tally(&self) -> &Tally {
        &self.execution.tally
    }

    /// Failed targets, ready to be re-submitted through a fixed target source
    pub fn failed_targets(&self) -> Vec<Target> {
        self.execution.failed_targets()
    }
}

/// Everything one sequence run produced
#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub sequence: String,
    pub elevation: ElevationStatus,
    /// Executed phases, in order
    pub phases: Vec<PhaseReport>,
    /// Phases never started because the sequence aborted
    pub skipped: Vec<String>,
    pub outcome: SequenceOutcome,
    pub elapsed: Duration,
}

impl SequenceReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == SequenceOutcome::Completed
    }

    pub fn abort(&self) -> Option<&SequenceAbort> {
        match &self.outcome {
            SequenceOutcome::Aborted(abort) => Some(abort),
            SequenceOutcome::Completed => None,
        }
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Sum of every executed phase's tally counts
    pub fn totals(&self) -> (usize, usize) {
        self.phases.iter().fold((0, 0), |(ok, failed), p| {
            (ok + p.tally().succeeded, failed + p.tally().failed)
        })
    }

    /// Surface an abort as an error
    pub fn into_result(self) -> MarshalResult<Self> {
        match &self.outcome {
            SequenceOutcome::Completed => Ok(self),
            SequenceOutcome::Aborted(abort) => Err(MarshalError::sequence_aborted(
                self.sequence.clone(),
                abort.to_string(),
            )),
        }
    }
}
