//! Incremental status reporting
//!
//! The executor emits a [`ProgressSnapshot`] after every chunk. Reporting is
//! fire-and-forget: a reporter error is logged and otherwise ignored, so it
//! can never change a tally or stop later chunks.

use crate::events::{EventBus, OrchestratorEvent};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Status at a chunk boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// 1-based index of the chunk that just settled
    pub chunk: usize,
    pub total_chunks: usize,
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn is_final(&self) -> bool {
        self.chunk == self.total_chunks
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("status channel closed")]
    ChannelClosed,

    #[error("failed to deliver status: {0}")]
    Delivery(String),
}

/// Receives progress snapshots from the executor
pub trait ProgressReporter: Send + Sync {
    fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), ReportError>;
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressSnapshot) -> Result<(), ReportError> + Send + Sync,
{
    fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), ReportError> {
        self(snapshot)
    }
}

/// Discards every snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _snapshot: &ProgressSnapshot) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Publishes snapshots on the event bus, tagged with the phase name
#[derive(Debug, Clone)]
pub struct EventReporter {
    bus: EventBus,
    phase: String,
}

impl EventReporter {
    pub fn new(bus: EventBus, phase: impl Into<String>) -> Self {
        Self {
            bus,
            phase: phase.into(),
        }
    }
}

impl ProgressReporter for EventReporter {
    fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), ReportError> {
        tracing::debug!(
            phase = %self.phase,
            chunk = snapshot.chunk,
            total_chunks = snapshot.total_chunks,
            processed = snapshot.processed,
            succeeded = snapshot.succeeded,
            failed = snapshot.failed,
            "phase progress"
        );
        // No subscribers is fine; nobody is watching.
        self.bus.publish(OrchestratorEvent::Progress {
            phase: self.phase.clone(),
            snapshot: snapshot.clone(),
        });
        Ok(())
    }
}
