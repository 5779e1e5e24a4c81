//! Event system for orchestration status
//!
//! A broadcast-based event bus carrying everything a presentation layer needs
//! to follow a running sequence: phase boundaries, per-chunk progress,
//! elevation attempts and the terminal outcome. The orchestrator never renders
//! anything itself; it only publishes.

use crate::elevation::ElevationStrategy;
use crate::executor::Tally;
use crate::progress::ProgressSnapshot;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Status events published while a sequence runs
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    // ========== Sequence Events ==========
    /// A sequence was started
    SequenceStarted {
        run_id: Uuid,
        sequence: String,
        phases: usize,
    },

    /// A sequence stopped early; remaining phases were not executed
    SequenceAborted { sequence: String, reason: String },

    /// Every phase of a sequence ran
    SequenceCompleted { sequence: String, elapsed: Duration },

    // ========== Elevation Events ==========
    /// One elevation strategy was tried
    ElevationAttempted {
        strategy: ElevationStrategy,
        succeeded: bool,
        error: Option<String>,
    },

    // ========== Phase Events ==========
    /// A phase resolved its targets and is about to execute
    PhaseStarted {
        phase: String,
        /// 1-based position in the sequence
        index: usize,
        total_phases: usize,
        targets: usize,
    },

    /// A chunk of the running phase settled
    Progress {
        phase: String,
        snapshot: ProgressSnapshot,
    },

    /// A phase settled every target
    PhaseCompleted {
        phase: String,
        tally: Tally,
        elapsed: Duration,
    },
}

impl OrchestratorEvent {
    pub fn phase_started(
        phase: impl Into<String>,
        index: usize,
        total_phases: usize,
        targets: usize,
    ) -> Self {
        Self::PhaseStarted {
            phase: phase.into(),
            index,
            total_phases,
            targets,
        }
    }

    pub fn phase_completed(phase: impl Into<String>, tally: Tally, elapsed: Duration) -> Self {
        Self::PhaseCompleted {
            phase: phase.into(),
            tally,
            elapsed,
        }
    }

    pub fn sequence_aborted(sequence: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SequenceAborted {
            sequence: sequence.into(),
            reason: reason.into(),
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SequenceStarted { .. } => "sequence_started",
            Self::SequenceAborted { .. } => "sequence_aborted",
            Self::SequenceCompleted { .. } => "sequence_completed",
            Self::ElevationAttempted { .. } => "elevation_attempted",
            Self::PhaseStarted { .. } => "phase_started",
            Self::Progress { .. } => "progress",
            Self::PhaseCompleted { .. } => "phase_completed",
        }
    }

    /// Whether no further events follow for this sequence
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SequenceAborted { .. } | Self::SequenceCompleted { .. }
        )
    }
}

/// Event bus for orchestration status
///
/// Each subscriber receives a copy of every event published after it
/// subscribed. Slow subscribers lose the oldest events once `capacity` is
/// exceeded.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus; a capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of active receivers, or 0 if nobody is listening.
    pub fn publish(&self, event: OrchestratorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}
