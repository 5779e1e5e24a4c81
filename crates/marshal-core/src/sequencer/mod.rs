//! Phase sequencer
//!
//! Drives the phases of one workflow strictly in order. Each phase resolves
//! its targets just before it runs, so earlier phases shape what later ones
//! see. There is no rollback: an abort leaves completed phases in place and
//! skips the rest.

mod phase;
mod report;

pub use phase::{ElevationPolicy, Phase, PhaseSequence, TargetSource};
pub use report::{ElevationStatus, PhaseReport, SequenceAbort, SequenceOutcome, SequenceReport};

use crate::context::OperationContext;
use crate::elevation::ElevationResolver;
use crate::events::{EventBus, OrchestratorEvent};
use crate::executor::ChunkedExecutor;
use crate::progress::EventReporter;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs phase sequences for one operation context
#[derive(Debug, Clone)]
pub struct PhaseSequencer {
    ctx: OperationContext,
    events: EventBus,
    resolver: ElevationResolver,
}

/// Mutable bookkeeping for one run
struct Run {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    elevation: ElevationStatus,
    phases: Vec<PhaseReport>,
}

impl PhaseSequencer {
    pub fn new(ctx: OperationContext) -> Self {
        Self {
            ctx,
            events: EventBus::default(),
            resolver: ElevationResolver::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_resolver(mut self, resolver: ElevationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn context(&self) -> &OperationContext {
        &self.ctx
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute `sequence` to completion or abort
    pub async fn run(&self, sequence: PhaseSequence) -> SequenceReport {
        let mut run = Run {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            elevation: ElevationStatus::NotAttempted,
            phases: Vec::with_capacity(sequence.phases.len()),
        };
        let total_phases = sequence.phases.len();

        info!(
            run_id = %run.run_id,
            sequence = %sequence.name,
            phases = total_phases,
            actor = %self.ctx.actor,
            invoker = %self.ctx.invoker,
            "starting sequence"
        );
        self.events.publish(OrchestratorEvent::SequenceStarted {
            run_id: run.run_id,
            sequence: sequence.name.clone(),
            phases: total_phases,
        });

        if sequence.require_invoker_admin {
            let abort = match self.ctx.invoker_is_admin().await {
                Ok(true) => None,
                Ok(false) => Some(SequenceAbort::InvokerNotAuthorized {
                    invoker: self.ctx.invoker.clone(),
                }),
                Err(error) => Some(SequenceAbort::Preflight(error.to_string())),
            };
            if let Some(abort) = abort {
                return self.abort(&sequence, run, 0, abort);
            }
        }

        if sequence.elevation != ElevationPolicy::Skip {
            let resolver = self.resolver.clone().with_events(self.events.clone());
            match resolver
                .resolve(self.ctx.client.as_ref(), &self.ctx.actor, &self.ctx.reason)
                .await
            {
                Ok(report) => run.elevation = ElevationStatus::Elevated(report),
                Err(error) if sequence.elevation == ElevationPolicy::Required => {
                    run.elevation = ElevationStatus::Failed(error.clone());
                    return self.abort(&sequence, run, 0, SequenceAbort::ElevationFailed(error));
                }
                Err(error) => {
                    warn!(%error, "elevation failed, continuing at current rank");
                    run.elevation = ElevationStatus::Failed(error);
                }
            }
        }

        for (index, phase) in sequence.phases.iter().enumerate() {
            let targets = match phase.source.resolve(&self.ctx).await {
                Ok(targets) => targets,
                Err(error) => {
                    let abort = SequenceAbort::TargetResolution {
                        phase: phase.name.clone(),
                        error: error.to_string(),
                    };
                    return self.abort(&sequence, run, index, abort);
                }
            };

            info!(phase = %phase.name, targets = targets.len(), "starting phase");
            self.events.publish(OrchestratorEvent::phase_started(
                phase.name.clone(),
                index + 1,
                total_phases,
                targets.len(),
            ));

            let reporter = EventReporter::new(self.events.clone(), phase.name.clone());
            let execution = ChunkedExecutor::new(phase.executor)
                .execute(targets, phase.action.as_ref(), &reporter)
                .await;

            info!(
                phase = %phase.name,
                succeeded = execution.tally.succeeded,
                failed = execution.tally.failed,
                "phase completed"
            );
            self.events.publish(OrchestratorEvent::phase_completed(
                phase.name.clone(),
                execution.tally.clone(),
                execution.elapsed,
            ));

            let total_failure = execution.tally.is_total_failure();
            let attempted = execution.tally.total();
            run.phases.push(PhaseReport {
                name: phase.name.clone(),
                execution,
            });

            if phase.abort_on_total_failure && total_failure {
                let abort = SequenceAbort::PhaseTotalFailure {
                    phase: phase.name.clone(),
                    targets: attempted,
                };
                return self.abort(&sequence, run, index + 1, abort);
            }
        }

        let elapsed = run.started.elapsed();
        info!(sequence = %sequence.name, elapsed_ms = elapsed.as_millis() as u64, "sequence completed");
        self.events.publish(OrchestratorEvent::SequenceCompleted {
            sequence: sequence.name.clone(),
            elapsed,
        });

        SequenceReport {
            run_id: run.run_id,
            started_at: run.started_at,
            sequence: sequence.name,
            elevation: run.elevation,
            phases: run.phases,
            skipped: Vec::new(),
            outcome: SequenceOutcome::Completed,
            elapsed,
        }
    }

    /// Finish a run early; phases from `next_phase` on are skipped
    fn abort(
        &self,
        sequence: &PhaseSequence,
        run: Run,
        next_phase: usize,
        abort: SequenceAbort,
    ) -> SequenceReport {
        warn!(sequence = %sequence.name, reason = %abort, "sequence aborted");
        self.events
            .publish(OrchestratorEvent::sequence_aborted(sequence.name.clone(), abort.to_string()));

        SequenceReport {
            run_id: run.run_id,
            started_at: run.started_at,
            sequence: sequence.name.clone(),
            elevation: run.elevation,
            phases: run.phases,
            skipped: sequence.phases[next_phase..]
                .iter()
                .map(|p| p.name.clone())
                .collect(),
            outcome: SequenceOutcome::Aborted(abort),
            elapsed: run.started.elapsed(),
        }
    }
}
