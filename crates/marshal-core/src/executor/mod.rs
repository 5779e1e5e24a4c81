//! Chunked concurrent executor
//!
//! Runs one action over an ordered list of targets in bounded windows:
//! every action in a chunk is launched at once on the current task, the
//! chunk settles completely, an optional delay elapses, and only then does
//! the next chunk start. Failures are isolated per target and recorded as
//! data; nothing is retried here.

mod action;
mod config;
mod types;

pub use action::{Action, ActionError};
pub use config::ExecutorConfig;
pub use types::{ExecutionReport, ExecutionResult, Outcome, Tally, TargetFailure};

use crate::progress::{ProgressReporter, ProgressSnapshot};
use crate::target::Target;
use futures::FutureExt;
use futures::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executes an action over targets chunk by chunk
#[derive(Debug, Clone, Default)]
pub struct ChunkedExecutor {
    config: ExecutorConfig,
}

impl ChunkedExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `action` over every target and report after each chunk
    ///
    /// Produces exactly one [`ExecutionResult`] per target, in input order.
    pub async fn execute(
        &self,
        targets: Vec<Target>,
        action: &dyn Action,
        reporter: &dyn ProgressReporter,
    ) -> ExecutionReport {
        let started = Instant::now();
        let total = targets.len();

        if targets.is_empty() {
            debug!(action = action.name(), "no targets, nothing to execute");
            return ExecutionReport::default();
        }

        let chunk_size = self.config.chunk_size.max(1);
        let total_chunks = total.div_ceil(chunk_size);
        let mut results = Vec::with_capacity(total);
        let mut tally = Tally::default();

        info!(
            action = action.name(),
            targets = total,
            chunk_size,
            chunks = total_chunks,
            "starting chunked execution"
        );

        for (index, chunk) in targets.chunks(chunk_size).enumerate() {
            let settled = join_all(chunk.iter().map(|target| settle(action, target))).await;

            for (target, outcome) in chunk.iter().zip(settled) {
                if let Outcome::Failure { reason } = &outcome {
                    debug!(action = action.name(), target = %target.id, %reason, "action failed");
                }
                tally.record(target, &outcome);
                results.push(ExecutionResult {
                    target: target.clone(),
                    outcome,
                });
            }

            let snapshot = ProgressSnapshot {
                chunk: index + 1,
                total_chunks,
                processed: results.len(),
                total,
                succeeded: tally.succeeded,
                failed: tally.failed,
                elapsed: started.elapsed(),
            };
            deliver(reporter, &snapshot);

            let more_chunks = index + 1 < total_chunks;
            if more_chunks && !self.config.inter_chunk_delay.is_zero() {
                tokio::time::sleep(self.config.inter_chunk_delay).await;
            }
        }

        let elapsed = started.elapsed();
        info!(
            action = action.name(),
            succeeded = tally.succeeded,
            failed = tally.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "chunked execution finished"
        );

        ExecutionReport {
            results,
            tally,
            chunks: total_chunks,
            elapsed,
        }
    }
}

/// Run one action to completion, turning errors and panics into outcomes
async fn settle(action: &dyn Action, target: &Target) -> Outcome {
    match AssertUnwindSafe(action.apply(target)).catch_unwind().await {
        Ok(Ok(())) => Outcome::Success,
        Ok(Err(error)) => Outcome::failure(error.to_string()),
        Err(panic) => Outcome::failure(format!("action panicked: {}", panic_message(panic.as_ref()))),
    }
}

fn deliver(reporter: &dyn ProgressReporter, snapshot: &ProgressSnapshot) {
    match std::panic::catch_unwind(AssertUnwindSafe(|| reporter.report(snapshot))) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(%error, chunk = snapshot.chunk, "progress report not delivered"),
        Err(_) => warn!(chunk = snapshot.chunk, "progress reporter panicked"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
