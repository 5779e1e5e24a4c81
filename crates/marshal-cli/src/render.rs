//! Terminal rendering of orchestration events and reports

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use marshal_core::OrchestratorEvent;
use marshal_core::sequencer::{ElevationStatus, SequenceOutcome, SequenceReport};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str = "{spinner:.blue} {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

fn phase_bar(phase: &str, targets: usize) -> ProgressBar {
    let bar = ProgressBar::new(targets as u64);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_prefix(phase.to_string());
    bar
}

/// Follow events until the sequence ends, drawing one bar per phase
pub fn spawn(mut events: Receiver<OrchestratorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "status renderer lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            match &event {
                OrchestratorEvent::SequenceStarted { sequence, phases, .. } => {
                    println!("{} {} ({} phases)", "▶".cyan().bold(), sequence.bold(), phases);
                }
                OrchestratorEvent::ElevationAttempted {
                    strategy,
                    succeeded,
                    error,
                } => {
                    if *succeeded {
                        println!("  {} elevated via {}", "↑".green().bold(), strategy);
                    } else {
                        println!(
                            "  {} {} failed: {}",
                            "↑".yellow().bold(),
                            strategy,
                            error.as_deref().unwrap_or("unknown error").dimmed()
                        );
                    }
                }
                OrchestratorEvent::PhaseStarted {
                    phase,
                    index,
                    total_phases,
                    targets,
                } => {
                    let new_bar = phase_bar(&format!("{}/{} {}", index, total_phases, phase), *targets);
                    if let Some(old) = bar.replace(new_bar) {
                        old.finish_and_clear();
                    }
                }
                OrchestratorEvent::Progress { snapshot, .. } => {
                    if let Some(bar) = &bar {
                        bar.set_position(snapshot.processed as u64);
                        bar.set_message(format!(
                            "chunk {}/{} · {} failed",
                            snapshot.chunk, snapshot.total_chunks, snapshot.failed
                        ));
                    }
                }
                OrchestratorEvent::PhaseCompleted { phase, tally, elapsed } => {
                    if let Some(bar) = bar.take() {
                        bar.finish_and_clear();
                    }
                    let status = if tally.failed == 0 {
                        "✓".green().bold()
                    } else if tally.succeeded > 0 {
                        "⚠".yellow().bold()
                    } else {
                        "✗".red().bold()
                    };
                    println!(
                        "  {} {} {} ok, {} failed {}",
                        status,
                        phase.bold(),
                        tally.succeeded,
                        tally.failed,
                        format!("({:.1?})", elapsed).dimmed()
                    );
                }
                OrchestratorEvent::SequenceAborted { reason, .. } => {
                    if let Some(bar) = bar.take() {
                        bar.abandon();
                    }
                    println!("{} aborted: {}", "■".red().bold(), reason.red());
                }
                OrchestratorEvent::SequenceCompleted { .. } => {}
            }

            if event.is_terminal() {
                break;
            }
        }
    })
}

/// Print the final summary of a run
pub fn print_report(report: &SequenceReport, show_failures: usize) {
    println!();
    println!("{}", format!("Summary: {}", report.sequence).bold().underline());

    match &report.elevation {
        ElevationStatus::NotAttempted => {}
        ElevationStatus::Elevated(elevation) => println!(
            "  elevation: {} (grouping {} at position {})",
            elevation.strategy.to_string().green(),
            elevation.grouping,
            elevation.position
        ),
        ElevationStatus::Failed(error) => {
            println!("  elevation: {}", error.to_string().yellow())
        }
    }

    for phase in &report.phases {
        let tally = phase.tally();
        println!(
            "  {:<18} {:>6} ok {:>6} failed",
            phase.name,
            tally.succeeded.to_string().green(),
            tally.failed.to_string().red()
        );
        for failure in tally.failures.iter().take(show_failures) {
            println!("      {} {}: {}", "-".dimmed(), failure.target, failure.reason.dimmed());
        }
        if tally.failures.len() > show_failures {
            println!(
                "      {}",
                format!("... and {} more", tally.failures.len() - show_failures).dimmed()
            );
        }
    }
    for skipped in &report.skipped {
        println!("  {:<18} {}", skipped, "skipped".dimmed());
    }

    let (ok, failed) = report.totals();
    let verdict = match &report.outcome {
        SequenceOutcome::Completed => "completed".green().bold(),
        SequenceOutcome::Aborted(_) => "aborted".red().bold(),
    };
    println!(
        "  {} in {:.1?}: {} ok, {} failed (run {})",
        verdict,
        report.elapsed,
        ok,
        failed,
        report.run_id.to_string().dimmed()
    );
}
