//! `marshal run`

use super::load_platform;
use crate::args::RunArgs;
use crate::console::CliConsole;
use crate::render;
use anyhow::bail;
use dialoguer::{Confirm, theme::ColorfulTheme};
use marshal_core::{EventBus, MarshalConfig, OperationContext, PhaseSequencer};

/// Failures listed per phase in the summary
const SHOWN_FAILURES: usize = 5;

pub async fn execute(args: &RunArgs, config: &MarshalConfig, verbose: bool) -> anyhow::Result<()> {
    let console = CliConsole::new(verbose);
    let workflow = args.workflow()?;
    let (platform, actor) = load_platform(&args.target)?;

    let reason = config.audit_reason(workflow.name(), &args.target.invoker);
    let ctx = OperationContext::new(actor, args.target.invoker.as_str(), platform, reason);
    let sequence = workflow.build(&ctx, config)?;

    console.print_header(&format!("Workflow: {}", workflow));
    console.field("acting as", &ctx.actor);
    console.field("requested by", &ctx.invoker);
    console.field("audit reason", &ctx.reason);
    if sequence.phases.is_empty() {
        console.field("phases", "none (elevation only)");
    } else {
        console.field("phases", sequence.phase_names().join(" → "));
    }
    console.info(&format!("elevation policy: {:?}", sequence.elevation));

    if workflow.is_destructive() && !args.yes {
        if !::console::user_attended() {
            bail!("refusing to run {} without confirmation; pass --yes", workflow);
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Run {} now?", workflow))
            .default(false)
            .interact()?;
        if !confirmed {
            console.warn("Cancelled; nothing was changed");
            return Ok(());
        }
    }

    let events = EventBus::new(config.event_capacity);
    let renderer = render::spawn(events.subscribe());
    let sequencer = PhaseSequencer::new(ctx)
        .with_events(events)
        .with_resolver(config.elevation.resolver());

    let report = sequencer.run(sequence).await;
    drop(sequencer);
    renderer.await?;

    render::print_report(&report, SHOWN_FAILURES);
    report.into_result()?;
    Ok(())
}
