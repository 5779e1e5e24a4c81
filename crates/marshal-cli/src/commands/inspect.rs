//! `marshal inspect`

use super::load_platform;
use crate::args::InspectArgs;
use crate::console::CliConsole;
use marshal_core::OperationContext;
use marshal_core::workflows::assess;

pub async fn execute(args: &InspectArgs, verbose: bool) -> anyhow::Result<()> {
    let console = CliConsole::new(verbose);
    let (platform, actor) = load_platform(&args.target)?;
    let ctx = OperationContext::new(actor, args.target.invoker.as_str(), platform, "inspect");
    let report = assess(&ctx).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    console.print_header("Readiness");
    console.field("actor rank", report.actor_rank);
    console.field("top grouping rank", report.top_grouping_rank);
    console.field("actor is admin", report.actor_is_admin);
    console.field("invoker is admin", report.invoker_is_admin);
    console.field(
        "members",
        format!(
            "{} ({} online, {} offline, {} bots)",
            report.members_total, report.members_online, report.members_offline, report.bots
        ),
    );
    console.field("eligible members", report.eligible_members);
    console.field("shielded by rank", report.shielded_by_rank);
    console.field("eligible groupings", report.eligible_groupings);
    console.field("eligible channels", report.eligible_channels);
    println!();

    if report.is_ready() {
        console.success("Acting identity is an administrator at the top of the ordering");
    } else if !report.actor_is_admin {
        console.warn("Acting identity lacks administrator rights; elevation will fail");
    } else {
        console.warn(&format!(
            "{} member(s) outrank the acting identity; elevation may widen reach",
            report.shielded_by_rank
        ));
    }
    Ok(())
}
