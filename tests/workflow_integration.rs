//! End-to-end workflow tests against the simulated platform
//!
//! Every test starts from the demo snapshot shipped with the repository.

use async_trait::async_trait;
use marshal::remote::Operation;
use marshal::sequencer::{ElevationStatus, SequenceOutcome};
use marshal::{
    Action, ActionError, EntityId, EventBus, ExecutorConfig, FilterPreset, InMemoryPlatform,
    MarshalConfig, OperationContext, OrchestratorEvent, Phase, PhaseSequence, PhaseSequencer,
    PlatformSnapshot, SequenceAbort, Target, TargetSource, Workflow,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn demo_platform() -> Arc<InMemoryPlatform> {
    let snapshot: PlatformSnapshot =
        serde_json::from_str(include_str!("../demos/snapshot.json")).unwrap();
    snapshot.validate().unwrap();
    Arc::new(InMemoryPlatform::from_snapshot(snapshot))
}

fn context(platform: &Arc<InMemoryPlatform>, invoker: &str) -> OperationContext {
    OperationContext::new("bot", invoker, platform.clone(), "integration test")
}

async fn run_workflow(
    platform: &Arc<InMemoryPlatform>,
    invoker: &str,
    workflow: Workflow,
) -> marshal::SequenceReport {
    let config = MarshalConfig::default();
    let ctx = context(platform, invoker);
    let sequence = workflow.build(&ctx, &config).unwrap();
    PhaseSequencer::new(ctx)
        .with_resolver(config.elevation.resolver())
        .run(sequence)
        .await
}

fn ids(values: &[&str]) -> Vec<EntityId> {
    values.iter().map(|v| EntityId::new(*v)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_member_removal_elevates_then_reaches_everyone_below() {
    let platform = demo_platform();
    let report = run_workflow(&platform, "owner", Workflow::MemberRemoval).await;

    assert!(report.is_completed());
    match &report.elevation {
        ElevationStatus::Elevated(elevation) => assert_eq!(elevation.position, 7),
        other => panic!("expected elevation, got {:?}", other),
    }

    // mod1 only became reachable through elevation; members holding nothing are not stripped
    let strip = report.phase("strip-groupings").unwrap();
    assert_eq!(strip.tally().succeeded, 2);
    assert_eq!(platform.call_count(Operation::RemoveGrouping), 2);
    assert_eq!(platform.groupings_of(&EntityId::new("bot")).len(), 2);

    let remove = report.phase("remove-members").unwrap();
    assert_eq!(remove.tally().succeeded, 5);
    assert_eq!(remove.tally().failed, 0);
    assert_eq!(platform.member_ids(), ids(&["bot", "owner"]));
    assert_eq!(report.totals(), (7, 0));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_requires_admin_invoker() {
    let platform = demo_platform();
    let report = run_workflow(&platform, "u1", Workflow::Teardown).await;

    assert_eq!(
        report.abort(),
        Some(&SequenceAbort::InvokerNotAuthorized {
            invoker: EntityId::new("u1")
        })
    );
    assert!(report.phases.is_empty());
    assert_eq!(
        report.skipped,
        vec!["strip-groupings", "delete-groupings", "ban-members", "delete-channels"]
    );
    assert_eq!(report.elevation, ElevationStatus::NotAttempted);
    assert_eq!(platform.call_count(Operation::CreateGrouping), 0);
    assert_eq!(platform.member_ids().len(), 7);
    assert!(report.into_result().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_runs_every_phase_in_order() {
    let platform = demo_platform();
    let report = run_workflow(&platform, "owner", Workflow::Teardown).await;

    assert!(report.is_completed());
    let executed: Vec<_> = report.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        executed,
        vec!["strip-groupings", "delete-groupings", "ban-members", "delete-channels"]
    );

    // Only the default grouping and the elevation grouping survive
    assert_eq!(platform.grouping_ids(), ids(&["everyone", "grouping-1"]));
    assert_eq!(platform.member_ids(), ids(&["bot", "owner"]));

    let bans = platform.bans();
    assert_eq!(bans.len(), 5);
    assert!(bans.iter().all(|b| b.retention_days == 7));
    assert!(bans.iter().all(|b| b.reason == "integration test"));
    assert_eq!(platform.channel_names(), vec!["commands".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_aborts_without_rights_to_elevate() {
    let snapshot: PlatformSnapshot =
        serde_json::from_str(include_str!("../demos/snapshot.json")).unwrap();
    let snapshot = snapshot
        .with_failure_all(Operation::CreateGrouping)
        .with_failure_all(Operation::GrantAllPermissions);
    let platform = Arc::new(InMemoryPlatform::from_snapshot(snapshot));

    let report = run_workflow(&platform, "owner", Workflow::Teardown).await;

    assert!(matches!(
        report.abort(),
        Some(SequenceAbort::ElevationFailed(_))
    ));
    assert!(report.phases.is_empty());
    assert_eq!(report.skipped.len(), 4);
    assert_eq!(platform.grouping_ids().len(), 4);
    assert!(platform.bans().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_aborts_when_no_grouping_can_be_stripped() {
    let snapshot: PlatformSnapshot =
        serde_json::from_str(include_str!("../demos/snapshot.json")).unwrap();
    let snapshot = snapshot.with_failure_all(Operation::RemoveGrouping);
    let platform = Arc::new(InMemoryPlatform::from_snapshot(snapshot));

    let report = run_workflow(&platform, "owner", Workflow::Teardown).await;

    // u2, u3 and b1 hold no groupings and must not mask the failure
    assert_eq!(
        report.abort(),
        Some(&SequenceAbort::PhaseTotalFailure {
            phase: "strip-groupings".to_string(),
            targets: 2,
        })
    );
    assert_eq!(report.phases.len(), 1);
    assert_eq!(report.phases[0].tally().succeeded, 0);
    assert_eq!(
        report.skipped,
        vec!["delete-groupings", "ban-members", "delete-channels"]
    );
    assert_eq!(platform.grouping_ids().len(), 5);
    assert!(platform.bans().is_empty());
    assert_eq!(platform.channel_names().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_filtered_ban_touches_only_offline_humans() {
    let platform = demo_platform();
    let report = run_workflow(
        &platform,
        "owner",
        Workflow::FilteredBan(FilterPreset::Offline),
    )
    .await;

    assert!(report.is_completed());
    assert_eq!(report.elevation, ElevationStatus::NotAttempted);
    let banned: Vec<_> = platform.bans().into_iter().map(|b| b.member).collect();
    assert_eq!(banned, ids(&["u2"]));
}

#[tokio::test(start_paused = true)]
async fn test_announce_skips_protected_and_voice_channels() {
    let platform = demo_platform();
    let report = run_workflow(
        &platform,
        "owner",
        Workflow::Announce {
            message: "maintenance at noon".to_string(),
        },
    )
    .await;

    assert!(report.is_completed());
    let messages = platform.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].channel, EntityId::new("c1"));
    assert_eq!(messages[0].content, "maintenance at noon");
}

#[tokio::test(start_paused = true)]
async fn test_provision_and_purge_channels() {
    let platform = demo_platform();
    let report = run_workflow(
        &platform,
        "owner",
        Workflow::ProvisionChannels {
            names: vec!["rules".to_string(), "news".to_string()],
        },
    )
    .await;
    assert_eq!(report.totals(), (2, 0));
    let names = platform.channel_names();
    assert!(names.contains(&"rules".to_string()));
    assert!(names.contains(&"news".to_string()));

    let report = run_workflow(&platform, "owner", Workflow::ChannelPurge).await;
    assert_eq!(report.totals(), (4, 0));
    assert_eq!(platform.channel_names(), vec!["commands".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_elevate_only_moves_the_actor_to_the_top() {
    let platform = demo_platform();
    let report = run_workflow(&platform, "owner", Workflow::Elevate).await;

    assert!(report.is_completed());
    assert!(report.phases.is_empty());
    match &report.elevation {
        ElevationStatus::Elevated(elevation) => {
            assert_eq!(elevation.grouping, EntityId::new("grouping-1"));
            assert_eq!(elevation.position, 7);
            assert_eq!(elevation.attempts.len(), 1);
        }
        other => panic!("expected elevation, got {:?}", other),
    }
    assert_eq!(platform.actor_rank(), 7);
    assert_eq!(platform.member_ids().len(), 7);

    let refused = run_workflow(&platform, "u1", Workflow::Elevate).await;
    assert!(matches!(
        refused.abort(),
        Some(SequenceAbort::InvokerNotAuthorized { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_follows_the_run() {
    let platform = demo_platform();
    let config = MarshalConfig::default();
    let ctx = context(&platform, "owner");
    let sequence = Workflow::MemberRemoval.build(&ctx, &config).unwrap();

    let events = EventBus::new(config.event_capacity);
    let mut receiver = events.subscribe();
    let report = PhaseSequencer::new(ctx)
        .with_events(events)
        .run(sequence)
        .await;
    assert!(report.is_completed());

    let mut received = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        received.push(event);
    }
    let kinds: Vec<_> = received.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        kinds,
        vec![
            "sequence_started",
            "elevation_attempted",
            "phase_started",
            "progress",
            "phase_completed",
            "phase_started",
            "progress",
            "phase_completed",
            "sequence_completed",
        ]
    );
    assert!(received.last().unwrap().is_terminal());

    match &received[2] {
        OrchestratorEvent::PhaseStarted {
            index,
            total_phases,
            targets,
            ..
        } => assert_eq!((*index, *total_phases, *targets), (1, 2, 2)),
        other => panic!("unexpected event {:?}", other),
    }
}

/// Counts calls and panics on one target
struct Flaky {
    calls: AtomicUsize,
}

#[async_trait]
impl Action for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match target.id.as_str() {
            "t2" => panic!("unexpected state for t2"),
            "t3" => Err(ActionError::Failed("t3 refused".to_string())),
            _ => Ok(()),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_phase_survives_panics_and_retries_failures() {
    let platform = demo_platform();
    let action = Arc::new(Flaky {
        calls: AtomicUsize::new(0),
    });
    let targets: Vec<_> = (1..=4)
        .map(|i| Target::member(format!("t{}", i), format!("target-{}", i), 0))
        .collect();
    let sequence = PhaseSequence::new("custom").phase(
        Phase::new("flaky", action.clone(), TargetSource::fixed(targets))
            .with_executor(ExecutorConfig::new(2, Duration::from_millis(50))),
    );

    let sequencer = PhaseSequencer::new(context(&platform, "owner"));
    let report = sequencer.run(sequence.clone()).await;
    assert_eq!(report.outcome, SequenceOutcome::Completed);
    assert_eq!(report.totals(), (2, 2));

    let retry = sequence.retry_failed(&report).unwrap();
    assert_eq!(retry.name, "custom-retry");
    let retried = sequencer.run(retry).await;
    assert_eq!(retried.totals(), (0, 2));
    assert_eq!(action.calls.load(Ordering::SeqCst), 6);
}
