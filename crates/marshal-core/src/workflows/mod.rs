//! Ready-made workflows
//!
//! Each workflow builds a fresh [`PhaseSequence`] for one invocation from an
//! operation context and the configured executor profiles.

mod actions;
mod readiness;

pub use actions::{
    BanMember, CreateChannel, DeleteChannel, DeleteGrouping, RemoveMember, SendMessage,
    StripGroupings,
};
pub use readiness::{ReadinessReport, assess};

use crate::config::MarshalConfig;
use crate::context::OperationContext;
use crate::error::{MarshalError, MarshalResult};
use crate::executor::Action;
use crate::sequencer::{ElevationPolicy, Phase, PhaseSequence, TargetSource};
use crate::target::{EntityKind, FilterPreset, Target};
use std::fmt;
use std::sync::Arc;

/// A bulk administrative workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    /// Strip groupings from every eligible member, then remove them
    MemberRemoval,
    /// Strip groupings from every eligible member, then ban them
    MemberBan,
    /// Remove members matching a preset
    FilteredRemoval(FilterPreset),
    /// Ban members matching a preset
    FilteredBan(FilterPreset),
    /// Strip groupings, delete groupings, ban members, delete channels
    Teardown,
    /// Delete every unprotected channel
    ChannelPurge,
    /// Post one message to every text channel
    Announce { message: String },
    /// Create channels with the given names
    ProvisionChannels { names: Vec<String> },
    /// Only raise the acting identity to the top of the grouping order
    Elevate,
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::MemberRemoval => "member-removal",
            Workflow::MemberBan => "member-ban",
            Workflow::FilteredRemoval(_) => "filtered-removal",
            Workflow::FilteredBan(_) => "filtered-ban",
            Workflow::Teardown => "teardown",
            Workflow::ChannelPurge => "channel-purge",
            Workflow::Announce { .. } => "announce",
            Workflow::ProvisionChannels { .. } => "provision-channels",
            Workflow::Elevate => "elevate",
        }
    }

    /// Whether the workflow removes or deletes anything
    pub fn is_destructive(&self) -> bool {
        !matches!(
            self,
            Workflow::Announce { .. } | Workflow::ProvisionChannels { .. } | Workflow::Elevate
        )
    }

    /// Build the phase sequence for one invocation
    pub fn build(&self, ctx: &OperationContext, config: &MarshalConfig) -> MarshalResult<PhaseSequence> {
        let client = ctx.client.clone();
        let reason = ctx.reason.clone();
        let profiles = &config.executors;
        let members = || TargetSource::eligible(EntityKind::Member);
        // Only members with something to strip
        let strip = || {
            Phase::new(
                "strip-groupings",
                Arc::new(StripGroupings::new(client.clone(), reason.clone())) as Arc<dyn Action>,
                members().with_predicate("holds-groupings", Arc::new(Target::holds_groupings)),
            )
            .with_executor(profiles.grouping)
        };
        let remove: Arc<dyn Action> = Arc::new(RemoveMember::new(client.clone(), reason.clone()));
        let ban: Arc<dyn Action> = Arc::new(BanMember::new(
            client.clone(),
            reason.clone(),
            config.ban_retention_days,
        ));
        let delete_channels = || {
            Phase::new(
                "delete-channels",
                Arc::new(DeleteChannel::new(client.clone(), reason.clone())) as Arc<dyn Action>,
                TargetSource::eligible(EntityKind::Channel),
            )
            .with_executor(profiles.channel)
        };

        let sequence = PhaseSequence::new(self.name());
        let sequence = match self {
            Workflow::MemberRemoval => sequence
                .with_elevation(ElevationPolicy::BestEffort)
                .phase(strip())
                .phase(Phase::new("remove-members", remove, members()).with_executor(profiles.removal)),
            Workflow::MemberBan => sequence
                .with_elevation(ElevationPolicy::BestEffort)
                .phase(strip())
                .phase(Phase::new("ban-members", ban, members()).with_executor(profiles.ban)),
            Workflow::FilteredRemoval(preset) => sequence.phase(
                Phase::new("remove-members", remove, members().with_preset(*preset))
                    .with_executor(profiles.removal),
            ),
            Workflow::FilteredBan(preset) => sequence.phase(
                Phase::new("ban-members", ban, members().with_preset(*preset))
                    .with_executor(profiles.ban),
            ),
            Workflow::Teardown => sequence
                .with_elevation(ElevationPolicy::Required)
                .require_invoker_admin()
                .phase(strip().abort_on_total_failure())
                .phase(
                    Phase::new(
                        "delete-groupings",
                        Arc::new(DeleteGrouping::new(client.clone(), reason.clone())),
                        TargetSource::eligible(EntityKind::Grouping),
                    )
                    .with_executor(profiles.grouping),
                )
                .phase(Phase::new("ban-members", ban, members()).with_executor(profiles.teardown_ban))
                .phase(delete_channels()),
            Workflow::ChannelPurge => sequence.require_invoker_admin().phase(delete_channels()),
            Workflow::Elevate => sequence
                .with_elevation(ElevationPolicy::Required)
                .require_invoker_admin(),
            Workflow::Announce { message } => {
                if message.trim().is_empty() {
                    return Err(MarshalError::invalid_input_field(
                        "announcement message must not be empty",
                        "message",
                    ));
                }
                sequence.phase(
                    Phase::new(
                        "send-messages",
                        Arc::new(SendMessage::new(client.clone(), message.clone())),
                        TargetSource::eligible(EntityKind::Channel)
                            .with_predicate("text", Arc::new(Target::is_text_channel)),
                    )
                    .with_executor(profiles.message),
                )
            }
            Workflow::ProvisionChannels { names } => {
                let blueprints: Vec<Target> = names
                    .iter()
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map(Target::channel_blueprint)
                    .collect();
                if blueprints.is_empty() {
                    return Err(MarshalError::invalid_input_field(
                        "at least one channel name is required",
                        "channels",
                    ));
                }
                sequence.phase(
                    Phase::new(
                        "create-channels",
                        Arc::new(CreateChannel::new(client.clone(), reason.clone())),
                        TargetSource::fixed(blueprints),
                    )
                    .with_executor(profiles.channel),
                )
            }
        };
        Ok(sequence)
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workflow::FilteredRemoval(preset) | Workflow::FilteredBan(preset) => {
                write!(f, "{} ({})", self.name(), preset)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{InMemoryPlatform, PlatformSnapshot};

    fn ctx() -> OperationContext {
        let platform = Arc::new(InMemoryPlatform::from_snapshot(PlatformSnapshot::new("bot")));
        OperationContext::new("bot", "boss", platform, "test")
    }

    #[test]
    fn test_teardown_shape() {
        let sequence = Workflow::Teardown.build(&ctx(), &MarshalConfig::default()).unwrap();
        assert_eq!(
            sequence.phase_names(),
            vec!["strip-groupings", "delete-groupings", "ban-members", "delete-channels"]
        );
        assert_eq!(sequence.elevation, ElevationPolicy::Required);
        assert!(sequence.require_invoker_admin);
        assert!(sequence.phases[0].abort_on_total_failure);
        assert_eq!(sequence.phases[2].executor.chunk_size, 75);
    }

    #[test]
    fn test_filtered_workflows_skip_elevation() {
        let sequence = Workflow::FilteredBan(FilterPreset::Offline)
            .build(&ctx(), &MarshalConfig::default())
            .unwrap();
        assert_eq!(sequence.elevation, ElevationPolicy::Skip);
        assert_eq!(sequence.phase_names(), vec!["ban-members"]);
        assert_eq!(sequence.phases[0].executor.chunk_size, 50);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let config = MarshalConfig::default();
        let err = Workflow::Announce {
            message: "  ".to_string(),
        }
        .build(&ctx(), &config)
        .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidInput { .. }));

        assert!(
            Workflow::ProvisionChannels {
                names: vec![" ".to_string()]
            }
            .build(&ctx(), &config)
            .is_err()
        );
    }

    #[test]
    fn test_elevate_has_no_phases() {
        let sequence = Workflow::Elevate.build(&ctx(), &MarshalConfig::default()).unwrap();
        assert!(sequence.phases.is_empty());
        assert_eq!(sequence.elevation, ElevationPolicy::Required);
        assert!(sequence.require_invoker_admin);
        assert!(!Workflow::Elevate.is_destructive());
    }

    #[test]
    fn test_display_includes_preset() {
        assert_eq!(
            Workflow::FilteredRemoval(FilterPreset::Bots).to_string(),
            "filtered-removal (bots)"
        );
        assert!(!Workflow::ProvisionChannels { names: Vec::new() }.is_destructive());
    }
}
