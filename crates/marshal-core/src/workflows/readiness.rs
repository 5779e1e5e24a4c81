//! Readiness assessment before a bulk run

use crate::context::OperationContext;
use crate::error::{MarshalError, MarshalResult};
use crate::target::{EntityKind, Exclusion, TargetFilter};
use serde::Serialize;

/// What the acting identity can reach right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub actor_rank: u32,
    /// Highest position of any grouping
    pub top_grouping_rank: u32,
    pub actor_is_admin: bool,
    pub invoker_is_admin: bool,
    pub members_total: usize,
    pub members_online: usize,
    pub members_offline: usize,
    pub bots: usize,
    pub eligible_members: usize,
    /// Members left out only because they rank at or above the actor
    pub shielded_by_rank: usize,
    pub eligible_groupings: usize,
    pub eligible_channels: usize,
}

impl ReadinessReport {
    /// The actor holds administrator rights and nothing outranks it
    pub fn is_ready(&self) -> bool {
        self.actor_is_admin && self.actor_on_top()
    }

    pub fn actor_on_top(&self) -> bool {
        self.actor_rank >= self.top_grouping_rank
    }
}

/// Snapshot members, groupings and channels and measure reach
pub async fn assess(ctx: &OperationContext) -> MarshalResult<ReadinessReport> {
    let members = ctx.snapshot(EntityKind::Member).await?;
    let groupings = ctx.snapshot(EntityKind::Grouping).await?;
    let channels = ctx.snapshot(EntityKind::Channel).await?;

    let actor = members
        .iter()
        .find(|m| m.id == ctx.actor)
        .ok_or_else(|| {
            MarshalError::not_found_resource(format!("acting identity '{}'", ctx.actor), "member")
        })?;
    let invoker_is_admin = members
        .iter()
        .find(|m| m.id == ctx.invoker)
        .is_some_and(|m| m.is_admin);
    let filter = TargetFilter::new(ctx.actor.clone(), ctx.invoker.clone(), actor.rank);

    let humans = members.iter().filter(|m| !m.is_bot);
    let members_online = humans.clone().filter(|m| m.presence.is_online()).count();

    Ok(ReadinessReport {
        actor_rank: actor.rank,
        top_grouping_rank: groupings.iter().map(|g| g.rank).max().unwrap_or(0),
        actor_is_admin: actor.is_admin,
        invoker_is_admin,
        members_total: members.len(),
        members_online,
        members_offline: humans.count() - members_online,
        bots: members.iter().filter(|m| m.is_bot).count(),
        eligible_members: filter.apply(&members).len(),
        shielded_by_rank: members
            .iter()
            .filter(|m| matches!(filter.exclusion(m), Some(Exclusion::Outranks { .. })))
            .count(),
        eligible_groupings: filter.apply(&groupings).len(),
        eligible_channels: filter.apply(&channels).len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{
        ChannelRecord, GroupingRecord, InMemoryPlatform, MemberRecord, Operation, PlatformClient,
        PlatformSnapshot,
    };
    use crate::target::Presence;
    use std::sync::Arc;

    fn snapshot() -> PlatformSnapshot {
        PlatformSnapshot::new("bot")
            .with_grouping(GroupingRecord::new("admin", "Admin", 5).admin())
            .with_grouping(GroupingRecord::new("founders", "Founders", 8))
            .with_grouping(GroupingRecord::new("helper", "Helper", 2))
            .with_member(MemberRecord::new("bot", "marshal").bot().with_groupings(["admin"]))
            .with_member(MemberRecord::new("boss", "boss").owner())
            .with_member(MemberRecord::new("f1", "frank").with_groupings(["founders"]))
            .with_member(MemberRecord::new("u1", "alice").with_presence(Presence::Online))
            .with_member(MemberRecord::new("u2", "bob").with_groupings(["helper"]))
            .with_member(MemberRecord::new("b1", "music").bot())
            .with_channel(ChannelRecord::text("c1", "general"))
            .with_channel(ChannelRecord::text("c0", "commands").protected())
    }

    #[tokio::test]
    async fn test_assess_counts() {
        let platform = Arc::new(InMemoryPlatform::from_snapshot(snapshot()));
        let ctx = OperationContext::new("bot", "boss", platform, "inspect");
        let report = assess(&ctx).await.unwrap();

        assert_eq!(report.actor_rank, 5);
        assert_eq!(report.top_grouping_rank, 8);
        assert!(report.actor_is_admin);
        assert!(report.invoker_is_admin);
        assert!(!report.actor_on_top());
        assert!(!report.is_ready());
        assert_eq!(report.members_total, 6);
        assert_eq!(report.bots, 2);
        assert_eq!(report.members_online, 1);
        assert_eq!(report.members_offline, 3);
        // u1, u2, b1
        assert_eq!(report.eligible_members, 3);
        assert_eq!(report.shielded_by_rank, 1);
        // helper only; everyone is protected, admin and founders outrank
        assert_eq!(report.eligible_groupings, 1);
        assert_eq!(report.eligible_channels, 1);
    }

    #[tokio::test]
    async fn test_missing_actor_is_not_found() {
        let platform = Arc::new(InMemoryPlatform::from_snapshot(snapshot()));
        let ctx = OperationContext::new("ghost", "boss", platform, "inspect");
        let err = assess(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            MarshalError::NotFound { resource_type: Some(ref kind), .. } if kind == "member"
        ));
    }

    #[tokio::test]
    async fn test_listing_failure_surfaces_as_remote_error() {
        let platform = Arc::new(InMemoryPlatform::from_snapshot(
            snapshot().with_failure_all(Operation::ListEntities),
        ));
        let ctx = OperationContext::new("bot", "boss", platform, "inspect");
        let err = assess(&ctx).await.unwrap_err();
        assert!(matches!(err, MarshalError::Remote { .. }));
    }

    #[tokio::test]
    async fn test_ready_after_moving_to_top() {
        let platform = Arc::new(InMemoryPlatform::from_snapshot(snapshot()));
        platform
            .move_grouping_to_top(&"admin".into(), "elevate")
            .await
            .unwrap();
        let ctx = OperationContext::new("bot", "boss", platform, "inspect");
        let report = assess(&ctx).await.unwrap();
        assert!(report.is_ready());
        assert_eq!(report.shielded_by_rank, 0);
    }
}
