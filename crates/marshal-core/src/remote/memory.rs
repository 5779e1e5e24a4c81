//! Simulated platform backed by in-process state
//!
//! Enforces the hierarchy rule real platforms apply (nothing ranked at or
//! above the acting identity can be mutated), supports injected failures and
//! latency, and records peak concurrency so callers can observe how many
//! calls were in flight at once.

use super::snapshot::{
    BanRecord, ChannelRecord, FailureRule, GroupingRecord, MemberRecord, Operation,
    PlatformSnapshot,
};
use super::{ChannelHandle, GroupingSpec, PlatformClient, RemoteError, RemoteResult};
use crate::target::{ChannelKind, EntityId, EntityKind, Target};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A message accepted by the simulated platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: EntityId,
    pub content: String,
}

#[derive(Debug)]
struct PlatformState {
    actor: EntityId,
    groupings: Vec<GroupingRecord>,
    members: Vec<MemberRecord>,
    channels: Vec<ChannelRecord>,
    bans: Vec<BanRecord>,
    removed: Vec<EntityId>,
    messages: Vec<SentMessage>,
    next_id: u64,
}

impl PlatformState {
    fn grouping(&self, id: &EntityId) -> RemoteResult<&GroupingRecord> {
        self.groupings
            .iter()
            .find(|g| &g.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("grouping '{}'", id)))
    }

    fn member_index(&self, id: &EntityId) -> RemoteResult<usize> {
        self.members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("member '{}'", id)))
    }

    fn member_rank(&self, member: &MemberRecord) -> u32 {
        if member.owner {
            return u32::MAX;
        }
        member
            .groupings
            .iter()
            .filter_map(|id| self.groupings.iter().find(|g| &g.id == id))
            .map(|g| g.position)
            .max()
            .unwrap_or(0)
    }

    fn member_is_admin(&self, member: &MemberRecord) -> bool {
        member.owner
            || member
                .groupings
                .iter()
                .filter_map(|id| self.groupings.iter().find(|g| &g.id == id))
                .any(|g| g.admin)
    }

    fn actor_rank(&self) -> u32 {
        self.members
            .iter()
            .find(|m| m.id == self.actor)
            .map(|m| self.member_rank(m))
            .unwrap_or(0)
    }

    fn require_actor_admin(&self, what: &str) -> RemoteResult<()> {
        let admin = self
            .members
            .iter()
            .find(|m| m.id == self.actor)
            .is_some_and(|m| self.member_is_admin(m));
        if admin {
            Ok(())
        } else {
            Err(RemoteError::Forbidden(format!(
                "acting identity lacks the permission to {}",
                what
            )))
        }
    }

    fn check_member_hierarchy(&self, index: usize) -> RemoteResult<()> {
        let member = &self.members[index];
        if member.id == self.actor {
            return Err(RemoteError::Forbidden(
                "the acting identity cannot target itself".to_string(),
            ));
        }
        if self.member_rank(member) >= self.actor_rank() {
            return Err(RemoteError::Forbidden(format!(
                "member '{}' is ranked at or above the acting identity",
                member.id
            )));
        }
        Ok(())
    }

    fn check_grouping_hierarchy(&self, grouping: &GroupingRecord) -> RemoteResult<()> {
        if grouping.position >= self.actor_rank() {
            return Err(RemoteError::Forbidden(format!(
                "grouping '{}' is ranked at or above the acting identity",
                grouping.id
            )));
        }
        Ok(())
    }

    fn next_id(&mut self, prefix: &str) -> EntityId {
        self.next_id += 1;
        EntityId::new(format!("{}-{}", prefix, self.next_id))
    }

    fn member_target(&self, member: &MemberRecord) -> Target {
        let mut target = Target::member(member.id.clone(), member.name.clone(), self.member_rank(member))
            .with_presence(member.presence)
            .with_groupings(member.groupings.iter().cloned());
        target.is_bot = member.bot;
        target.is_admin = self.member_is_admin(member);
        target.protected = member.owner;
        target
    }

    fn grouping_target(grouping: &GroupingRecord) -> Target {
        let mut target = Target::grouping(grouping.id.clone(), grouping.name.clone(), grouping.position);
        target.is_admin = grouping.admin;
        target.protected = grouping.is_default;
        target
    }

    fn channel_target(channel: &ChannelRecord) -> Target {
        let mut target = Target::channel(channel.id.clone(), channel.name.clone(), channel.kind);
        target.protected = channel.protected;
        target
    }
}

/// Decrements the in-flight counter when a call settles
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process implementation of [`PlatformClient`]
#[derive(Debug)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
    failures: Vec<FailureRule>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: Mutex<Vec<(Operation, Option<EntityId>)>>,
}

impl InMemoryPlatform {
    pub fn from_snapshot(snapshot: PlatformSnapshot) -> Self {
        let mut groupings = snapshot.groupings;
        if !groupings.iter().any(|g| g.is_default) {
            groupings.insert(0, GroupingRecord::new("everyone", "everyone", 0).default_grouping());
        }

        Self {
            state: Mutex::new(PlatformState {
                actor: snapshot.actor,
                groupings,
                members: snapshot.members,
                channels: snapshot.channels,
                bans: Vec::new(),
                removed: Vec::new(),
                messages: Vec::new(),
                next_id: 0,
            }),
            failures: snapshot.failures,
            latency: snapshot.latency_ms.map(Duration::from_millis),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn begin(&self, operation: Operation, target: Option<&EntityId>) -> RemoteResult<InFlight<'_>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        self.calls.lock().push((operation, target.cloned()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self.failures.iter().any(|rule| {
            rule.operation == operation
                && (rule.targets.is_empty() || target.is_some_and(|t| rule.targets.contains(t)))
        });
        if injected {
            return Err(RemoteError::Http {
                status: 503,
                message: format!(
                    "injected failure for {:?}{}",
                    operation,
                    target.map(|t| format!(" on '{}'", t)).unwrap_or_default()
                ),
            });
        }

        Ok(guard)
    }

    /// Highest number of calls observed in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls.lock().iter().filter(|(op, _)| *op == operation).count()
    }

    pub fn member_ids(&self) -> Vec<EntityId> {
        self.state.lock().members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn removed_ids(&self) -> Vec<EntityId> {
        self.state.lock().removed.clone()
    }

    pub fn bans(&self) -> Vec<BanRecord> {
        self.state.lock().bans.clone()
    }

    pub fn grouping_ids(&self) -> Vec<EntityId> {
        self.state.lock().groupings.iter().map(|g| g.id.clone()).collect()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.state.lock().channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.state.lock().messages.clone()
    }

    /// Groupings currently held by `member`
    pub fn groupings_of(&self, member: &EntityId) -> Vec<EntityId> {
        let state = self.state.lock();
        state
            .members
            .iter()
            .find(|m| &m.id == member)
            .map(|m| m.groupings.clone())
            .unwrap_or_default()
    }

    pub fn actor_rank(&self) -> u32 {
        self.state.lock().actor_rank()
    }
}

#[async_trait]
impl PlatformClient for InMemoryPlatform {
    async fn list_entities(&self, kind: EntityKind) -> RemoteResult<Vec<Target>> {
        let _call = self.begin(Operation::ListEntities, None).await?;
        let state = self.state.lock();
        let targets = match kind {
            EntityKind::Member => state.members.iter().map(|m| state.member_target(m)).collect(),
            EntityKind::Grouping => state.groupings.iter().map(PlatformState::grouping_target).collect(),
            EntityKind::Channel => state.channels.iter().map(PlatformState::channel_target).collect(),
        };
        Ok(targets)
    }

    async fn remove_membership(&self, member: &EntityId, _reason: &str) -> RemoteResult<()> {
        let _call = self.begin(Operation::RemoveMembership, Some(member)).await?;
        let mut state = self.state.lock();
        let index = state.member_index(member)?;
        state.check_member_hierarchy(index)?;
        let record = state.members.remove(index);
        state.removed.push(record.id);
        Ok(())
    }

    async fn remove_grouping(
        &self,
        member: &EntityId,
        grouping: &EntityId,
        _reason: &str,
    ) -> RemoteResult<()> {
        let _call = self.begin(Operation::RemoveGrouping, Some(member)).await?;
        let mut state = self.state.lock();
        let index = state.member_index(member)?;
        state.check_member_hierarchy(index)?;
        state.check_grouping_hierarchy(state.grouping(grouping)?)?;
        let held = &mut state.members[index].groupings;
        let before = held.len();
        held.retain(|g| g != grouping);
        if held.len() == before {
            return Err(RemoteError::NotFound(format!(
                "member '{}' does not hold grouping '{}'",
                member, grouping
            )));
        }
        Ok(())
    }

    async fn delete_grouping(&self, grouping: &EntityId, _reason: &str) -> RemoteResult<()> {
        let _call = self.begin(Operation::DeleteGrouping, Some(grouping)).await?;
        let mut state = self.state.lock();
        let record = state.grouping(grouping)?;
        if record.is_default {
            return Err(RemoteError::Forbidden("the default grouping cannot be deleted".to_string()));
        }
        state.check_grouping_hierarchy(record)?;
        state.groupings.retain(|g| &g.id != grouping);
        for member in state.members.iter_mut() {
            member.groupings.retain(|g| g != grouping);
        }
        Ok(())
    }

    async fn ban_membership(
        &self,
        member: &EntityId,
        reason: &str,
        retention_days: u8,
    ) -> RemoteResult<()> {
        let _call = self.begin(Operation::BanMembership, Some(member)).await?;
        let mut state = self.state.lock();
        let index = state.member_index(member)?;
        state.check_member_hierarchy(index)?;
        let record = state.members.remove(index);
        state.bans.push(BanRecord {
            member: record.id,
            reason: reason.to_string(),
            retention_days,
        });
        Ok(())
    }

    async fn create_channel(&self, name: &str, _reason: &str) -> RemoteResult<ChannelHandle> {
        let _call = self.begin(Operation::CreateChannel, None).await?;
        let mut state = self.state.lock();
        state.require_actor_admin("manage channels")?;
        let id = state.next_id("channel");
        state.channels.push(ChannelRecord::text(id.clone(), name));
        Ok(ChannelHandle {
            id,
            name: name.to_string(),
        })
    }

    async fn delete_channel(&self, channel: &EntityId, _reason: &str) -> RemoteResult<()> {
        let _call = self.begin(Operation::DeleteChannel, Some(channel)).await?;
        let mut state = self.state.lock();
        state.require_actor_admin("manage channels")?;
        let before = state.channels.len();
        state.channels.retain(|c| &c.id != channel);
        if state.channels.len() == before {
            return Err(RemoteError::NotFound(format!("channel '{}'", channel)));
        }
        Ok(())
    }

    async fn send_message(&self, channel: &EntityId, content: &str) -> RemoteResult<()> {
        let _call = self.begin(Operation::SendMessage, Some(channel)).await?;
        let mut state = self.state.lock();
        let record = state
            .channels
            .iter()
            .find(|c| &c.id == channel)
            .ok_or_else(|| RemoteError::NotFound(format!("channel '{}'", channel)))?;
        if record.kind != ChannelKind::Text {
            return Err(RemoteError::Other(format!(
                "channel '{}' does not accept messages",
                channel
            )));
        }
        state.messages.push(SentMessage {
            channel: channel.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn create_grouping(&self, spec: &GroupingSpec, _reason: &str) -> RemoteResult<EntityId> {
        let _call = self.begin(Operation::CreateGrouping, None).await?;
        let mut state = self.state.lock();
        state.require_actor_admin("manage groupings")?;
        let id = state.next_id("grouping");
        let mut record = GroupingRecord::new(id.clone(), spec.name.clone(), 1);
        record.admin = spec.all_permissions;
        state.groupings.push(record);
        Ok(id)
    }

    async fn assign_grouping(
        &self,
        member: &EntityId,
        grouping: &EntityId,
        _reason: &str,
    ) -> RemoteResult<()> {
        let _call = self.begin(Operation::AssignGrouping, Some(member)).await?;
        let mut state = self.state.lock();
        state.check_grouping_hierarchy(state.grouping(grouping)?)?;
        let index = state.member_index(member)?;
        let held = &mut state.members[index].groupings;
        if !held.contains(grouping) {
            held.push(grouping.clone());
        }
        Ok(())
    }

    async fn grant_all_permissions(&self, grouping: &EntityId, _reason: &str) -> RemoteResult<()> {
        let _call = self.begin(Operation::GrantAllPermissions, Some(grouping)).await?;
        let mut state = self.state.lock();
        state.require_actor_admin("manage groupings")?;
        state.grouping(grouping)?;
        if let Some(record) = state.groupings.iter_mut().find(|g| &g.id == grouping) {
            record.admin = true;
        }
        Ok(())
    }

    async fn move_grouping_to_top(&self, grouping: &EntityId, _reason: &str) -> RemoteResult<u32> {
        let _call = self.begin(Operation::MoveGroupingToTop, Some(grouping)).await?;
        let mut state = self.state.lock();
        state.require_actor_admin("manage groupings")?;
        state.grouping(grouping)?;
        let top = state
            .groupings
            .iter()
            .filter(|g| &g.id != grouping)
            .map(|g| g.position)
            .max()
            .unwrap_or(0);
        let record = state
            .groupings
            .iter_mut()
            .find(|g| &g.id == grouping)
            .ok_or_else(|| RemoteError::NotFound(format!("grouping '{}'", grouping)))?;
        if record.position <= top {
            record.position = top + 1;
        }
        Ok(record.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Presence;

    fn platform() -> InMemoryPlatform {
        InMemoryPlatform::from_snapshot(
            PlatformSnapshot::new("bot")
                .with_grouping(GroupingRecord::new("admin", "Admin", 8).admin())
                .with_grouping(GroupingRecord::new("mod", "Moderator", 5))
                .with_grouping(GroupingRecord::new("top", "Founders", 9))
                .with_member(MemberRecord::new("bot", "marshal").bot().with_groupings(["admin"]))
                .with_member(MemberRecord::new("u1", "alice").with_groupings(["mod"]))
                .with_member(MemberRecord::new("u2", "bob").with_presence(Presence::Online))
                .with_member(MemberRecord::new("u3", "carol").with_groupings(["top"]))
                .with_member(MemberRecord::new("own", "owner").owner())
                .with_channel(ChannelRecord::text("c1", "general"))
                .with_channel(ChannelRecord::voice("c2", "lounge")),
        )
    }

    #[tokio::test]
    async fn test_list_members_derives_rank_and_flags() {
        let p = platform();
        let members = p.list_entities(EntityKind::Member).await.unwrap();
        let bot = members.iter().find(|m| m.id.as_str() == "bot").unwrap();
        assert_eq!(bot.rank, 8);
        assert!(bot.is_admin && bot.is_bot);
        let owner = members.iter().find(|m| m.id.as_str() == "own").unwrap();
        assert!(owner.protected);
        assert_eq!(owner.rank, u32::MAX);
    }

    #[tokio::test]
    async fn test_default_grouping_is_added_and_protected() {
        let p = platform();
        let groupings = p.list_entities(EntityKind::Grouping).await.unwrap();
        let everyone = groupings.iter().find(|g| g.id.as_str() == "everyone").unwrap();
        assert!(everyone.protected);
        let err = p.delete_grouping(&EntityId::new("everyone"), "cleanup").await.unwrap_err();
        assert!(matches!(err, RemoteError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_hierarchy_rule_is_enforced() {
        let p = platform();
        assert!(p.remove_membership(&EntityId::new("u1"), "r").await.is_ok());
        let err = p.remove_membership(&EntityId::new("u3"), "r").await.unwrap_err();
        assert!(matches!(err, RemoteError::Forbidden(_)));
        let err = p.ban_membership(&EntityId::new("bot"), "r", 7).await.unwrap_err();
        assert!(matches!(err, RemoteError::Forbidden(_)));
        assert_eq!(p.removed_ids(), vec![EntityId::new("u1")]);
    }

    #[tokio::test]
    async fn test_ban_records_retention() {
        let p = platform();
        p.ban_membership(&EntityId::new("u2"), "spam", 7).await.unwrap();
        let bans = p.bans();
        assert_eq!(bans.len(), 1);
        assert_eq!(bans[0].retention_days, 7);
        assert!(!p.member_ids().contains(&EntityId::new("u2")));
    }

    #[tokio::test]
    async fn test_delete_grouping_strips_holders() {
        let p = platform();
        p.delete_grouping(&EntityId::new("mod"), "cleanup").await.unwrap();
        assert!(p.groupings_of(&EntityId::new("u1")).is_empty());
        assert!(!p.grouping_ids().contains(&EntityId::new("mod")));
    }

    #[tokio::test]
    async fn test_move_to_top_outranks_everything() {
        let p = platform();
        let position = p
            .move_grouping_to_top(&EntityId::new("admin"), "elevate")
            .await
            .unwrap();
        assert_eq!(position, 10);
        assert_eq!(p.actor_rank(), 10);
    }

    #[tokio::test]
    async fn test_send_message_rejects_voice_channels() {
        let p = platform();
        p.send_message(&EntityId::new("c1"), "hello").await.unwrap();
        assert!(p.send_message(&EntityId::new("c2"), "hello").await.is_err());
        assert_eq!(p.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_match_targets() {
        let p = InMemoryPlatform::from_snapshot(
            PlatformSnapshot::new("bot")
                .with_grouping(GroupingRecord::new("admin", "Admin", 8).admin())
                .with_member(MemberRecord::new("bot", "marshal").with_groupings(["admin"]))
                .with_member(MemberRecord::new("u1", "alice"))
                .with_member(MemberRecord::new("u2", "bob"))
                .with_failure(Operation::RemoveMembership, ["u1"]),
        );
        let err = p.remove_membership(&EntityId::new("u1"), "r").await.unwrap_err();
        assert!(matches!(err, RemoteError::Http { status: 503, .. }));
        assert!(p.remove_membership(&EntityId::new("u2"), "r").await.is_ok());
        assert_eq!(p.call_count(Operation::RemoveMembership), 2);
        assert_eq!(p.peak_in_flight(), 1);
    }
}
