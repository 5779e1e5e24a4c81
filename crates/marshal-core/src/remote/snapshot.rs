//! Serializable platform state for the simulated platform

use crate::error::{MarshalError, MarshalResult};
use crate::target::{ChannelKind, EntityId, Presence};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Platform operations that can be made to fail in simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ListEntities,
    RemoveMembership,
    RemoveGrouping,
    DeleteGrouping,
    BanMembership,
    CreateChannel,
    DeleteChannel,
    SendMessage,
    CreateGrouping,
    AssignGrouping,
    GrantAllPermissions,
    MoveGroupingToTop,
}

/// Injected failure for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRule {
    pub operation: Operation,
    /// Only these entities fail; every call fails when empty
    #[serde(default)]
    pub targets: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingRecord {
    pub id: EntityId,
    pub name: String,
    pub position: u32,
    #[serde(default)]
    pub admin: bool,
    /// The implicit grouping every member holds; cannot be deleted
    #[serde(default)]
    pub is_default: bool,
}

impl GroupingRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, position: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            admin: false,
            is_default: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn default_grouping(mut self) -> Self {
        self.is_default = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub groupings: Vec<EntityId>,
    #[serde(default)]
    pub owner: bool,
}

impl MemberRecord {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
            presence: Presence::Offline,
            groupings: Vec::new(),
            owner: false,
        }
    }

    pub fn bot(mut self) -> Self {
        self.bot = true;
        self
    }

    pub fn owner(mut self) -> Self {
        self.owner = true;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_groupings(mut self, groupings: impl IntoIterator<Item = impl Into<EntityId>>) -> Self {
        self.groupings = groupings.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub kind: ChannelKind,
    /// Excluded from bulk actions (e.g. the channel commands are issued from)
    #[serde(default)]
    pub protected: bool,
}

impl ChannelRecord {
    pub fn text(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ChannelKind::Text,
            protected: false,
        }
    }

    pub fn voice(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            kind: ChannelKind::Voice,
            ..Self::text(id, name)
        }
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub member: EntityId,
    pub reason: String,
    pub retention_days: u8,
}

/// Full platform state plus simulation knobs, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    /// Identity the orchestrator acts as
    pub actor: EntityId,
    #[serde(default)]
    pub groupings: Vec<GroupingRecord>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
    #[serde(default)]
    pub failures: Vec<FailureRule>,
    /// Simulated latency of every platform call
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

impl PlatformSnapshot {
    pub fn new(actor: impl Into<EntityId>) -> Self {
        Self {
            actor: actor.into(),
            groupings: Vec::new(),
            members: Vec::new(),
            channels: Vec::new(),
            failures: Vec::new(),
            latency_ms: None,
        }
    }

    pub fn with_grouping(mut self, grouping: GroupingRecord) -> Self {
        self.groupings.push(grouping);
        self
    }

    pub fn with_member(mut self, member: MemberRecord) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_channel(mut self, channel: ChannelRecord) -> Self {
        self.channels.push(channel);
        self
    }

    /// Fail `operation` for the listed targets, or for every call if empty
    pub fn with_failure(
        mut self,
        operation: Operation,
        targets: impl IntoIterator<Item = impl Into<EntityId>>,
    ) -> Self {
        self.failures.push(FailureRule {
            operation,
            targets: targets.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Fail every call of `operation`
    pub fn with_failure_all(mut self, operation: Operation) -> Self {
        self.failures.push(FailureRule {
            operation,
            targets: Vec::new(),
        });
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> MarshalResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MarshalError::io_with_path(
                format!("Failed to read snapshot file: {}", e),
                path.display().to_string(),
            )
        })?;
        serde_json::from_str(&content).map_err(|e| {
            MarshalError::json(format!("Failed to parse snapshot: {}", e))
                .with_context(format!("Deserializing snapshot from '{}'", path.display()))
        })
    }

    pub fn validate(&self) -> MarshalResult<()> {
        if !self.members.iter().any(|m| m.id == self.actor) {
            return Err(MarshalError::invalid_input_field(
                format!("actor '{}' is not a member of the snapshot", self.actor),
                "actor",
            ));
        }
        for member in &self.members {
            for grouping in &member.groupings {
                if !self.groupings.iter().any(|g| &g.id == grouping) {
                    return Err(MarshalError::invalid_input(format!(
                        "member '{}' holds unknown grouping '{}'",
                        member.id, grouping
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_snapshot_from_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "actor": "bot",
                "groupings": [{{"id": "mod", "name": "Moderator", "position": 4, "admin": true}}],
                "members": [
                    {{"id": "bot", "name": "marshal", "bot": true, "groupings": ["mod"]}},
                    {{"id": "u1", "name": "alice", "presence": "do_not_disturb"}}
                ],
                "channels": [{{"id": "c1", "name": "general"}}],
                "failures": [{{"operation": "remove_membership", "targets": ["u1"]}}],
                "latency_ms": 5
            }}"#
        )
        .unwrap();

        let snapshot = PlatformSnapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.actor, EntityId::new("bot"));
        assert_eq!(snapshot.members[1].presence, Presence::DoNotDisturb);
        assert_eq!(snapshot.channels[0].kind, ChannelKind::Text);
        assert_eq!(snapshot.failures[0].operation, Operation::RemoveMembership);
        assert_eq!(snapshot.latency_ms, Some(5));
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_actor() {
        let snapshot = PlatformSnapshot::new("ghost").with_member(MemberRecord::new("u1", "alice"));
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_validate_rejects_unknown_grouping() {
        let snapshot = PlatformSnapshot::new("bot")
            .with_member(MemberRecord::new("bot", "marshal").with_groupings(["missing"]));
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = PlatformSnapshot::load(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, MarshalError::Io { .. }));
    }
}
