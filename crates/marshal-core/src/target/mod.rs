//! Remote entity snapshots
//!
//! A [`Target`] is an immutable snapshot of one remote entity taken when a
//! phase resolves its target set. Later changes on the platform are not
//! reflected back into it.

mod filter;

pub use filter::{Exclusion, FilterPreset, TargetFilter, TargetPredicate};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of remote entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A membership (user or bot account)
    Member,
    /// A privilege grouping (role)
    Grouping,
    /// A channel
    Channel,
}

impl EntityKind {
    /// Whether entities of this kind sit in the privilege ordering
    pub fn is_ranked(self) -> bool {
        !matches!(self, EntityKind::Channel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Member => "member",
            EntityKind::Grouping => "grouping",
            EntityKind::Channel => "channel",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence status of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Idle,
    DoNotDisturb,
    #[default]
    Offline,
}

impl Presence {
    /// Online, idle and do-not-disturb all count as online
    pub fn is_online(self) -> bool {
        !matches!(self, Presence::Offline)
    }
}

/// Kind of channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Text,
    Voice,
    Category,
}

/// Snapshot of one remote entity with the attributes filtering needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// Position in the privilege ordering. For members this is the
    /// position of their highest grouping.
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub presence: Presence,
    /// Administrator rights (members: effective, groupings: granted)
    #[serde(default)]
    pub is_admin: bool,
    /// Never eligible for bulk actions (default grouping, owner, command channel)
    #[serde(default)]
    pub protected: bool,
    /// Non-default groupings held by a member
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_kind: Option<ChannelKind>,
}

impl Target {
    fn base(id: impl Into<EntityId>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            rank: 0,
            is_bot: false,
            presence: Presence::Offline,
            is_admin: false,
            protected: false,
            groupings: Vec::new(),
            channel_kind: None,
        }
    }

    pub fn member(id: impl Into<EntityId>, name: impl Into<String>, rank: u32) -> Self {
        Self {
            rank,
            ..Self::base(id, name, EntityKind::Member)
        }
    }

    pub fn grouping(id: impl Into<EntityId>, name: impl Into<String>, position: u32) -> Self {
        Self {
            rank: position,
            ..Self::base(id, name, EntityKind::Grouping)
        }
    }

    pub fn channel(id: impl Into<EntityId>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            channel_kind: Some(kind),
            ..Self::base(id, name, EntityKind::Channel)
        }
    }

    /// A channel that does not exist yet; only its name is meaningful
    pub fn channel_blueprint(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::channel(format!("pending:{}", name), name, ChannelKind::Text)
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn with_groupings(mut self, groupings: impl IntoIterator<Item = impl Into<EntityId>>) -> Self {
        self.groupings = groupings.into_iter().map(Into::into).collect();
        self
    }

    /// Holds at least one explicit grouping
    pub fn holds_groupings(&self) -> bool {
        !self.groupings.is_empty()
    }

    pub fn is_text_channel(&self) -> bool {
        self.kind == EntityKind::Channel && self.channel_kind == Some(ChannelKind::Text)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.name, self.id)
    }
}
