//! Eligibility filtering over entity snapshots
//!
//! The base rule always applies: the acting identity, the invoking identity,
//! protected entities, and anything ranked at or above the acting identity
//! are excluded. Optional predicates narrow the set further.

use super::{EntityId, Target};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Composable predicate applied on top of the base exclusion rule
pub type TargetPredicate = Arc<dyn Fn(&Target) -> bool + Send + Sync>;

/// Why a target was left out of the eligible set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Actor,
    Invoker,
    Protected,
    /// Ranked at or above the acting identity
    Outranks { rank: u32, actor_rank: u32 },
    /// Rejected by a named predicate
    Predicate(String),
}

/// Preset predicates for member selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    /// Human members currently offline
    Offline,
    /// Human members online, idle or do-not-disturb
    Online,
    /// Bot members
    Bots,
}

impl FilterPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterPreset::Offline => "offline",
            FilterPreset::Online => "online",
            FilterPreset::Bots => "bots",
        }
    }

    pub fn predicate(self) -> TargetPredicate {
        match self {
            FilterPreset::Offline => Arc::new(|t: &Target| !t.is_bot && !t.presence.is_online()),
            FilterPreset::Online => Arc::new(|t: &Target| !t.is_bot && t.presence.is_online()),
            FilterPreset::Bots => Arc::new(|t: &Target| t.is_bot),
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "offline" => Ok(FilterPreset::Offline),
            "online" => Ok(FilterPreset::Online),
            "bots" | "bot" => Ok(FilterPreset::Bots),
            other => Err(format!("unknown filter preset '{}'", other)),
        }
    }
}

/// Selects the eligible targets for a phase from a snapshot
#[derive(Clone)]
pub struct TargetFilter {
    actor: EntityId,
    invoker: EntityId,
    actor_rank: u32,
    predicates: Vec<(String, TargetPredicate)>,
}

impl TargetFilter {
    pub fn new(actor: EntityId, invoker: EntityId, actor_rank: u32) -> Self {
        Self {
            actor,
            invoker,
            actor_rank,
            predicates: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, name: impl Into<String>, predicate: TargetPredicate) -> Self {
        self.predicates.push((name.into(), predicate));
        self
    }

    pub fn with_preset(self, preset: FilterPreset) -> Self {
        self.with_predicate(preset.as_str(), preset.predicate())
    }

    pub fn actor_rank(&self) -> u32 {
        self.actor_rank
    }

    /// Returns the first rule that excludes `target`, or `None` if eligible
    pub fn exclusion(&self, target: &Target) -> Option<Exclusion> {
        if target.id == self.actor {
            return Some(Exclusion::Actor);
        }
        if target.id == self.invoker {
            return Some(Exclusion::Invoker);
        }
        if target.protected {
            return Some(Exclusion::Protected);
        }
        if target.kind.is_ranked() && target.rank >= self.actor_rank {
            return Some(Exclusion::Outranks {
                rank: target.rank,
                actor_rank: self.actor_rank,
            });
        }
        self.predicates
            .iter()
            .find(|(_, predicate)| !predicate(target))
            .map(|(name, _)| Exclusion::Predicate(name.clone()))
    }

    pub fn is_eligible(&self, target: &Target) -> bool {
        self.exclusion(target).is_none()
    }

    /// Eligible targets in snapshot order, each id at most once
    pub fn apply(&self, snapshot: &[Target]) -> Vec<Target> {
        let mut seen = HashSet::new();
        snapshot
            .iter()
            .filter(|t| self.is_eligible(t))
            .filter(|t| seen.insert(t.id.clone()))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for TargetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFilter")
            .field("actor", &self.actor)
            .field("invoker", &self.invoker)
            .field("actor_rank", &self.actor_rank)
            .field(
                "predicates",
                &self.predicates.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{ChannelKind, Presence};

    fn filter(actor_rank: u32) -> TargetFilter {
        TargetFilter::new(EntityId::new("actor"), EntityId::new("invoker"), actor_rank)
    }

    fn members() -> Vec<Target> {
        vec![
            Target::member("actor", "marshal-bot", 10).bot(),
            Target::member("invoker", "owner-delegate", 12),
            Target::member("u1", "alice", 3).with_presence(Presence::Online),
            Target::member("u2", "bob", 0),
            Target::member("u3", "carol", 10),
            Target::member("u4", "dave", 15).admin(),
            Target::member("b1", "music-bot", 1).bot().with_presence(Presence::Online),
        ]
    }

    #[test]
    fn test_excludes_actor_and_invoker_unconditionally() {
        let eligible = filter(u32::MAX).apply(&members());
        assert!(eligible.iter().all(|t| t.id.as_str() != "actor"));
        assert!(eligible.iter().all(|t| t.id.as_str() != "invoker"));
    }

    #[test]
    fn test_excludes_equal_and_higher_ranks() {
        let eligible = filter(10).apply(&members());
        let ids: Vec<_> = eligible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "b1"]);
        assert_eq!(
            filter(10).exclusion(&members()[4]),
            Some(Exclusion::Outranks {
                rank: 10,
                actor_rank: 10
            })
        );
    }

    #[test]
    fn test_rank_rule_holds_for_every_actor_rank() {
        let snapshot = members();
        for actor_rank in 0..20 {
            for t in filter(actor_rank).apply(&snapshot) {
                assert!(t.rank < actor_rank, "{} leaked at actor rank {}", t, actor_rank);
            }
        }
    }

    #[test]
    fn test_protected_entities_are_excluded() {
        let snapshot = vec![
            Target::grouping("everyone", "everyone", 0).protected(),
            Target::grouping("g1", "helpers", 2),
        ];
        let eligible = filter(5).apply(&snapshot);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id.as_str(), "g1");
    }

    #[test]
    fn test_channels_are_not_ranked() {
        let snapshot = vec![
            Target::channel("c1", "general", ChannelKind::Text),
            Target::channel("c2", "lobby", ChannelKind::Voice),
        ];
        assert_eq!(filter(0).apply(&snapshot).len(), 2);
    }

    #[test]
    fn test_presets_compose_with_base_rule() {
        let offline = filter(10).with_preset(FilterPreset::Offline).apply(&members());
        assert_eq!(offline.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["u2"]);

        let online = filter(10).with_preset(FilterPreset::Online).apply(&members());
        assert_eq!(online.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["u1"]);

        let bots = filter(10).with_preset(FilterPreset::Bots).apply(&members());
        assert_eq!(bots.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec!["b1"]);
    }

    #[test]
    fn test_predicate_exclusion_is_named() {
        let f = filter(10).with_preset(FilterPreset::Bots);
        assert_eq!(
            f.exclusion(&members()[2]),
            Some(Exclusion::Predicate("bots".to_string()))
        );
    }

    #[test]
    fn test_duplicate_ids_are_kept_once() {
        let snapshot = vec![
            Target::member("u1", "alice", 1),
            Target::member("u1", "alice", 1),
            Target::member("u2", "bob", 1),
        ];
        assert_eq!(filter(5).apply(&snapshot).len(), 2);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Offline".parse::<FilterPreset>(), Ok(FilterPreset::Offline));
        assert_eq!("bot".parse::<FilterPreset>(), Ok(FilterPreset::Bots));
        assert!("everyone".parse::<FilterPreset>().is_err());
    }
}
