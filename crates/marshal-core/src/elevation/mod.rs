//! Best-effort privilege elevation
//!
//! Before a privileged bulk phase the acting identity tries to put itself at
//! the top of the privilege ordering, so the hierarchy rule shields as few
//! targets as possible. Strategies are tried in a fixed order and the first
//! success wins.

use crate::events::{EventBus, OrchestratorEvent};
use crate::remote::{GroupingSpec, PlatformClient, RemoteError};
use crate::target::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default name of the grouping created by [`ElevationStrategy::CreateDedicatedGrouping`]
pub const DEFAULT_GROUPING_NAME: &str = "marshal";

/// One way of raising the acting identity's rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationStrategy {
    /// Create a maximal-privilege grouping, attach it to the actor and move
    /// it to the top
    CreateDedicatedGrouping,
    /// Grant every permission to the actor's highest grouping and move it to
    /// the top
    BroadenExistingGrouping,
}

impl ElevationStrategy {
    pub const DEFAULT_ORDER: [ElevationStrategy; 2] = [
        ElevationStrategy::CreateDedicatedGrouping,
        ElevationStrategy::BroadenExistingGrouping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElevationStrategy::CreateDedicatedGrouping => "create_dedicated_grouping",
            ElevationStrategy::BroadenExistingGrouping => "broaden_existing_grouping",
        }
    }
}

impl fmt::Display for ElevationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy that was tried, and why it failed if it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: ElevationStrategy,
    pub error: Option<String>,
}

/// Successful elevation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElevationReport {
    pub strategy: ElevationStrategy,
    /// Grouping now carrying the actor's elevated rank
    pub grouping: EntityId,
    pub position: u32,
    /// Every strategy tried, in order, ending with the successful one
    pub attempts: Vec<StrategyAttempt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElevationError {
    #[error("no elevation strategies configured")]
    NoStrategies,

    #[error("all elevation strategies failed: {}", summarize(.attempts))]
    Exhausted { attempts: Vec<StrategyAttempt> },
}

fn summarize(attempts: &[StrategyAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.strategy, a.error.as_deref().unwrap_or("ok")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of one step inside a strategy
fn step(step: &str, error: RemoteError) -> String {
    format!("{}: {}", step, error)
}

/// Tries elevation strategies in order until one succeeds
#[derive(Debug, Clone)]
pub struct ElevationResolver {
    strategies: Vec<ElevationStrategy>,
    grouping_name: String,
    events: Option<EventBus>,
}

impl Default for ElevationResolver {
    fn default() -> Self {
        Self::new(ElevationStrategy::DEFAULT_ORDER.to_vec())
    }
}

impl ElevationResolver {
    pub fn new(strategies: Vec<ElevationStrategy>) -> Self {
        Self {
            strategies,
            grouping_name: DEFAULT_GROUPING_NAME.to_string(),
            events: None,
        }
    }

    pub fn with_grouping_name(mut self, name: impl Into<String>) -> Self {
        self.grouping_name = name.into();
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn strategies(&self) -> &[ElevationStrategy] {
        &self.strategies
    }

    /// Run strategies in order, stopping at the first success
    pub async fn resolve(
        &self,
        client: &dyn PlatformClient,
        actor: &EntityId,
        reason: &str,
    ) -> Result<ElevationReport, ElevationError> {
        if self.strategies.is_empty() {
            return Err(ElevationError::NoStrategies);
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for &strategy in &self.strategies {
            debug!(%strategy, %actor, "trying elevation strategy");
            let result = match strategy {
                ElevationStrategy::CreateDedicatedGrouping => {
                    self.create_dedicated(client, actor, reason).await
                }
                ElevationStrategy::BroadenExistingGrouping => {
                    self.broaden_existing(client, actor, reason).await
                }
            };

            let error = result.as_ref().err().cloned();
            self.publish(OrchestratorEvent::ElevationAttempted {
                strategy,
                succeeded: error.is_none(),
                error: error.clone(),
            });
            attempts.push(StrategyAttempt { strategy, error });

            match result {
                Ok((grouping, position)) => {
                    info!(%strategy, %grouping, position, "elevation succeeded");
                    return Ok(ElevationReport {
                        strategy,
                        grouping,
                        position,
                        attempts,
                    });
                }
                Err(error) => warn!(%strategy, %error, "elevation strategy failed"),
            }
        }

        Err(ElevationError::Exhausted { attempts })
    }

    async fn create_dedicated(
        &self,
        client: &dyn PlatformClient,
        actor: &EntityId,
        reason: &str,
    ) -> Result<(EntityId, u32), String> {
        let grouping = client
            .create_grouping(&GroupingSpec::maximal(self.grouping_name.clone()), reason)
            .await
            .map_err(|e| step("create grouping", e))?;
        // A grouping created here is left in place if a later step fails.
        client
            .assign_grouping(actor, &grouping, reason)
            .await
            .map_err(|e| step("assign grouping", e))?;
        let position = client
            .move_grouping_to_top(&grouping, reason)
            .await
            .map_err(|e| step("move grouping", e))?;
        Ok((grouping, position))
    }

    async fn broaden_existing(
        &self,
        client: &dyn PlatformClient,
        actor: &EntityId,
        reason: &str,
    ) -> Result<(EntityId, u32), String> {
        let members = client
            .list_entities(EntityKind::Member)
            .await
            .map_err(|e| step("list members", e))?;
        let held = members
            .into_iter()
            .find(|m| &m.id == actor)
            .map(|m| m.groupings)
            .ok_or_else(|| format!("acting identity '{}' is not a member", actor))?;

        let groupings = client
            .list_entities(EntityKind::Grouping)
            .await
            .map_err(|e| step("list groupings", e))?;
        let highest = groupings
            .into_iter()
            .filter(|g| held.contains(&g.id) && !g.protected)
            .max_by_key(|g| g.rank)
            .ok_or_else(|| "acting identity holds no grouping that can be broadened".to_string())?;

        client
            .grant_all_permissions(&highest.id, reason)
            .await
            .map_err(|e| step("grant permissions", e))?;
        let position = client
            .move_grouping_to_top(&highest.id, reason)
            .await
            .map_err(|e| step("move grouping", e))?;
        Ok((highest.id, position))
    }

    fn publish(&self, event: OrchestratorEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}
