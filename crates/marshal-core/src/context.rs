//! Per-sequence operation context

use crate::remote::{RemoteError, RemoteResult, SharedPlatformClient};
use crate::target::{EntityId, EntityKind, Target, TargetFilter};

/// Who is acting, who asked, and the client to act through
///
/// Built once per invoked sequence and dropped with it.
#[derive(Clone)]
pub struct OperationContext {
    pub actor: EntityId,
    pub invoker: EntityId,
    pub client: SharedPlatformClient,
    /// Audit reason attached to every mutation
    pub reason: String,
}

impl OperationContext {
    pub fn new(
        actor: impl Into<EntityId>,
        invoker: impl Into<EntityId>,
        client: SharedPlatformClient,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            invoker: invoker.into(),
            client,
            reason: reason.into(),
        }
    }

    /// Fresh snapshot of every entity of `kind`
    pub async fn snapshot(&self, kind: EntityKind) -> RemoteResult<Vec<Target>> {
        self.client.list_entities(kind).await
    }

    async fn member(&self, id: &EntityId) -> RemoteResult<Target> {
        self.snapshot(EntityKind::Member)
            .await?
            .into_iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("member '{}'", id)))
    }

    /// Current rank of the acting identity
    pub async fn actor_rank(&self) -> RemoteResult<u32> {
        Ok(self.member(&self.actor).await?.rank)
    }

    /// Filter carrying the base exclusion rule at the actor's current rank
    pub async fn base_filter(&self) -> RemoteResult<TargetFilter> {
        let rank = self.actor_rank().await?;
        Ok(TargetFilter::new(self.actor.clone(), self.invoker.clone(), rank))
    }

    pub async fn invoker_is_admin(&self) -> RemoteResult<bool> {
        Ok(self.member(&self.invoker).await?.is_admin)
    }
}

impl std::fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("actor", &self.actor)
            .field("invoker", &self.invoker)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}
