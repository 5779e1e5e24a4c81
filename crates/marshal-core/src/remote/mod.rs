//! Remote platform client seam
//!
//! The orchestrator never talks to a platform directly. Everything it needs
//! goes through [`PlatformClient`]; connection handling, authentication and
//! request encoding live in whatever implements it. Implementations must be
//! safe for concurrent use, because every action in a chunk shares one
//! client handle.

mod memory;
mod snapshot;

pub use memory::{InMemoryPlatform, SentMessage};
pub use snapshot::{
    BanRecord, ChannelRecord, FailureRule, GroupingRecord, MemberRecord, Operation,
    PlatformSnapshot,
};

use crate::error::UnifiedError;
use crate::target::{EntityId, EntityKind, Target};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for a single platform call
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Typed failure of a single platform call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The platform refused the mutation (insufficient rights or hierarchy)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Remote error: {0}")]
    Other(String),
}

impl UnifiedError for RemoteError {
    fn error_code(&self) -> &str {
        match self {
            RemoteError::Forbidden(_) => "REMOTE_FORBIDDEN",
            RemoteError::NotFound(_) => "REMOTE_NOT_FOUND",
            RemoteError::RateLimited { .. } => "REMOTE_RATE_LIMITED",
            RemoteError::Http { .. } => "REMOTE_HTTP",
            RemoteError::Other(_) => "REMOTE_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            RemoteError::Forbidden(msg) => msg,
            RemoteError::NotFound(msg) => msg,
            RemoteError::RateLimited { .. } => "rate limited",
            RemoteError::Http { message, .. } => message,
            RemoteError::Other(msg) => msg,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            RemoteError::RateLimited { .. } => true,
            RemoteError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Handle to a channel returned by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub id: EntityId,
    pub name: String,
}

/// Parameters for a new privilege grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSpec {
    pub name: String,
    /// Grant every permission the platform knows about
    pub all_permissions: bool,
    /// Display members of this grouping separately
    pub hoist: bool,
}

impl GroupingSpec {
    /// A grouping carrying every permission
    pub fn maximal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            all_permissions: true,
            hoist: true,
        }
    }
}

/// Asynchronous client for the remote collaborative platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Snapshot every entity of `kind`
    async fn list_entities(&self, kind: EntityKind) -> RemoteResult<Vec<Target>>;

    /// Remove a member from the platform space
    async fn remove_membership(&self, member: &EntityId, reason: &str) -> RemoteResult<()>;

    /// Take one grouping away from a member
    async fn remove_grouping(
        &self,
        member: &EntityId,
        grouping: &EntityId,
        reason: &str,
    ) -> RemoteResult<()>;

    /// Delete a grouping altogether
    async fn delete_grouping(&self, grouping: &EntityId, reason: &str) -> RemoteResult<()>;

    /// Ban a member, deleting `retention_days` worth of their messages
    async fn ban_membership(
        &self,
        member: &EntityId,
        reason: &str,
        retention_days: u8,
    ) -> RemoteResult<()>;

    async fn create_channel(&self, name: &str, reason: &str) -> RemoteResult<ChannelHandle>;

    async fn delete_channel(&self, channel: &EntityId, reason: &str) -> RemoteResult<()>;

    async fn send_message(&self, channel: &EntityId, content: &str) -> RemoteResult<()>;

    /// Create a grouping at the bottom of the ordering and return its id
    async fn create_grouping(&self, spec: &GroupingSpec, reason: &str) -> RemoteResult<EntityId>;

    async fn assign_grouping(
        &self,
        member: &EntityId,
        grouping: &EntityId,
        reason: &str,
    ) -> RemoteResult<()>;

    async fn grant_all_permissions(&self, grouping: &EntityId, reason: &str) -> RemoteResult<()>;

    /// Move a grouping above every other one and return its new position
    async fn move_grouping_to_top(&self, grouping: &EntityId, reason: &str) -> RemoteResult<u32>;
}

/// Shared handle to a platform client
pub type SharedPlatformClient = Arc<dyn PlatformClient>;
