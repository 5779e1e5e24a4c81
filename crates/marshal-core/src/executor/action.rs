//! The per-target unit of work

use crate::remote::RemoteError;
use crate::target::Target;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of one action against one target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Some, but not all, of the calls an action makes failed
    #[error("{failed} of {attempted} calls failed: {first_error}")]
    Partial {
        attempted: usize,
        failed: usize,
        first_error: String,
    },

    #[error("{0}")]
    Failed(String),
}

/// A stateless operation applied to a single target
///
/// Side effects happen only against the remote platform. Implementations
/// report failure through the returned `Result`; panics are also caught by
/// the executor and recorded as failures.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, target: &Target) -> Result<(), ActionError>;
}
