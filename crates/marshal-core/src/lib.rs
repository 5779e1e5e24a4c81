//! Marshal Core Library
//!
//! Orchestrates large batches of administrative mutations against a remote
//! collaborative-platform API: targets are filtered, executed in bounded
//! concurrent chunks, and grouped into ordered multi-phase workflows with
//! best-effort privilege elevation and incremental status events.

pub mod config;
pub mod context;
pub mod elevation;
pub mod error;
pub mod events;
pub mod executor;
pub mod progress;
pub mod remote;
pub mod sequencer;
pub mod target;
pub mod workflows;

// Re-export commonly used types
pub use config::{LoggingConfig, MarshalConfig, load_config};
pub use context::OperationContext;
pub use elevation::{ElevationError, ElevationReport, ElevationResolver, ElevationStrategy};
pub use error::{MarshalError, MarshalResult, UnifiedError};
pub use events::{EventBus, OrchestratorEvent};
pub use executor::{
    Action, ActionError, ChunkedExecutor, ExecutionReport, ExecutorConfig, Outcome, Tally,
};
pub use progress::{ProgressReporter, ProgressSnapshot};
pub use remote::{InMemoryPlatform, PlatformClient, PlatformSnapshot, RemoteError};
pub use sequencer::{
    ElevationPolicy, Phase, PhaseSequence, PhaseSequencer, SequenceAbort, SequenceReport,
    TargetSource,
};
pub use target::{EntityId, EntityKind, FilterPreset, Target, TargetFilter};
pub use workflows::Workflow;
