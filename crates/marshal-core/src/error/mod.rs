//! Error types for Marshal
//!
//! Crate-wide failures (configuration, remote collaborators, elevation and
//! aborted sequences) are expressed as [`MarshalError`]. Every variant
//! implements [`UnifiedError`], giving callers a stable error code, a message
//! and optional context.
//!
//! Per-target failures never reach this type: the executor records them as
//! data in a phase tally.

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{MarshalError, MarshalResult, UnifiedError};
