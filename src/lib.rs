//! Marshal
//!
//! Facade over [`marshal_core`]; see that crate for the orchestration model.

pub use marshal_core::*;
