//! Command implementations

pub mod config;
pub mod inspect;
pub mod run;

use crate::args::TargetArgs;
use anyhow::Context;
use marshal_core::remote::{InMemoryPlatform, PlatformSnapshot};
use marshal_core::target::EntityId;
use std::sync::Arc;

/// Load the snapshot and build the simulated platform it describes
///
/// Returns the platform together with the acting identity.
pub(crate) fn load_platform(args: &TargetArgs) -> anyhow::Result<(Arc<InMemoryPlatform>, EntityId)> {
    let mut snapshot = PlatformSnapshot::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    if let Some(actor) = &args.actor {
        snapshot.actor = EntityId::new(actor.clone());
    }
    snapshot.validate()?;

    let actor = snapshot.actor.clone();
    Ok((Arc::new(InMemoryPlatform::from_snapshot(snapshot)), actor))
}
