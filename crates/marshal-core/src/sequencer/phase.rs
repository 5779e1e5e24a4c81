//! Phases and the sequences that order them

use super::report::SequenceReport;
use crate::context::OperationContext;
use crate::executor::{Action, ExecutorConfig};
use crate::remote::RemoteResult;
use crate::target::{EntityKind, FilterPreset, Target, TargetPredicate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Where a phase gets its targets from
#[derive(Clone)]
pub enum TargetSource {
    /// Exactly these targets, deduplicated by id
    Fixed(Vec<Target>),
    /// A fresh snapshot of `kind`, narrowed by the base exclusion rule at the
    /// actor's rank when the phase starts, then by every predicate
    Eligible {
        kind: EntityKind,
        predicates: Vec<(String, TargetPredicate)>,
    },
}

impl TargetSource {
    pub fn fixed(targets: Vec<Target>) -> Self {
        Self::Fixed(targets)
    }

    pub fn eligible(kind: EntityKind) -> Self {
        Self::Eligible {
            kind,
            predicates: Vec::new(),
        }
    }

    /// Add a named predicate; has no effect on a fixed source
    pub fn with_predicate(mut self, name: impl Into<String>, predicate: TargetPredicate) -> Self {
        if let Self::Eligible { predicates, .. } = &mut self {
            predicates.push((name.into(), predicate));
        }
        self
    }

    pub fn with_preset(self, preset: FilterPreset) -> Self {
        self.with_predicate(preset.as_str(), preset.predicate())
    }

    /// Compute the target set against the platform's current state
    pub async fn resolve(&self, ctx: &OperationContext) -> RemoteResult<Vec<Target>> {
        match self {
            Self::Fixed(targets) => {
                let mut seen = HashSet::new();
                Ok(targets
                    .iter()
                    .filter(|t| seen.insert(t.id.clone()))
                    .cloned()
                    .collect())
            }
            Self::Eligible { kind, predicates } => {
                let filter = predicates
                    .iter()
                    .fold(ctx.base_filter().await?, |filter, (name, predicate)| {
                        filter.with_predicate(name.clone(), predicate.clone())
                    });
                let snapshot = ctx.snapshot(*kind).await?;
                Ok(filter.apply(&snapshot))
            }
        }
    }
}

impl fmt::Debug for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(targets) => f.debug_tuple("Fixed").field(&targets.len()).finish(),
            Self::Eligible { kind, predicates } => f
                .debug_struct("Eligible")
                .field("kind", kind)
                .field(
                    "predicates",
                    &predicates.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
                )
                .finish(),
        }
    }
}

/// One named step of a sequence
#[derive(Clone)]
pub struct Phase {
    pub name: String,
    pub action: Arc<dyn Action>,
    pub source: TargetSource,
    pub executor: ExecutorConfig,
    /// Stop the sequence if this phase has targets and none succeed
    pub abort_on_total_failure: bool,
}

impl Phase {
    pub fn new(name: impl Into<String>, action: Arc<dyn Action>, source: TargetSource) -> Self {
        Self {
            name: name.into(),
            action,
            source,
            executor: ExecutorConfig::default(),
            abort_on_total_failure: false,
        }
    }

    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    pub fn abort_on_total_failure(mut self) -> Self {
        self.abort_on_total_failure = true;
        self
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("action", &self.action.name())
            .field("source", &self.source)
            .field("executor", &self.executor)
            .field("abort_on_total_failure", &self.abort_on_total_failure)
            .finish()
    }
}

/// What to do when elevation fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationPolicy {
    /// Do not try to elevate
    #[default]
    Skip,
    /// Try to elevate and continue regardless
    BestEffort,
    /// Try to elevate and abort if it fails
    Required,
}

/// An ordered list of phases for one invoked workflow
#[derive(Debug, Clone)]
pub struct PhaseSequence {
    pub name: String,
    pub phases: Vec<Phase>,
    pub elevation: ElevationPolicy,
    /// Abort before any mutation unless the invoker holds administrator rights
    pub require_invoker_admin: bool,
}

impl PhaseSequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
            elevation: ElevationPolicy::Skip,
            require_invoker_admin: false,
        }
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn with_elevation(mut self, policy: ElevationPolicy) -> Self {
        self.elevation = policy;
        self
    }

    pub fn require_invoker_admin(mut self) -> Self {
        self.require_invoker_admin = true;
        self
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    /// Re-run each executed phase over exactly the targets it failed on
    ///
    /// Executed phases are matched to this sequence by position, so repeated
    /// phase names keep their own actions. Returns `None` when nothing failed.
    /// Elevation is not repeated.
    pub fn retry_failed(&self, report: &SequenceReport) -> Option<PhaseSequence> {
        let phases: Vec<Phase> = self
            .phases
            .iter()
            .zip(&report.phases)
            .filter(|(phase, executed)| phase.name == executed.name)
            .filter_map(|(phase, executed)| {
                let failed = executed.failed_targets();
                if failed.is_empty() {
                    return None;
                }
                Some(Phase {
                    source: TargetSource::fixed(failed),
                    ..phase.clone()
                })
            })
            .collect();

        if phases.is_empty() {
            return None;
        }
        Some(PhaseSequence {
            name: format!("{}-retry", self.name),
            phases,
            elevation: ElevationPolicy::Skip,
            require_invoker_admin: self.require_invoker_admin,
        })
    }
}
