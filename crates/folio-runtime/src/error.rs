use crate::lifecycle::LifecycleError;
use folio_core::ResolveError;
use folio_planner::{GraphError, PlanAction, PlanError};
use thiserror::Error;

/// A plan step that could not be applied. The run halts at this step.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{action} of '{step}' failed: {cause:#}")]
    ProviderApply {
        step: String,
        action: PlanAction,
        cause: anyhow::Error,
    },

    #[error("'{step}' could not be resolved: {source}")]
    Resolve {
        step: String,
        #[source]
        source: ResolveError,
    },
}

impl ApplyError {
    pub fn step(&self) -> &str {
        match self {
            ApplyError::ProviderApply { step, .. } | ApplyError::Resolve { step, .. } => step,
        }
    }
}

/// Errors that stop `plan_and_apply` before any provider call.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
