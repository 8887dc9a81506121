use crate::audit::{AuditSink, TracingAuditSink};
use crate::error::{ApplyError, OrchestratorError};
use crate::executor::{AppliedStep, Executor};
use crate::lifecycle::{GraphState, Lifecycle};
use crate::provider::CloudProvider;
use folio_core::resolve::resolve_value;
use folio_core::{MaterializedState, ResourceDescriptor, StackOutput};
use folio_planner::{GraphError, Plan, ResourceGraph};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything a run produced. A provider failure is reported in `failure`
/// rather than as an `Err`, so the state materialized before it is never lost.
#[derive(Debug)]
pub struct ApplyReport {
    pub run_id: Uuid,
    /// Output values that could be read from the final state.
    pub outputs: BTreeMap<String, String>,
    pub final_state: MaterializedState,
    pub steps: Vec<AppliedStep>,
    pub failure: Option<ApplyError>,
    pub lifecycle: GraphState,
}

impl ApplyReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct Orchestrator<P: CloudProvider + ?Sized, S: AuditSink> {
    provider: std::sync::Arc<P>,
    audit: S,
}

impl<P: CloudProvider + ?Sized, S: AuditSink> Orchestrator<P, S> {
    pub fn new(provider: std::sync::Arc<P>, audit: S) -> Self {
        Self { provider, audit }
    }

    pub fn audit(&self) -> &S {
        &self.audit
    }

    /// Validate, order, plan and apply `descriptors` against `state`.
    ///
    /// Graph and planning errors are returned before any provider call.
    pub async fn run(
        &self,
        descriptors: Vec<ResourceDescriptor>,
        outputs: &[StackOutput],
        state: MaterializedState,
    ) -> Result<ApplyReport, OrchestratorError> {
        let mut lifecycle = Lifecycle::new();

        let graph = ResourceGraph::build(descriptors)?;
        for output in outputs {
            if !graph.contains(&output.value.source.owner) {
                return Err(GraphError::UnresolvedReference {
                    from: output.name.clone(),
                    to: output.value.source.owner.clone(),
                }
                .into());
            }
        }
        lifecycle.advance(GraphState::Validated)?;

        let plan = Plan::build(&graph, &state)?;
        lifecycle.advance(GraphState::Ordered)?;
        let summary = plan.summary();
        tracing::info!(
            create = summary.create,
            update = summary.update,
            replace = summary.replace,
            delete = summary.delete,
            unchanged = summary.no_op,
            "plan ready"
        );

        lifecycle.advance(GraphState::Applying)?;
        let executor = Executor::new(self.provider.as_ref(), &self.audit);
        let mut state = state;
        let execution = executor.apply(&plan, &mut state).await;

        match &execution.failure {
            Some(err) => {
                tracing::error!(step = %err.step(), error = %err, "apply halted");
                lifecycle.advance(GraphState::Failed {
                    at: err.step().to_string(),
                })?;
            }
            None => lifecycle.advance(GraphState::Applied)?,
        }

        let mut values = BTreeMap::new();
        for output in outputs {
            match resolve_value(&output.value, &state) {
                Ok(value) => {
                    values.insert(output.name.clone(), value);
                }
                Err(err) => {
                    tracing::debug!(output = %output.name, error = %err, "output not available")
                }
            }
        }

        Ok(ApplyReport {
            run_id: executor.run_id(),
            outputs: values,
            final_state: state,
            steps: execution.steps,
            failure: execution.failure,
            lifecycle: lifecycle.state().clone(),
        })
    }
}

/// Plan and apply with audit events emitted through `tracing`.
pub async fn plan_and_apply<P: CloudProvider + ?Sized>(
    descriptors: Vec<ResourceDescriptor>,
    outputs: &[StackOutput],
    provider: std::sync::Arc<P>,
    state: MaterializedState,
) -> Result<ApplyReport, OrchestratorError> {
    Orchestrator::new(provider, TracingAuditSink)
        .run(descriptors, outputs, state)
        .await
}
