//! Plan execution.
//!
//! Steps run strictly one at a time in plan order. Before each step the
//! descriptor's derived properties are resolved against the state built so
//! far, and the planned action is re-evaluated: a step planned as an update
//! because its inputs were still deferred may turn out to be a no-op or a
//! replace once they are known.

use crate::audit::{ApplyEvent, AuditSink, StepOutcome};
use crate::error::ApplyError;
use crate::provider::CloudProvider;
use chrono::Utc;
use folio_core::{MaterializedState, ResourceRecord};
use folio_planner::{Plan, PlanAction, PlanStep, compare};
use serde::Serialize;
use uuid::Uuid;

/// What happened to one step.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedStep {
    pub name: String,
    /// Action chosen at plan time.
    pub planned: PlanAction,
    /// Action actually taken after resolving derived values.
    pub applied: PlanAction,
}

/// Result of running a plan. `failure` is set when the run halted early;
/// `steps` then lists only the steps completed before it.
#[derive(Debug)]
pub struct Execution {
    pub steps: Vec<AppliedStep>,
    pub failure: Option<ApplyError>,
}

pub struct Executor<'a, P: CloudProvider + ?Sized, S: AuditSink + ?Sized> {
    provider: &'a P,
    audit: &'a S,
    run_id: Uuid,
}

impl<'a, P: CloudProvider + ?Sized, S: AuditSink + ?Sized> Executor<'a, P, S> {
    pub fn new(provider: &'a P, audit: &'a S) -> Self {
        Self {
            provider,
            audit,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Apply `plan`, recording every materialized resource in `state`.
    ///
    /// Halts at the first failing step. Resources applied before it stay in
    /// `state`; nothing is rolled back or retried.
    pub async fn apply(&self, plan: &Plan, state: &mut MaterializedState) -> Execution {
        let mut steps = Vec::with_capacity(plan.len());

        for step in plan.steps() {
            match self.apply_step(step, state).await {
                Ok(applied) => {
                    self.audit.record(self.event(
                        step,
                        applied,
                        if applied.is_change() {
                            StepOutcome::Applied
                        } else {
                            StepOutcome::Unchanged
                        },
                        None,
                    ));
                    steps.push(AppliedStep {
                        name: step.name().to_string(),
                        planned: step.action,
                        applied,
                    });
                }
                Err(err) => {
                    let attempted = match &err {
                        ApplyError::ProviderApply { action, .. } => *action,
                        ApplyError::Resolve { .. } => step.action,
                    };
                    self.audit.record(self.event(
                        step,
                        attempted,
                        StepOutcome::Failed,
                        Some(err.to_string()),
                    ));
                    return Execution {
                        steps,
                        failure: Some(err),
                    };
                }
            }
        }

        Execution {
            steps,
            failure: None,
        }
    }

    async fn apply_step(
        &self,
        step: &PlanStep,
        state: &mut MaterializedState,
    ) -> Result<PlanAction, ApplyError> {
        let name = step.name();

        if step.action == PlanAction::Delete {
            if let Some(record) = state.get(name).cloned() {
                if is_retained(&record) {
                    tracing::info!(resource = %name, "retained on delete; dropped from state only");
                } else {
                    self.call(name, PlanAction::Delete, self.provider.delete(&record))
                        .await?;
                }
                state.remove(name);
            }
            return Ok(PlanAction::Delete);
        }

        let desired = step
            .descriptor
            .resolved(state)
            .map_err(|source| ApplyError::Resolve {
                step: name.to_string(),
                source,
            })?;

        let existing = state.get(name).cloned();
        let action = match &existing {
            None => PlanAction::Create,
            Some(record) => compare(record, &desired).action,
        };
        if action != step.action {
            tracing::debug!(
                resource = %name,
                planned = %step.action,
                applied = %action,
                "action re-evaluated after resolving inputs"
            );
        }

        match (action, existing) {
            (PlanAction::NoOp, _) => {}
            (PlanAction::Update, Some(record)) => {
                let attrs = self
                    .call(name, action, self.provider.update(&desired, &record.attributes))
                    .await?;
                state.insert(ResourceRecord::materialized(&desired, attrs));
            }
            (PlanAction::Replace, Some(record)) => {
                self.call(name, action, self.provider.delete(&record)).await?;
                state.remove(name);
                let attrs = self
                    .call(name, action, self.provider.create(&desired))
                    .await?;
                state.insert(ResourceRecord::materialized(&desired, attrs));
            }
            _ => {
                let attrs = self
                    .call(name, PlanAction::Create, self.provider.create(&desired))
                    .await?;
                state.insert(ResourceRecord::materialized(&desired, attrs));
            }
        }

        Ok(action)
    }

    async fn call<T>(
        &self,
        step: &str,
        action: PlanAction,
        fut: impl std::future::Future<Output = anyhow::Result<T>>,
    ) -> Result<T, ApplyError> {
        fut.await.map_err(|cause| ApplyError::ProviderApply {
            step: step.to_string(),
            action,
            cause,
        })
    }

    fn event(
        &self,
        step: &PlanStep,
        action: PlanAction,
        outcome: StepOutcome,
        error: Option<String>,
    ) -> ApplyEvent {
        ApplyEvent {
            run_id: self.run_id,
            step: step.name().to_string(),
            action,
            outcome,
            error,
            at: Utc::now(),
        }
    }
}

/// Resources declared with `removal_policy: retain` outlive the stack.
fn is_retained(record: &ResourceRecord) -> bool {
    record
        .properties
        .get("removal_policy")
        .and_then(|v| v.as_text())
        == Some("retain")
}
