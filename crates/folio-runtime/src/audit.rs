use chrono::{DateTime, Utc};
use folio_planner::PlanAction;
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyEvent {
    pub run_id: Uuid,
    pub step: String,
    pub action: PlanAction,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// Receives one event per executed plan step.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: ApplyEvent);
}

/// Emits each event as a structured `tracing` event.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: ApplyEvent) {
        match event.outcome {
            StepOutcome::Failed => tracing::error!(
                run_id = %event.run_id,
                step = %event.step,
                action = %event.action,
                error = event.error.as_deref().unwrap_or(""),
                "apply step failed"
            ),
            outcome => tracing::info!(
                run_id = %event.run_id,
                step = %event.step,
                action = %event.action,
                outcome = ?outcome,
                "apply step finished"
            ),
        }
    }
}

/// Keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<ApplyEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ApplyEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: ApplyEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
