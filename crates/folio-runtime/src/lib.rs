//! Folio Runtime
//!
//! Applies plans through a [`CloudProvider`], one step at a time, and records
//! the result in materialized state.

pub mod audit;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod orchestrator;
pub mod provider;
pub mod simulated;

pub use audit::{ApplyEvent, AuditSink, MemoryAuditSink, StepOutcome, TracingAuditSink};
pub use error::{ApplyError, OrchestratorError};
pub use executor::{AppliedStep, Execution, Executor};
pub use lifecycle::{GraphState, Lifecycle, LifecycleError};
pub use orchestrator::{ApplyReport, Orchestrator, plan_and_apply};
pub use provider::{Attributes, CloudProvider};
pub use simulated::{CallCounts, InMemoryProvider};
