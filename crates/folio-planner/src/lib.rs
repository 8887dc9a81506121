//! Resource graph validation, dependency ordering and plan construction.
//!
//! Everything in this crate is pure: the same descriptors and state always
//! produce the same graph, order and plan, and nothing here talks to a
//! provider.

pub mod error;
pub mod graph;
pub mod plan;

pub use error::{GraphError, PlanError};
pub use graph::ResourceGraph;
pub use plan::{compare, Change, Plan, PlanAction, PlanStep, PlanSummary};
