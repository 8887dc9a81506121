//! Error types for graph construction and planning.

use folio_core::ResolveError;
use thiserror::Error;

/// Errors raised while validating or ordering a resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two descriptors share a logical name.
    #[error("duplicate resource identity '{name}'")]
    DuplicateIdentity { name: String },

    /// References form a cycle. The path starts and ends on the same node.
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A descriptor references a logical name absent from the graph.
    #[error("resource '{from}' references unknown resource '{to}'")]
    UnresolvedReference { from: String, to: String },
}

/// Errors raised while building a plan against materialized state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
