//! Graph lifecycle.
//!
//! ```text
//! Unvalidated -> Validated -> Ordered -> Applying -> Applied
//!                                                \-> Failed(at)
//! ```
//!
//! `Applied` and `Failed` are terminal.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GraphState {
    Unvalidated,
    Validated,
    Ordered,
    Applying,
    Applied,
    /// Halted at the named step.
    Failed { at: String },
}

impl GraphState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GraphState::Applied | GraphState::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            GraphState::Unvalidated => "unvalidated",
            GraphState::Validated => "validated",
            GraphState::Ordered => "ordered",
            GraphState::Applying => "applying",
            GraphState::Applied => "applied",
            GraphState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for GraphState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphState::Failed { at } => write!(f, "failed at '{}'", at),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal lifecycle transition from {from} to {to}")]
pub struct LifecycleError {
    pub from: GraphState,
    pub to: GraphState,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: GraphState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: GraphState::Unvalidated,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    /// Move to `next` if the transition is legal.
    pub fn advance(&mut self, next: GraphState) -> Result<(), LifecycleError> {
        let legal = matches!(
            (&self.state, &next),
            (GraphState::Unvalidated, GraphState::Validated)
                | (GraphState::Validated, GraphState::Ordered)
                | (GraphState::Ordered, GraphState::Applying)
                | (GraphState::Applying, GraphState::Applied)
                | (GraphState::Applying, GraphState::Failed { .. })
        );
        if !legal {
            return Err(LifecycleError {
                from: self.state.clone(),
                to: next,
            });
        }

        tracing::debug!(from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
        Ok(())
    }
}
