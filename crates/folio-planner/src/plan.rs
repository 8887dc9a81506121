//! Plan construction.
//!
//! A [`Plan`] pairs every descriptor of a validated graph with the action the
//! executor must take, given what is already materialized. Descriptors whose
//! derived values depend on a resource that is about to be (re)created cannot
//! be compared yet; they are planned as updates and re-evaluated by the
//! executor once the upstream values exist.

use crate::error::PlanError;
use crate::graph::ResourceGraph;
use folio_core::resolve::resolve_value;
use folio_core::{MaterializedState, PropertyValue, ResourceDescriptor, ResourceRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// What the executor does for one step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
    Delete,
}

impl PlanAction {
    /// Whether this action calls the provider.
    pub fn is_change(&self) -> bool {
        !matches!(self, PlanAction::NoOp)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PlanAction::Create => "+",
            PlanAction::Update => "~",
            PlanAction::Replace => "-/+",
            PlanAction::NoOp => " ",
            PlanAction::Delete => "-",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanAction::Create => "create",
            PlanAction::Update => "update",
            PlanAction::Replace => "replace",
            PlanAction::NoOp => "no-op",
            PlanAction::Delete => "delete",
        };
        f.pad(s)
    }
}

/// The result of comparing a materialized record with a desired descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: PlanAction,
    /// Property keys (plus `routes`/`grants`) that differ.
    pub changed: Vec<String>,
}

/// Compare what was applied with what is desired.
///
/// A deferred (still derived) desired value always counts as changed. A
/// change to any of the kind's immutable properties, or to the kind itself,
/// requires a replace.
pub fn compare(record: &ResourceRecord, desired: &ResourceDescriptor) -> Change {
    if record.kind != desired.kind {
        return Change {
            action: PlanAction::Replace,
            changed: vec!["kind".to_string()],
        };
    }

    let keys: BTreeSet<&String> = record.properties.keys().chain(desired.properties.keys()).collect();
    let mut changed: Vec<String> = keys
        .into_iter()
        .filter(|k| record.properties.get(*k) != desired.properties.get(*k))
        .cloned()
        .collect();

    if record.routes != desired.routes {
        changed.push("routes".to_string());
    }
    if record.grants != desired.grants {
        changed.push("grants".to_string());
    }

    let immutable = desired.kind.immutable_properties();
    let action = if changed.is_empty() {
        PlanAction::NoOp
    } else if changed.iter().any(|k| immutable.contains(&k.as_str())) {
        PlanAction::Replace
    } else {
        PlanAction::Update
    };

    Change { action, changed }
}

/// One ordered step of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub descriptor: ResourceDescriptor,
    pub action: PlanAction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<String>,
}

impl PlanStep {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Counts of each action in a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_op: usize,
}

/// Ordered apply actions derived from a validated graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// Build the plan for `graph` against `state`.
    ///
    /// Steps follow the graph's topological order. Resources present in state
    /// but absent from the graph are deleted last, each after everything that
    /// references it.
    pub fn build(graph: &ResourceGraph, state: &MaterializedState) -> Result<Self, PlanError> {
        let order = graph.order()?;

        // Resources whose generated attributes will be new after this plan.
        let mut regenerating: HashSet<&str> = HashSet::new();
        let mut steps = Vec::with_capacity(order.len());

        for descriptor in order {
            let (action, changed) = match state.get(&descriptor.name) {
                None => (PlanAction::Create, Vec::new()),
                Some(record) => {
                    let desired = resolve_known(descriptor, state, &regenerating)?;
                    let change = compare(record, &desired);
                    (change.action, change.changed)
                }
            };

            if matches!(action, PlanAction::Create | PlanAction::Replace) {
                regenerating.insert(descriptor.name.as_str());
            }

            tracing::debug!(resource = %descriptor.name, action = %action, "planned");
            steps.push(PlanStep {
                descriptor: descriptor.clone(),
                action,
                changed,
            });
        }

        let orphans: Vec<&ResourceRecord> = state
            .records()
            .filter(|r| !graph.contains(&r.name))
            .collect();
        for record in delete_order(&orphans) {
            tracing::debug!(resource = %record.name, "planned delete of orphaned resource");
            steps.push(PlanStep {
                descriptor: record.to_descriptor(),
                action: PlanAction::Delete,
                changed: Vec::new(),
            });
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when applying this plan would not call the provider at all.
    pub fn is_converged(&self) -> bool {
        self.steps.iter().all(|s| !s.action.is_change())
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for step in &self.steps {
            match step.action {
                PlanAction::Create => summary.create += 1,
                PlanAction::Update => summary.update += 1,
                PlanAction::Replace => summary.replace += 1,
                PlanAction::Delete => summary.delete += 1,
                PlanAction::NoOp => summary.no_op += 1,
            }
        }
        summary
    }

    pub fn step(&self, name: &str) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(
                f,
                "{:>3} {:<8} {} ({})",
                step.action.symbol(),
                step.action,
                step.descriptor.name,
                step.descriptor.kind
            )?;
            if !step.changed.is_empty() {
                write!(f, " [{}]", step.changed.join(", "))?;
            }
            writeln!(f)?;
        }
        let s = self.summary();
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            s.create, s.update, s.replace, s.delete, s.no_op
        )
    }
}

/// Resolve derived properties whose source is not being regenerated by this
/// plan. Values sourced from a regenerating resource stay deferred.
/// Reverse dependency order over `records`: a record is deleted only after
/// every other record in the set that references it. Among records that are
/// ready together, the most recently materialized goes first.
fn delete_order<'a>(records: &[&'a ResourceRecord]) -> Vec<&'a ResourceRecord> {
    let n = records.len();
    let position: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.name.as_str(), i))
        .collect();

    // referrers[i]: how many records in the set still reference records[i].
    let mut referrers = vec![0usize; n];
    let mut targets: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, record) in records.iter().enumerate() {
        for reference in &record.references {
            if let Some(&target) = position.get(reference.as_str())
                && target != i
                && !targets[i].contains(&target)
            {
                referrers[target] += 1;
                targets[i].push(target);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| referrers[i] == 0).collect();
    let mut ordered = Vec::with_capacity(n);
    let mut done = vec![false; n];
    while let Some(i) = ready.pop_last() {
        ordered.push(records[i]);
        done[i] = true;
        for &target in &targets[i] {
            referrers[target] -= 1;
            if referrers[target] == 0 {
                ready.insert(target);
            }
        }
    }

    // Saved state never holds a cycle; if it did, delete the rest newest first.
    ordered.extend((0..n).rev().filter(|&i| !done[i]).map(|i| records[i]));
    ordered
}

fn resolve_known(
    descriptor: &ResourceDescriptor,
    state: &MaterializedState,
    regenerating: &HashSet<&str>,
) -> Result<ResourceDescriptor, PlanError> {
    let mut out = descriptor.clone();
    for value in out.properties.values_mut() {
        if let PropertyValue::Derived(derived) = value
            && !regenerating.contains(derived.source.owner.as_str())
        {
            *value = PropertyValue::Text(resolve_value(derived, state)?);
        }
    }
    Ok(out)
}
