//! `folio apply` and `folio destroy`.
//!
//! Both run against the in-memory provider seeded from the saved state, and
//! both save the final state even when a step fails, so resources applied
//! before the failure are not forgotten.

use super::{load_config, load_stack, load_state};
use anyhow::Context;
use folio_core::{FolioConfig, MaterializedState, ResourceDescriptor, StackOutput};
use folio_runtime::{ApplyReport, InMemoryProvider, plan_and_apply};
use std::path::Path;
use std::sync::Arc;

pub(crate) async fn run(
    config: &FolioConfig,
    descriptors: Vec<ResourceDescriptor>,
    outputs: &[StackOutput],
    state: MaterializedState,
) -> anyhow::Result<ApplyReport> {
    let provider = Arc::new(InMemoryProvider::seeded(config.region.clone(), &state));
    let report = plan_and_apply(descriptors, outputs, provider, state).await?;

    report
        .final_state
        .save(&config.state.path)
        .with_context(|| format!("failed to save state {}", config.state.path.display()))?;
    tracing::info!(
        run_id = %report.run_id,
        resources = report.final_state.len(),
        "state saved"
    );
    Ok(report)
}

fn print_steps(report: &ApplyReport) {
    for step in &report.steps {
        println!(
            "{:>3} {:<18} {}",
            step.applied.symbol(),
            step.name,
            step.applied
        );
    }
}

fn finish(report: ApplyReport) -> anyhow::Result<()> {
    match report.failure {
        None => Ok(()),
        Some(err) => Err(anyhow::Error::new(err).context(format!("apply {}", report.lifecycle))),
    }
}

pub async fn apply(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let stack = load_stack(&config)?;
    let state = load_state(&config)?;

    let report = run(&config, stack.descriptors, &stack.outputs, state).await?;
    print_steps(&report);

    if report.succeeded() {
        println!("\n✔ Apply complete ({} resources)", report.final_state.len());
        if !report.outputs.is_empty() {
            println!("\nOutputs:");
            for output in &stack.outputs {
                if let Some(value) = report.outputs.get(&output.name) {
                    println!("  {:<16} = {}", output.name, value);
                }
            }
        }
    }
    finish(report)
}

pub async fn destroy(config_path: &Path, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("destroy deletes every resource in state; rerun with --yes to confirm");
    }

    let config = load_config(config_path)?;
    let state = load_state(&config)?;
    if state.is_empty() {
        println!("Nothing to destroy.");
        return Ok(());
    }

    let report = run(&config, Vec::new(), &[], state).await?;
    print_steps(&report);
    if report.succeeded() {
        println!("\n✔ Destroyed {} resources", report.steps.len());
    }
    finish(report)
}
