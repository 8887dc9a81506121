//! `folio plan`: show what an apply would do.

use super::{load_config, load_stack, load_state};
use folio_planner::{Plan, ResourceGraph};
use std::fmt::Write;
use std::path::Path;

pub fn plan(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let stack = load_stack(&config)?;
    let state = load_state(&config)?;

    let graph = ResourceGraph::build(stack.descriptors)?;
    let plan = Plan::build(&graph, &state)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render(&plan)?);
    }
    Ok(())
}

pub fn render(plan: &Plan) -> anyhow::Result<String> {
    let mut out = String::new();
    for step in plan.steps() {
        write!(
            out,
            "{:>3} {:<18} {:<8}",
            step.action.symbol(),
            step.name(),
            step.action
        )?;
        if !step.changed.is_empty() {
            write!(out, " ({})", step.changed.join(", "))?;
        }
        out.push('\n');
    }

    if plan.is_converged() {
        out.push_str("\nNo changes. Infrastructure matches the configuration.\n");
    } else {
        let s = plan.summary();
        writeln!(
            out,
            "\nPlan: {} to create, {} to update, {} to replace, {} to delete.",
            s.create, s.update, s.replace, s.delete
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{apply, fixture};

    fn build(config: &Path) -> Plan {
        let config = load_config(config).unwrap();
        let stack = load_stack(&config).unwrap();
        let state = load_state(&config).unwrap();
        Plan::build(&ResourceGraph::build(stack.descriptors).unwrap(), &state).unwrap()
    }

    #[test]
    fn fresh_project_plans_six_creates() {
        let (_dir, config) = fixture::project("");
        let text = render(&build(&config)).unwrap();
        assert_eq!(text.matches("create").count(), 7);
        assert!(text.contains("Plan: 6 to create, 0 to update, 0 to replace, 0 to delete."));
    }

    #[tokio::test]
    async fn applied_project_plans_no_changes() {
        let (_dir, config) = fixture::project("");
        apply::apply(&config).await.unwrap();

        let plan = build(&config);
        assert!(plan.is_converged());
        assert!(render(&plan).unwrap().contains("No changes."));
    }

    #[tokio::test]
    async fn changed_bundle_updates_only_the_deployment() {
        let (dir, config) = fixture::project("");
        apply::apply(&config).await.unwrap();
        std::fs::write(dir.path().join("frontend/dist/index.html"), "<html>v2</html>").unwrap();

        let plan = build(&config);
        let summary = plan.summary();
        assert_eq!(summary.update, 1);
        assert_eq!(summary.no_op, 5);
        let step = plan.step("DeployFrontend").unwrap();
        assert!(step.changed.contains(&"content_hash".to_string()));
    }
}
