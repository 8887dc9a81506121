//! `folio validate` and `folio graph`.

use super::{load_config, load_stack};
use folio_planner::ResourceGraph;
use std::fmt::Write;
use std::path::Path;

fn build_graph(config_path: &Path) -> anyhow::Result<ResourceGraph> {
    let config = load_config(config_path)?;
    let stack = load_stack(&config)?;
    Ok(ResourceGraph::build(stack.descriptors)?)
}

/// Load the configuration, build the stack and check that it orders.
pub fn validate(config_path: &Path) -> anyhow::Result<()> {
    let graph = build_graph(config_path)?;
    let order = graph.order()?;

    println!(
        "✔ {} is valid ({} resources)",
        config_path.display(),
        graph.len()
    );
    for (i, descriptor) in order.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, descriptor.name, descriptor.kind);
    }
    Ok(())
}

pub fn graph(config_path: &Path, dot: bool) -> anyhow::Result<()> {
    let graph = build_graph(config_path)?;
    let rendered = if dot {
        render_dot(&graph)?
    } else {
        render_text(&graph)?
    };
    print!("{rendered}");
    Ok(())
}

/// One line per resource in apply order, with what it waits for.
pub fn render_text(graph: &ResourceGraph) -> anyhow::Result<String> {
    let mut out = String::new();
    for descriptor in graph.order()? {
        let refs = descriptor.references();
        if refs.is_empty() {
            writeln!(out, "{} [{}]", descriptor.name, descriptor.kind)?;
        } else {
            writeln!(
                out,
                "{} [{}] <- {}",
                descriptor.name,
                descriptor.kind,
                refs.join(", ")
            )?;
        }
    }
    Ok(out)
}

/// Graphviz DOT with edges pointing from a resource to its dependents.
pub fn render_dot(graph: &ResourceGraph) -> anyhow::Result<String> {
    let mut out = String::from("digraph folio {\n  rankdir=LR;\n");
    for descriptor in graph.order()? {
        writeln!(
            out,
            "  \"{}\" [label=\"{}\\n{}\"];",
            descriptor.name, descriptor.name, descriptor.kind
        )?;
        for reference in descriptor.references() {
            writeln!(out, "  \"{}\" -> \"{}\";", reference, descriptor.name)?;
        }
    }
    out.push_str("}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;

    #[test]
    fn validate_accepts_a_complete_project() {
        let (_dir, config) = fixture::project("");
        validate(&config).unwrap();
    }

    #[test]
    fn validate_reports_missing_bundle() {
        let (_dir, config) = fixture::project("frontend:\n  dist_dir: nowhere\n");
        let err = validate(&config).unwrap_err();
        assert!(format!("{err:#}").contains("bundle directory not found"));
    }

    #[test]
    fn validate_rejects_bad_photo_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("folio.yaml");
        std::fs::write(&config, "photo:\n  key: /etc/passwd\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(format!("{err:#}").contains("invalid object key"));
    }

    #[test]
    fn text_graph_lists_distribution_after_gateway() {
        let (_dir, config) = fixture::project("");
        let text = render_text(&build_graph(&config).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        let api = lines.iter().position(|l| l.starts_with("HttpApi ")).unwrap();
        let cdn = lines
            .iter()
            .position(|l| l.starts_with("SiteDistribution "))
            .unwrap();
        assert!(api < cdn);
        assert!(lines[cdn].contains("HttpApi"));
        assert!(lines.last().unwrap().starts_with("DeployFrontend "));
    }

    #[test]
    fn dot_graph_has_an_edge_per_reference() {
        let (_dir, config) = fixture::project("");
        let graph = build_graph(&config).unwrap();
        let dot = render_dot(&graph).unwrap();

        let references: usize = graph
            .descriptors()
            .iter()
            .map(|d| d.references().len())
            .sum();
        assert_eq!(dot.matches(" -> ").count(), references);
        assert!(dot.contains("\"FrontendBucket\" -> \"DeployFrontend\";"));
        assert!(dot.ends_with("}\n"));
    }
}
