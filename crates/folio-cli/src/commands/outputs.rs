//! `folio outputs`: read stack outputs back from saved state.

use super::{load_config, load_state};
use folio_core::MaterializedState;
use folio_core::resolve::resolve_value;
use folio_infra::stack_outputs;
use std::collections::BTreeMap;
use std::path::Path;

/// Output name, description and value. The value is `None` until the owning
/// resource has been applied.
pub fn collect(state: &MaterializedState) -> Vec<(String, String, Option<String>)> {
    stack_outputs()
        .into_iter()
        .map(|o| {
            let value = resolve_value(&o.value, state).ok();
            (o.name, o.description, value)
        })
        .collect()
}

pub fn outputs(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let state = load_state(&config)?;
    let values = collect(&state);

    if json {
        let map: BTreeMap<&str, &str> = values
            .iter()
            .filter_map(|(name, _, value)| value.as_deref().map(|v| (name.as_str(), v)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if state.is_empty() {
        println!("No outputs: nothing has been applied yet.");
        return Ok(());
    }
    for (name, description, value) in &values {
        match value {
            Some(v) => println!("{name:<16} = {v}"),
            None => println!("{name:<16}   (not applied)"),
        }
        println!("{:<16}   {}", "", description);
    }
    Ok(())
}
