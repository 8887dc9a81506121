//! Command implementations.
//!
//! Every command loads `folio.yaml` (relative paths resolve against its
//! directory) and, where needed, the state file it names.

pub mod apply;
pub mod outputs;
pub mod plan;
pub mod validate;

use anyhow::Context;
use folio_core::{FolioConfig, MaterializedState};
use folio_infra::Stack;
use std::path::Path;

pub(crate) fn load_config(path: &Path) -> anyhow::Result<FolioConfig> {
    FolioConfig::load_with_context(path)
        .with_context(|| format!("failed to load {}", path.display()))
}

pub(crate) fn load_stack(config: &FolioConfig) -> anyhow::Result<Stack> {
    Ok(folio_infra::portfolio_stack(config)?)
}

pub(crate) fn load_state(config: &FolioConfig) -> anyhow::Result<MaterializedState> {
    MaterializedState::load(&config.state.path)
        .with_context(|| format!("failed to read state {}", config.state.path.display()))
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A project directory with a config file and a two-file bundle.
    pub fn project(extra: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("frontend/dist");
        fs::create_dir_all(dist.join("assets")).unwrap();
        fs::write(dist.join("index.html"), "<html></html>").unwrap();
        fs::write(dist.join("assets/app.js"), "console.log(1)").unwrap();

        let config = dir.path().join("folio.yaml");
        fs::write(
            &config,
            format!("project: folio-test\nphoto:\n  key: me.jpg\n{extra}"),
        )
        .unwrap();
        (dir, config)
    }

    pub fn state_path(dir: &Path) -> PathBuf {
        dir.join(".folio/state.json")
    }
}
