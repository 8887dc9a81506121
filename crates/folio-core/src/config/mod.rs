//! Configuration types for folio.
//!
//! The stack is configured from a single YAML file (`folio.yaml` by default).
//! Relative paths in the file are resolved against the file's directory by
//! [`FolioConfig::load_with_context`].
//!
//! ```yaml
//! project: portfolio
//! region: eu-north-1
//! photo:
//!   key: profile.jpg
//! frontend:
//!   dist_dir: frontend/dist
//! ```

pub mod backend;
pub mod edge;
pub mod photo;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use backend::{BackendConfig, CorsConfig, RouteConfig};
pub use edge::EdgeConfig;
pub use photo::PhotoConfig;

/// Complete folio configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioConfig {
    /// Project name, used as a prefix for generated resource names.
    #[serde(default = "default_project")]
    pub project: String,

    /// Cloud region the stack is deployed to.
    #[serde(default = "default_region")]
    pub region: String,

    /// Private photo object binding. Required: the object key has no default.
    pub photo: PhotoConfig,

    /// Static frontend bundle.
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Backend function and gateway settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Content-delivery settings.
    #[serde(default)]
    pub edge: EdgeConfig,

    /// Where materialized state is persisted.
    #[serde(default)]
    pub state: StateConfig,
}

/// Static frontend bundle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Directory holding the built bundle.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,

    /// Object served for the root path.
    #[serde(default = "default_index_document")]
    pub index_document: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dist_dir: default_dist_dir(),
            index_document: default_index_document(),
        }
    }
}

/// State persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_project() -> String {
    "portfolio".to_string()
}

fn default_region() -> String {
    "eu-north-1".to_string()
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("frontend/dist")
}

fn default_index_document() -> String {
    "index.html".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".folio/state.json")
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FolioConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration and resolve relative paths against the directory
    /// containing the file.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if config.frontend.dist_dir.is_relative() {
            config.frontend.dist_dir = base_dir.join(&config.frontend.dist_dir);
        }
        if config.state.path.is_relative() {
            config.state.path = base_dir.join(&config.state.path);
        }

        Ok(config)
    }

    /// Check values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.is_empty()
            || !self
                .project
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::Config(format!(
                "project '{}' must be non-empty lowercase letters, digits or '-'",
                self.project
            )));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Config("region must not be empty".to_string()));
        }

        self.photo.validate()?;
        self.backend.validate()?;
        self.edge.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = FolioConfig::from_yaml("photo:\n  key: profile.jpg\n").unwrap();
        assert_eq!(config.project, "portfolio");
        assert_eq!(config.region, "eu-north-1");
        assert_eq!(config.photo.key, "profile.jpg");
        assert_eq!(config.frontend.index_document, "index.html");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.backend.routes.len(), 2);
        assert_eq!(config.state.path, PathBuf::from(".folio/state.json"));
    }

    #[test]
    fn photo_key_is_required() {
        let err = FolioConfig::from_yaml("project: portfolio\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn rejects_bad_project_names() {
        let err = FolioConfig::from_yaml("project: My Site\nphoto:\n  key: a.jpg\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.yaml");
        fs::write(&path, "photo:\n  key: profile.jpg\nfrontend:\n  dist_dir: site/dist\n").unwrap();

        let config = FolioConfig::load_with_context(&path).unwrap();
        assert_eq!(config.frontend.dist_dir, dir.path().join("site/dist"));
        assert_eq!(config.state.path, dir.path().join(".folio/state.json"));
    }
}
