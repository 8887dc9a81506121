//! Content-delivery configuration.

use super::ConfigError;
use crate::routing::PathPattern;
use serde::{Deserialize, Serialize};

/// Configuration for the CDN distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Edge location price class.
    #[serde(default = "default_price_class")]
    pub price_class: String,

    /// Path patterns invalidated after each frontend deployment.
    #[serde(default = "default_invalidation_paths")]
    pub invalidation_paths: Vec<String>,

    /// Cache TTL for the static site behavior, in seconds.
    #[serde(default = "default_static_ttl_secs")]
    pub static_ttl_secs: u64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            price_class: default_price_class(),
            invalidation_paths: default_invalidation_paths(),
            static_ttl_secs: default_static_ttl_secs(),
        }
    }
}

impl EdgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invalidation_paths.is_empty() {
            return Err(ConfigError::Config(
                "edge.invalidation_paths must not be empty".to_string(),
            ));
        }
        for path in &self.invalidation_paths {
            PathPattern::parse(path).map_err(|e| ConfigError::Config(e.to_string()))?;
        }
        Ok(())
    }
}

fn default_price_class() -> String {
    "PriceClass_100".to_string()
}

fn default_invalidation_paths() -> Vec<String> {
    vec!["/*".to_string()]
}

fn default_static_ttl_secs() -> u64 {
    86400
}
