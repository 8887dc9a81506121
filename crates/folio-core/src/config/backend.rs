//! Backend function and HTTP gateway configuration.

use super::ConfigError;
use crate::routing::{HttpMethod, PathPattern};
use serde::{Deserialize, Serialize};

/// Configuration for the backend function and the gateway in front of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Function runtime identifier.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Entry point inside the deployment package.
    #[serde(default = "default_handler")]
    pub handler: String,

    /// Instruction set architecture.
    #[serde(default = "default_architecture")]
    pub architecture: String,

    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Explicit gateway routes. A default catch-all route is always added.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// One explicit gateway route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default = "default_route_methods")]
    pub methods: Vec<HttpMethod>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        Self {
            path: path.into(),
            methods: methods.into_iter().collect(),
        }
    }
}

/// Gateway CORS preflight policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsConfig {
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<HttpMethod>,
    #[serde(default = "default_allow_headers")]
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
            allow_methods: default_allow_methods(),
            allow_headers: default_allow_headers(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            handler: default_handler(),
            architecture: default_architecture(),
            memory_mb: default_memory_mb(),
            timeout_secs: default_timeout_secs(),
            routes: default_routes(),
            cors: CorsConfig::default(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 || self.timeout_secs > 900 {
            return Err(ConfigError::Config(format!(
                "backend.timeout_secs must be between 1 and 900, got {}",
                self.timeout_secs
            )));
        }
        if !(128..=10240).contains(&self.memory_mb) {
            return Err(ConfigError::Config(format!(
                "backend.memory_mb must be between 128 and 10240, got {}",
                self.memory_mb
            )));
        }
        for route in &self.routes {
            let pattern = PathPattern::parse(&route.path)
                .map_err(|e| ConfigError::Config(e.to_string()))?;
            if pattern.is_wildcard() {
                return Err(ConfigError::Config(format!(
                    "backend route '{}' must be an exact path",
                    route.path
                )));
            }
            if route.methods.is_empty() {
                return Err(ConfigError::Config(format!(
                    "backend route '{}' has no methods",
                    route.path
                )));
            }
        }
        Ok(())
    }
}

fn default_runtime() -> String {
    "provided.al2023".to_string()
}

fn default_handler() -> String {
    "bootstrap".to_string()
}

fn default_architecture() -> String {
    "x86_64".to_string()
}

fn default_memory_mb() -> u32 {
    256
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/fortune", [HttpMethod::Get]),
        RouteConfig::new("/photo", [HttpMethod::Get]),
    ]
}

fn default_route_methods() -> Vec<HttpMethod> {
    vec![HttpMethod::Get]
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allow_methods() -> Vec<HttpMethod> {
    vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Options]
}

fn default_allow_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}
