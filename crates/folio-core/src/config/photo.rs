//! Private photo object binding.

use super::ConfigError;
use serde::{Deserialize, Serialize};

const MAX_KEY_BYTES: usize = 1024;

/// The single private object served by `GET /photo`.
///
/// The key is explicit configuration with no default; it is validated on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoConfig {
    /// Object key inside the private bucket, e.g. `profile.jpg`.
    pub key: String,

    /// Keep the bucket (and photo) when the stack is destroyed.
    #[serde(default = "default_retain")]
    pub retain_on_delete: bool,

    /// Lifetime of signed URLs, in seconds.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
}

impl PhotoConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            retain_on_delete: default_retain(),
            url_ttl_secs: default_url_ttl_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_object_key(&self.key)?;
        if self.url_ttl_secs == 0 || self.url_ttl_secs > 3600 {
            return Err(ConfigError::Config(format!(
                "photo.url_ttl_secs must be between 1 and 3600, got {}",
                self.url_ttl_secs
            )));
        }
        Ok(())
    }
}

/// Validate an object key: non-empty, at most 1024 bytes, no leading `/`,
/// no `.`/`..` segments and no control characters.
pub fn validate_object_key(key: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Config(format!("invalid object key '{}': {}", key, reason));

    if key.trim().is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(invalid("key exceeds 1024 bytes"));
    }
    if key.starts_with('/') {
        return Err(invalid("key must not start with '/'"));
    }
    if key.chars().any(char::is_control) {
        return Err(invalid("key contains control characters"));
    }
    if key.split('/').any(|seg| seg == ".." || seg == ".") {
        return Err(invalid("key contains relative path segments"));
    }
    Ok(())
}

fn default_retain() -> bool {
    true
}

fn default_url_ttl_secs() -> u64 {
    3600
}
