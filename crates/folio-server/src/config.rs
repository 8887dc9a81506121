use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Longest lifetime handed out for a photo URL.
pub const MAX_PHOTO_URL_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub photo: PhotoBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Where the photo lives. Bucket and key are normally injected through the
/// function's environment by the deployed stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoBinding {
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,

    /// Overrides the `s3.{region}.amazonaws.com` endpoint suffix, e.g. for
    /// S3-compatible stores.
    #[serde(default)]
    pub endpoint_host: Option<String>,
}

fn default_region() -> String {
    "eu-north-1".to_string()
}

fn default_url_ttl_secs() -> u64 {
    MAX_PHOTO_URL_TTL_SECS
}

impl Default for PhotoBinding {
    fn default() -> Self {
        Self {
            bucket: None,
            key: None,
            region: default_region(),
            url_ttl_secs: default_url_ttl_secs(),
            endpoint_host: None,
        }
    }
}

impl AppConfig {
    /// Apply `PHOTO_BUCKET`, `PHOTO_KEY`, `PHOTO_URL_TTL_SECS`, `AWS_REGION`
    /// and `FOLIO_BIND` from `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(bucket) = get("PHOTO_BUCKET") {
            self.photo.bucket = Some(bucket);
        }
        if let Some(key) = get("PHOTO_KEY") {
            self.photo.key = Some(key);
        }
        if let Some(ttl) = get("PHOTO_URL_TTL_SECS") {
            self.photo.url_ttl_secs = ttl.trim().parse().map_err(|_| {
                anyhow::anyhow!("PHOTO_URL_TTL_SECS must be a number of seconds, got '{}'", ttl)
            })?;
        }
        if let Some(region) = get("AWS_REGION") {
            self.photo.region = region;
        }
        if let Some(bind) = get("FOLIO_BIND") {
            self.server.bind = bind;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let ttl = self.photo.url_ttl_secs;
        if ttl == 0 || ttl > MAX_PHOTO_URL_TTL_SECS {
            anyhow::bail!(
                "photo.url_ttl_secs must be between 1 and {}, got {}",
                MAX_PHOTO_URL_TTL_SECS,
                ttl
            );
        }
        if self.photo.region.trim().is_empty() {
            anyhow::bail!("photo.region must not be empty");
        }
        Ok(())
    }
}

/// Load the TOML config named by `FOLIO_SERVER_CONFIG` (default
/// `folio-server.toml`), then apply environment overrides.
///
/// The default file is optional; an explicitly named one must exist.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let explicit = env::var("FOLIO_SERVER_CONFIG").ok();
    let path = explicit
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("folio-server.toml"));

    let mut cfg = if path.exists() || explicit.is_some() {
        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw)?
    } else {
        AppConfig::default()
    };

    cfg.apply_overrides(|name| env::var(name).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_defaults() {
        let cfg: AppConfig = toml::from_str("[photo]\nbucket = \"photos\"\n").unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.photo.bucket.as_deref(), Some("photos"));
        assert_eq!(cfg.photo.key, None);
        assert_eq!(cfg.photo.region, "eu-north-1");
        assert_eq!(cfg.photo.url_ttl_secs, 3600);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut cfg: AppConfig =
            toml::from_str("[photo]\nbucket = \"from-file\"\nregion = \"us-east-1\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("PHOTO_BUCKET", "from-env"),
            ("PHOTO_KEY", "me.jpg"),
            ("AWS_REGION", ""),
            ("FOLIO_BIND", "127.0.0.1:3000"),
        ]
        .into_iter()
        .collect();

        cfg.apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.photo.bucket.as_deref(), Some("from-env"));
        assert_eq!(cfg.photo.key.as_deref(), Some("me.jpg"));
        assert_eq!(cfg.photo.region, "us-east-1");
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn ttl_comes_from_the_function_environment() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|name| (name == "PHOTO_URL_TTL_SECS").then(|| "900".to_string()))
            .unwrap();
        assert_eq!(cfg.photo.url_ttl_secs, 900);
        assert!(cfg.validate().is_ok());

        cfg.apply_overrides(|name| (name == "PHOTO_URL_TTL_SECS").then(|| "86400".to_string()))
            .unwrap();
        assert!(cfg.validate().is_err());

        let err = cfg
            .apply_overrides(|name| (name == "PHOTO_URL_TTL_SECS").then(|| "an hour".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PHOTO_URL_TTL_SECS"));
    }

    #[test]
    fn ttl_is_capped() {
        let mut cfg = AppConfig::default();
        cfg.photo.url_ttl_secs = 7200;
        assert!(cfg.validate().is_err());
        cfg.photo.url_ttl_secs = 0;
        assert!(cfg.validate().is_err());
        cfg.photo.url_ttl_secs = 900;
        assert!(cfg.validate().is_ok());
    }
}
