//! An in-process provider that fabricates generated attributes.
//!
//! Used by the CLI for local planning and applying, and by tests. Attribute
//! shapes follow the real services: bucket names are lowercase, gateway
//! endpoints are `https://{id}.execute-api.{region}.amazonaws.com/`, and
//! distributions live under `cloudfront.net`.

use crate::provider::{Attributes, CloudProvider};
use anyhow::{Context, bail};
use async_trait::async_trait;
use folio_core::{MaterializedState, ResourceDescriptor, ResourceKind, ResourceRecord};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

const ACCOUNT_ID: &str = "000000000000";

/// Provider calls made so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Debug, Default)]
struct Inner {
    calls: CallCounts,
    live: BTreeMap<String, Attributes>,
    fail_on: HashSet<String>,
}

#[derive(Debug)]
pub struct InMemoryProvider {
    region: String,
    inner: Mutex<Inner>,
}

impl InMemoryProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A provider that already holds every resource recorded in `state`.
    pub fn seeded(region: impl Into<String>, state: &MaterializedState) -> Self {
        let provider = Self::new(region);
        if let Ok(mut inner) = provider.inner.lock() {
            for record in state.records() {
                inner.live.insert(record.name.clone(), record.attributes.clone());
            }
        }
        provider
    }

    /// Make every call touching `name` fail.
    pub fn fail_on(self, name: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_on.insert(name.into());
        }
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().map(|i| i.calls).unwrap_or_default()
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.inner
            .lock()
            .map(|i| i.live.contains_key(name))
            .unwrap_or(false)
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("simulated provider state poisoned"))
    }

    fn generate(&self, descriptor: &ResourceDescriptor) -> Attributes {
        let mut attrs = Attributes::new();
        match descriptor.kind {
            ResourceKind::Storage => {
                let bucket = format!("{}-{}", descriptor.name.to_ascii_lowercase(), token(12, false));
                attrs.insert("bucket_arn".into(), format!("arn:aws:s3:::{}", bucket));
                attrs.insert("bucket_name".into(), bucket);
            }
            ResourceKind::Compute => {
                let function = descriptor
                    .property("function_name")
                    .and_then(|v| v.as_text())
                    .map(str::to_string)
                    .unwrap_or_else(|| descriptor.name.to_ascii_lowercase());
                attrs.insert(
                    "function_arn".into(),
                    format!(
                        "arn:aws:lambda:{}:{}:function:{}",
                        self.region, ACCOUNT_ID, function
                    ),
                );
                attrs.insert("function_name".into(), function);
            }
            ResourceKind::Routing => {
                let id = token(10, false);
                attrs.insert(
                    "api_endpoint".into(),
                    format!("https://{}.execute-api.{}.amazonaws.com/", id, self.region),
                );
                attrs.insert("api_id".into(), id);
            }
            ResourceKind::Edge => {
                let domain = format!("d{}.cloudfront.net", token(13, false));
                attrs.insert("distribution_id".into(), format!("E{}", token(13, true)));
                attrs.insert("url".into(), format!("https://{}", domain));
                attrs.insert("domain_name".into(), domain);
            }
            ResourceKind::Deployment => {
                attrs.insert("invalidation_id".into(), format!("I{}", token(13, true)));
            }
        }
        attrs
    }

    fn check(&self, inner: &Inner, name: &str, op: &str) -> anyhow::Result<()> {
        if inner.fail_on.contains(name) {
            bail!("simulated {} failure for '{}'", op, name);
        }
        Ok(())
    }
}

fn token(len: usize, upper: bool) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| {
            let c = char::from(b);
            if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

fn ensure_resolved(descriptor: &ResourceDescriptor) -> anyhow::Result<()> {
    if let Some((key, value)) = descriptor.derived_values().next() {
        bail!(
            "'{}' property '{}' is still deferred on {}",
            descriptor.name,
            key,
            value.source
        );
    }
    Ok(())
}

#[async_trait]
impl CloudProvider for InMemoryProvider {
    async fn create(&self, descriptor: &ResourceDescriptor) -> anyhow::Result<Attributes> {
        ensure_resolved(descriptor)?;
        let mut inner = self.lock()?;
        inner.calls.create += 1;
        self.check(&inner, &descriptor.name, "create")?;
        if inner.live.contains_key(&descriptor.name) {
            bail!("resource '{}' already exists", descriptor.name);
        }

        let attrs = self.generate(descriptor);
        inner.live.insert(descriptor.name.clone(), attrs.clone());
        tracing::info!(resource = %descriptor.name, kind = %descriptor.kind, "created");
        Ok(attrs)
    }

    async fn update(
        &self,
        descriptor: &ResourceDescriptor,
        prior: &Attributes,
    ) -> anyhow::Result<Attributes> {
        ensure_resolved(descriptor)?;
        let mut inner = self.lock()?;
        inner.calls.update += 1;
        self.check(&inner, &descriptor.name, "update")?;

        let live = inner
            .live
            .get_mut(&descriptor.name)
            .with_context(|| format!("resource '{}' does not exist", descriptor.name))?;
        let mut attrs = prior.clone();
        if descriptor.kind == ResourceKind::Deployment {
            // Every upload issues a fresh cache invalidation.
            attrs.insert("invalidation_id".into(), format!("I{}", token(13, true)));
        }
        *live = attrs.clone();
        tracing::info!(resource = %descriptor.name, kind = %descriptor.kind, "updated");
        Ok(attrs)
    }

    async fn delete(&self, record: &ResourceRecord) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        inner.calls.delete += 1;
        self.check(&inner, &record.name, "delete")?;
        if inner.live.remove(&record.name).is_none() {
            tracing::warn!(resource = %record.name, "delete of resource that no longer exists");
        } else {
            tracing::info!(resource = %record.name, kind = %record.kind, "deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::GeneratedAttribute;

    #[tokio::test]
    async fn generates_kind_specific_attributes() {
        let provider = InMemoryProvider::new("eu-north-1");
        let api = provider
            .create(&ResourceDescriptor::new("HttpApi", ResourceKind::Routing))
            .await
            .unwrap();
        let endpoint = &api["api_endpoint"];
        assert!(endpoint.starts_with("https://"));
        assert!(endpoint.ends_with(".execute-api.eu-north-1.amazonaws.com/"));

        let cdn = provider
            .create(&ResourceDescriptor::new("Cdn", ResourceKind::Edge))
            .await
            .unwrap();
        assert!(cdn["domain_name"].ends_with(".cloudfront.net"));
        assert_eq!(cdn["url"], format!("https://{}", cdn["domain_name"]));
        assert_eq!(provider.calls().create, 2);
    }

    #[tokio::test]
    async fn refuses_unresolved_descriptors() {
        let provider = InMemoryProvider::new("eu-north-1");
        let d = ResourceDescriptor::new("Fn", ResourceKind::Compute).with_property(
            "env.PHOTO_BUCKET",
            GeneratedAttribute::new("Photos", "bucket_name").verbatim(),
        );
        assert!(provider.create(&d).await.is_err());
        assert!(!provider.is_live("Fn"));
    }

    #[tokio::test]
    async fn update_requires_an_existing_resource() {
        let provider = InMemoryProvider::new("eu-north-1");
        let d = ResourceDescriptor::new("Photos", ResourceKind::Storage);
        assert!(provider.update(&d, &Attributes::new()).await.is_err());

        let attrs = provider.create(&d).await.unwrap();
        let updated = provider.update(&d, &attrs).await.unwrap();
        assert_eq!(attrs, updated);
    }

    #[tokio::test]
    async fn fail_on_targets_one_resource() {
        let provider = InMemoryProvider::new("eu-north-1").fail_on("Fn");
        assert!(
            provider
                .create(&ResourceDescriptor::new("Photos", ResourceKind::Storage))
                .await
                .is_ok()
        );
        let err = provider
            .create(&ResourceDescriptor::new("Fn", ResourceKind::Compute))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Fn"));
    }
}
