use async_trait::async_trait;
use folio_core::{ResourceDescriptor, ResourceRecord};
use std::collections::BTreeMap;

/// Generated attributes reported by the provider, keyed by attribute name.
pub type Attributes = BTreeMap<String, String>;

#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Create a resource from a fully resolved descriptor and report its
    /// generated attributes.
    async fn create(&self, descriptor: &ResourceDescriptor) -> anyhow::Result<Attributes>;

    /// Update a resource in place. `prior` holds the attributes reported when
    /// the resource was last applied.
    async fn update(
        &self,
        descriptor: &ResourceDescriptor,
        prior: &Attributes,
    ) -> anyhow::Result<Attributes>;

    /// Delete a materialized resource.
    async fn delete(&self, record: &ResourceRecord) -> anyhow::Result<()>;
}

#[async_trait]
impl<P: CloudProvider + ?Sized> CloudProvider for std::sync::Arc<P> {
    async fn create(&self, descriptor: &ResourceDescriptor) -> anyhow::Result<Attributes> {
        (**self).create(descriptor).await
    }

    async fn update(
        &self,
        descriptor: &ResourceDescriptor,
        prior: &Attributes,
    ) -> anyhow::Result<Attributes> {
        (**self).update(descriptor, prior).await
    }

    async fn delete(&self, record: &ResourceRecord) -> anyhow::Result<()> {
        (**self).delete(record).await
    }
}
