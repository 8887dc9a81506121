//! Materialized resource state.
//!
//! The state is the executor's record of what the provider has already
//! created: the resolved properties each resource was applied with and the
//! generated attributes it returned. Generated attributes are only readable
//! through this type.

use crate::resolve::ResolveError;
use crate::{GeneratedAttribute, PermissionGrant, PropertyValue, ResourceDescriptor, ResourceKind, RoutingRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for state persistence.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One materialized resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub kind: ResourceKind,

    /// Resolved properties the resource was last applied with.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RoutingRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<PermissionGrant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,

    /// Generated attributes returned by the provider.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    pub applied_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Record a resolved descriptor together with its generated attributes.
    pub fn materialized(descriptor: &ResourceDescriptor, attributes: BTreeMap<String, String>) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            properties: descriptor.properties.clone(),
            routes: descriptor.routes.clone(),
            grants: descriptor.grants.clone(),
            references: descriptor.references().into_iter().map(str::to_string).collect(),
            attributes,
            applied_at: Utc::now(),
        }
    }

    /// The descriptor this record was applied from (with resolved properties).
    pub fn to_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            name: self.name.clone(),
            kind: self.kind,
            properties: self.properties.clone(),
            depends_on: self.references.clone(),
            routes: self.routes.clone(),
            grants: self.grants.clone(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Everything the provider has materialized, in materialization order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MaterializedState {
    #[serde(default)]
    resources: BTreeMap<String, ResourceRecord>,

    /// Logical names in first-materialization order. An update keeps its
    /// slot; a replace removes the name and appends it again. Deletes are
    /// ordered by `ResourceRecord::references`, not by this list.
    #[serde(default)]
    order: Vec<String>,
}

impl MaterializedState {
    /// Load state from a JSON file. A missing file is an empty state.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write state as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StateError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ResourceRecord> {
        self.resources.get(name)
    }

    pub fn is_materialized(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Insert or replace a record. A new name is appended to the
    /// materialization order; an existing name keeps its position.
    pub fn insert(&mut self, record: ResourceRecord) {
        if !self.resources.contains_key(&record.name) {
            self.order.push(record.name.clone());
        }
        self.resources.insert(record.name.clone(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceRecord> {
        self.order.retain(|n| n != name);
        self.resources.remove(name)
    }

    /// Records in materialization order.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &ResourceRecord> {
        self.order.iter().filter_map(|n| self.resources.get(n))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Read a generated attribute. Fails with `PrematureRead` until the owner
    /// has been materialized and reported the attribute.
    pub fn read(&self, handle: &GeneratedAttribute) -> Result<&str, ResolveError> {
        self.resources
            .get(&handle.owner)
            .and_then(|r| r.attribute(&handle.attribute))
            .ok_or_else(|| ResolveError::PrematureRead {
                owner: handle.owner.clone(),
                attribute: handle.attribute.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ResourceRecord {
        let mut attrs = BTreeMap::new();
        attrs.insert("bucket_name".to_string(), format!("{}-xyz", name.to_lowercase()));
        ResourceRecord::materialized(&ResourceDescriptor::new(name, ResourceKind::Storage), attrs)
    }

    #[test]
    fn insert_preserves_materialization_order() {
        let mut state = MaterializedState::default();
        state.insert(record("B"));
        state.insert(record("A"));
        state.insert(record("B"));

        let names: Vec<_> = state.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        state.remove("B");
        let names: Vec<_> = state.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn reads_generated_attributes() {
        let mut state = MaterializedState::default();
        state.insert(record("Photos"));

        let value = state
            .read(&GeneratedAttribute::new("Photos", "bucket_name"))
            .unwrap();
        assert_eq!(value, "photos-xyz");

        let missing = state.read(&GeneratedAttribute::new("Photos", "arn"));
        assert!(matches!(missing, Err(ResolveError::PrematureRead { .. })));
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = MaterializedState::default();
        state.insert(record("Photos"));
        state.save(&path).unwrap();

        let loaded = MaterializedState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = MaterializedState::load(dir.path().join("absent.json")).unwrap();
        assert!(state.is_empty());
    }
}
