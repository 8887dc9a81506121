use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// Configuration types shared across all folio crates
pub mod config;
pub mod grant;
pub mod resolve;
pub mod routing;
pub mod state;

pub use config::{
    BackendConfig, ConfigError, CorsConfig, EdgeConfig, FolioConfig, FrontendConfig, PhotoConfig,
    RouteConfig, StateConfig,
};
pub use grant::{AccessLevel, PermissionGrant};
pub use resolve::{Extraction, ResolveError};
pub use routing::{
    ForwardingPolicy, HttpMethod, PathPattern, PatternError, RoutingRule, ValueAllowList,
};
pub use state::{MaterializedState, ResourceRecord, StateError};

/// The kind of cloud resource a descriptor declares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Storage,
    Compute,
    Routing,
    Edge,
    Deployment,
}

impl ResourceKind {
    /// Properties that cannot be changed in place. A change to any of these
    /// forces a replace (destroy, then create).
    pub fn immutable_properties(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Storage => &["bucket_name", "encryption"],
            ResourceKind::Compute => &["function_name", "architecture"],
            ResourceKind::Routing => &["protocol_type"],
            ResourceKind::Edge => &[],
            ResourceKind::Deployment => &["destination_bucket"],
        }
    }

    /// Whether requests routed to this kind arrive as a second HTTP hop with
    /// its own virtual hosting.
    pub fn is_http_hop(&self) -> bool {
        matches!(self, ResourceKind::Routing)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Storage => "storage",
            ResourceKind::Compute => "compute",
            ResourceKind::Routing => "routing",
            ResourceKind::Edge => "edge",
            ResourceKind::Deployment => "deployment",
        };
        f.write_str(s)
    }
}

/// Handle to a value a resource only acquires once it has been materialized,
/// e.g. a gateway's invocation URL or a distribution's domain name.
///
/// The handle itself carries no value. It is read from
/// [`MaterializedState::read`], which fails until the owner has been applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneratedAttribute {
    pub owner: String,
    pub attribute: String,
}

impl GeneratedAttribute {
    pub fn new(owner: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            attribute: attribute.into(),
        }
    }

    /// Derive a value from this attribute using the given extraction rule.
    pub fn derive(self, extract: Extraction) -> DerivedValue {
        DerivedValue {
            source: self,
            extract,
        }
    }

    /// Use the attribute value unchanged.
    pub fn verbatim(self) -> DerivedValue {
        self.derive(Extraction::Verbatim)
    }
}

impl fmt::Display for GeneratedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.attribute)
    }
}

/// A property value computed from another resource's generated attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivedValue {
    pub source: GeneratedAttribute,
    pub extract: Extraction,
}

/// A declared property value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    /// A duration in whole seconds.
    Seconds(u64),
    List(Vec<String>),
    Derived(DerivedValue),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_derived(&self) -> Option<&DerivedValue> {
        match self {
            PropertyValue::Derived(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, PropertyValue::Derived(_))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{:?}", s),
            PropertyValue::Integer(n) => write!(f, "{}", n),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Seconds(s) => write!(f, "{}s", s),
            PropertyValue::List(items) => write!(f, "[{}]", items.join(", ")),
            PropertyValue::Derived(d) => write!(f, "<{} | {}>", d.source, d.extract),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(i64::from(value))
    }
}

impl From<Duration> for PropertyValue {
    fn from(value: Duration) -> Self {
        PropertyValue::Seconds(value.as_secs())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

impl From<DerivedValue> for PropertyValue {
    fn from(value: DerivedValue) -> Self {
        PropertyValue::Derived(value)
    }
}

/// A named value exported once the stack has been applied, such as the CDN
/// host name or the gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: DerivedValue,
}

impl StackOutput {
    pub fn new(name: impl Into<String>, description: impl Into<String>, value: DerivedValue) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
        }
    }
}

/// Declarative description of one cloud resource.
///
/// A descriptor never owns another descriptor. Dependencies are expressed by
/// logical name, either explicitly through `depends_on` or implicitly through
/// route targets, grant buckets and derived property sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Logical name, unique within a graph.
    pub name: String,

    pub kind: ResourceKind,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,

    /// Explicit references to other descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RoutingRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<PermissionGrant>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
            routes: Vec::new(),
            grants: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_route(mut self, rule: RoutingRule) -> Self {
        self.routes.push(rule);
        self
    }

    pub fn with_routes(mut self, rules: impl IntoIterator<Item = RoutingRule>) -> Self {
        self.routes.extend(rules);
        self
    }

    pub fn with_grant(mut self, grant: PermissionGrant) -> Self {
        self.grants.push(grant);
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Every logical name this descriptor depends on, deduplicated, in
    /// declaration order: explicit references first, then derived property
    /// sources, route targets and grant buckets. A reference to the
    /// descriptor's own name is kept; the graph rejects it as a cycle.
    pub fn references(&self) -> Vec<&str> {
        let candidates = self
            .depends_on
            .iter()
            .map(String::as_str)
            .chain(self.derived_values().map(|(_, d)| d.source.owner.as_str()))
            .chain(self.routes.iter().map(|r| r.target.as_str()))
            .chain(self.grants.iter().map(|g| g.bucket.as_str()));

        let mut refs: Vec<&str> = Vec::new();
        for name in candidates {
            if !refs.contains(&name) {
                refs.push(name);
            }
        }
        refs
    }

    /// Properties whose value depends on another resource's generated attribute.
    pub fn derived_values(&self) -> impl Iterator<Item = (&str, &DerivedValue)> {
        self.properties
            .iter()
            .filter_map(|(k, v)| v.as_derived().map(|d| (k.as_str(), d)))
    }

    /// True when no property is still deferred.
    pub fn is_resolved(&self) -> bool {
        self.properties.values().all(|v| !v.is_derived())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_deduplicated_in_declaration_order() {
        let d = ResourceDescriptor::new("Cdn", ResourceKind::Edge)
            .depends_on("SiteBucket")
            .with_property(
                "origin.HttpApi.domain_name",
                GeneratedAttribute::new("HttpApi", "api_endpoint").derive(Extraction::Host),
            )
            .with_route(RoutingRule::catch_all("SiteBucket"))
            .with_route(RoutingRule::new(
                PathPattern::parse("/fortune*").unwrap(),
                "HttpApi",
            ));

        assert_eq!(d.references(), vec!["SiteBucket", "HttpApi"]);
        assert!(!d.is_resolved());
    }

    #[test]
    fn self_references_are_kept() {
        let d = ResourceDescriptor::new("Api", ResourceKind::Routing).with_property(
            "self_host",
            GeneratedAttribute::new("Api", "api_endpoint").derive(Extraction::Host),
        );
        assert_eq!(d.references(), vec!["Api"]);
    }

    #[test]
    fn property_values_serialize_with_type_tags() {
        let v = PropertyValue::from(Duration::from_secs(10));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "seconds", "value": 10 }));

        let back: PropertyValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, PropertyValue::Seconds(10));
    }

    #[test]
    fn storage_bucket_name_is_immutable() {
        assert!(ResourceKind::Storage
            .immutable_properties()
            .contains(&"bucket_name"));
        assert!(ResourceKind::Edge.immutable_properties().is_empty());
        assert!(ResourceKind::Routing.is_http_hop());
        assert!(!ResourceKind::Storage.is_http_hop());
    }
}
