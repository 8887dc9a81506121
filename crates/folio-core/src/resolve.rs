//! Derived-value resolution.
//!
//! Generated attributes arrive as raw strings from the provider (usually full
//! URLs). Consumers often need only one component, e.g. a CDN origin needs a
//! bare host name rather than `https://host/path`. Extraction parses the raw
//! value as a URL and fails loudly instead of truncating.

use crate::state::MaterializedState;
use crate::{DerivedValue, PropertyValue, ResourceDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Which component of a generated value to keep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// The raw value, unchanged.
    Verbatim,
    /// Host name without scheme, port or path.
    Host,
    /// `scheme://host[:port]`.
    Origin,
    /// The path component (always starts with `/`).
    Path,
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Extraction::Verbatim => "verbatim",
            Extraction::Host => "host",
            Extraction::Origin => "origin",
            Extraction::Path => "path",
        };
        f.write_str(s)
    }
}

/// Errors raised while resolving derived values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The generated value does not parse for the requested extraction.
    #[error("malformed generated value '{value}': {reason}")]
    MalformedGeneratedValue { value: String, reason: String },

    /// A generated attribute was read before its owner was materialized.
    #[error("premature read of {owner}.{attribute}: owner has not been materialized")]
    PrematureRead { owner: String, attribute: String },
}

/// Extract a component from a raw generated value.
pub fn resolve(raw: &str, extract: Extraction) -> Result<String, ResolveError> {
    if extract == Extraction::Verbatim {
        return Ok(raw.to_string());
    }

    let malformed = |reason: String| ResolveError::MalformedGeneratedValue {
        value: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| malformed(e.to_string()))?;

    match extract {
        Extraction::Host => url
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .ok_or_else(|| malformed("URL has no host component".to_string())),
        Extraction::Origin => {
            let origin = url.origin();
            if origin.is_tuple() {
                Ok(origin.ascii_serialization())
            } else {
                Err(malformed("URL has no tuple origin".to_string()))
            }
        }
        Extraction::Path => Ok(url.path().to_string()),
        Extraction::Verbatim => Ok(raw.to_string()),
    }
}

/// Resolve a derived value against materialized state.
pub fn resolve_value(value: &DerivedValue, state: &MaterializedState) -> Result<String, ResolveError> {
    let raw = state.read(&value.source)?;
    resolve(raw, value.extract)
}

impl ResourceDescriptor {
    /// Return a copy of this descriptor with every derived property replaced by
    /// its concrete text value. The owners of those values become explicit
    /// `depends_on` entries, so the copy has the same references.
    pub fn resolved(&self, state: &MaterializedState) -> Result<ResourceDescriptor, ResolveError> {
        let mut out = self.clone();
        for value in out.properties.values_mut() {
            if let PropertyValue::Derived(derived) = value {
                let owner = &derived.source.owner;
                if !out.depends_on.contains(owner) {
                    out.depends_on.push(owner.clone());
                }
                *value = PropertyValue::Text(resolve_value(derived, state)?);
            }
        }
        Ok(out)
    }
}
