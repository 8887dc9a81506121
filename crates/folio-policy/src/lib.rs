//! Folio Routing and Permission Rules
//!
//! Builders for gateway routes, edge behaviors and storage grants, plus the
//! validation every stack passes before it is planned:
//!
//! - every routed resource has exactly one default behavior,
//! - path patterns on one resource are distinct,
//! - the `Host` header never reaches a second HTTP hop,
//! - grants never exceed what the holder's kind may hold.

pub mod error;
pub mod permissions;
pub mod rules;

pub use error::{RuleError, RuleErrorKind};
pub use permissions::{Consumer, grant_for, max_level_for, origin_access_identity, validate_grants};
pub use rules::{api_behavior, gateway_routes, select_rule, static_behavior, validate_behaviors};

use folio_core::{ResourceDescriptor, ResourceKind};
use std::collections::HashMap;

/// Validate routing rules and grants across a whole stack.
///
/// Targets and buckets are looked up among `descriptors`; a name outside the
/// stack is an [`RuleErrorKind::UnknownTarget`].
pub fn validate_stack(descriptors: &[ResourceDescriptor]) -> Result<(), RuleError> {
    let kinds: HashMap<&str, ResourceKind> =
        descriptors.iter().map(|d| (d.name.as_str(), d.kind)).collect();
    let kind_of = |name: &str| kinds.get(name).copied();

    for descriptor in descriptors {
        if !descriptor.routes.is_empty() {
            validate_behaviors(descriptor, kind_of)?;
        }
        validate_grants(descriptor, kind_of)?;
    }

    tracing::debug!(resources = descriptors.len(), "stack rules validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{AccessLevel, HttpMethod};

    #[test]
    fn validates_a_minimal_routed_stack() {
        let bucket = ResourceDescriptor::new("Site", ResourceKind::Storage);
        let func = ResourceDescriptor::new("Fn", ResourceKind::Compute);
        let api = ResourceDescriptor::new("Api", ResourceKind::Routing)
            .with_routes(gateway_routes(&func, &[("/fortune", vec![HttpMethod::Get])]).unwrap());
        let cdn_base = ResourceDescriptor::new("Cdn", ResourceKind::Edge);
        let oai = grant_for(&bucket, Consumer::OriginAccessIdentity { edge: &cdn_base }).unwrap();
        let cdn = cdn_base
            .with_route(static_behavior(&bucket).unwrap())
            .with_route(api_behavior("/fortune*", &api).unwrap())
            .with_grant(oai);

        assert!(validate_stack(&[bucket, func, api, cdn]).is_ok());
    }

    #[test]
    fn unknown_grant_bucket_fails() {
        let func = ResourceDescriptor::new("Fn", ResourceKind::Compute).with_grant(
            folio_core::PermissionGrant::new("Gone", "Fn", AccessLevel::Read),
        );
        let err = validate_stack(&[func]).unwrap_err();
        assert_eq!(err.kind, RuleErrorKind::UnknownTarget);
    }
}
