//! Storage permission grants.
//!
//! Grants are always the narrowest level the consumer needs: an origin access
//! identity only ever reads, a deployment reads and writes, and a compute
//! resource gets exactly the level it asks for.

use crate::error::RuleError;
use folio_core::{AccessLevel, PermissionGrant, ResourceDescriptor, ResourceKind};

/// Who is asking for access to a bucket.
#[derive(Debug, Clone, Copy)]
pub enum Consumer<'a> {
    /// A function that needs `needs` access.
    Compute {
        descriptor: &'a ResourceDescriptor,
        needs: AccessLevel,
    },
    /// The origin access identity of an edge distribution.
    OriginAccessIdentity { edge: &'a ResourceDescriptor },
    /// A deployment step that uploads objects.
    Deployment { descriptor: &'a ResourceDescriptor },
}

impl Consumer<'_> {
    fn descriptor(&self) -> &ResourceDescriptor {
        match self {
            Consumer::Compute { descriptor, .. } => descriptor,
            Consumer::OriginAccessIdentity { edge } => edge,
            Consumer::Deployment { descriptor } => descriptor,
        }
    }

    fn expected_kind(&self) -> ResourceKind {
        match self {
            Consumer::Compute { .. } => ResourceKind::Compute,
            Consumer::OriginAccessIdentity { .. } => ResourceKind::Edge,
            Consumer::Deployment { .. } => ResourceKind::Deployment,
        }
    }

    fn principal(&self) -> String {
        match self {
            Consumer::OriginAccessIdentity { edge } => origin_access_identity(&edge.name),
            other => other.descriptor().name.clone(),
        }
    }

    fn level(&self) -> AccessLevel {
        match self {
            Consumer::Compute { needs, .. } => *needs,
            Consumer::OriginAccessIdentity { .. } => AccessLevel::Read,
            Consumer::Deployment { .. } => AccessLevel::ReadWrite,
        }
    }
}

/// Principal name of an edge resource's origin access identity.
pub fn origin_access_identity(edge: &str) -> String {
    format!("{}/origin-access-identity", edge)
}

/// The minimal grant on `storage` for `consumer`.
pub fn grant_for(storage: &ResourceDescriptor, consumer: Consumer<'_>) -> Result<PermissionGrant, RuleError> {
    if storage.kind != ResourceKind::Storage {
        return Err(RuleError::wrong_kind(
            &storage.name,
            &ResourceKind::Storage.to_string(),
            &storage.kind.to_string(),
        ));
    }
    let descriptor = consumer.descriptor();
    let expected = consumer.expected_kind();
    if descriptor.kind != expected {
        return Err(RuleError::wrong_kind(
            &descriptor.name,
            &expected.to_string(),
            &descriptor.kind.to_string(),
        ));
    }

    let grant = PermissionGrant::new(&storage.name, consumer.principal(), consumer.level());
    tracing::debug!(
        bucket = %grant.bucket,
        principal = %grant.principal,
        level = %grant.level,
        "granted storage access"
    );
    Ok(grant)
}

/// Broadest level a consumer of `kind` may hold.
pub fn max_level_for(kind: ResourceKind) -> Option<AccessLevel> {
    match kind {
        ResourceKind::Edge => Some(AccessLevel::Read),
        ResourceKind::Compute | ResourceKind::Deployment => Some(AccessLevel::ReadWrite),
        ResourceKind::Storage | ResourceKind::Routing => None,
    }
}

/// Check that every grant carried by `holder` targets storage and does not
/// exceed what a consumer of its kind may hold.
pub fn validate_grants<F>(holder: &ResourceDescriptor, kind_of: F) -> Result<(), RuleError>
where
    F: Fn(&str) -> Option<ResourceKind>,
{
    for grant in &holder.grants {
        match kind_of(&grant.bucket) {
            Some(ResourceKind::Storage) => {}
            Some(other) => {
                return Err(RuleError::wrong_kind(
                    &grant.bucket,
                    &ResourceKind::Storage.to_string(),
                    &other.to_string(),
                ));
            }
            None => return Err(RuleError::unknown_target(&holder.name, &grant.bucket)),
        }

        let allowed = max_level_for(holder.kind);
        if allowed.is_none_or(|max| grant.level > max) {
            let allowed = allowed.map(|l| l.to_string()).unwrap_or_else(|| "no".to_string());
            return Err(RuleError::grant_too_broad(
                &grant.bucket,
                &grant.principal,
                &grant.level.to_string(),
                &allowed,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleErrorKind;

    fn photos() -> ResourceDescriptor {
        ResourceDescriptor::new("PhotoBucket", ResourceKind::Storage)
    }

    #[test]
    fn compute_gets_exactly_what_it_needs() {
        let f = ResourceDescriptor::new("BackendFn", ResourceKind::Compute);
        let grant = grant_for(
            &photos(),
            Consumer::Compute {
                descriptor: &f,
                needs: AccessLevel::Read,
            },
        )
        .unwrap();
        assert_eq!(grant.level, AccessLevel::Read);
        assert_eq!(grant.principal, "BackendFn");
        assert_eq!(grant.actions(), &["s3:GetObject"]);
    }

    #[test]
    fn origin_identity_is_read_only() {
        let cdn = ResourceDescriptor::new("Cdn", ResourceKind::Edge);
        let grant = grant_for(&photos(), Consumer::OriginAccessIdentity { edge: &cdn }).unwrap();
        assert_eq!(grant.level, AccessLevel::Read);
        assert_eq!(grant.principal, "Cdn/origin-access-identity");
    }

    #[test]
    fn deployment_reads_and_writes() {
        let deploy = ResourceDescriptor::new("DeployFrontend", ResourceKind::Deployment);
        let grant = grant_for(&photos(), Consumer::Deployment { descriptor: &deploy }).unwrap();
        assert_eq!(grant.level, AccessLevel::ReadWrite);
    }

    #[test]
    fn rejects_non_storage_buckets_and_mismatched_consumers() {
        let f = ResourceDescriptor::new("BackendFn", ResourceKind::Compute);
        let err = grant_for(
            &f,
            Consumer::Compute {
                descriptor: &f,
                needs: AccessLevel::Read,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, RuleErrorKind::WrongKind);

        let err = grant_for(&photos(), Consumer::OriginAccessIdentity { edge: &f }).unwrap_err();
        assert_eq!(err.kind, RuleErrorKind::WrongKind);
    }

    #[test]
    fn edge_grants_cannot_write() {
        let cdn = ResourceDescriptor::new("Cdn", ResourceKind::Edge).with_grant(PermissionGrant::new(
            "PhotoBucket",
            origin_access_identity("Cdn"),
            AccessLevel::ReadWrite,
        ));
        let kinds = |name: &str| (name == "PhotoBucket").then_some(ResourceKind::Storage);
        let err = validate_grants(&cdn, kinds).unwrap_err();
        assert_eq!(err.kind, RuleErrorKind::GrantTooBroad);
    }
}
