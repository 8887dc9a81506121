//! The portfolio stack.
//!
//! Six resources: a private bucket for the static site, a private bucket for
//! the photo, the backend function, its HTTP gateway, the CDN distribution in
//! front of both, and the step that uploads the site bundle and invalidates
//! the CDN cache.

use crate::bundle::{self, BundleError};
use folio_core::{
    AccessLevel, Extraction, FolioConfig, GeneratedAttribute, HttpMethod, PropertyValue,
    ResourceDescriptor, ResourceKind, StackOutput,
};
use folio_policy::{
    Consumer, RuleError, api_behavior, gateway_routes, grant_for, static_behavior, validate_stack,
};
use std::time::Duration;
use thiserror::Error;

pub const FRONTEND_BUCKET: &str = "FrontendBucket";
pub const PHOTO_BUCKET: &str = "PhotoBucket";
pub const BACKEND_FN: &str = "BackendFn";
pub const HTTP_API: &str = "HttpApi";
pub const SITE_DISTRIBUTION: &str = "SiteDistribution";
pub const DEPLOY_FRONTEND: &str = "DeployFrontend";

#[derive(Debug, Error)]
pub enum StackError {
    #[error("frontend bundle: {0}")]
    Bundle(#[from] BundleError),

    #[error("stack rule violated: {0}")]
    Rule(#[from] RuleError),
}

/// Descriptors in declaration order plus the outputs reported after apply.
#[derive(Debug, Clone)]
pub struct Stack {
    pub descriptors: Vec<ResourceDescriptor>,
    pub outputs: Vec<StackOutput>,
}

impl Stack {
    pub fn descriptor(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }
}

fn list<I, S>(items: I) -> PropertyValue
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    PropertyValue::List(items.into_iter().map(|s| s.to_string()).collect())
}

fn bucket(name: &str, retain: bool) -> ResourceDescriptor {
    ResourceDescriptor::new(name, ResourceKind::Storage)
        .with_property("encryption", "s3_managed")
        .with_property("block_public_access", true)
        .with_property("removal_policy", if retain { "retain" } else { "destroy" })
        .with_property("auto_delete_objects", !retain)
}

/// Values reported after apply: the CDN host, the site URL, the gateway
/// endpoint and the photo bucket name.
pub fn stack_outputs() -> Vec<StackOutput> {
    vec![
        StackOutput::new(
            "CdnHost",
            "Host name of the CDN distribution",
            GeneratedAttribute::new(SITE_DISTRIBUTION, "domain_name").verbatim(),
        ),
        StackOutput::new(
            "FrontendUrl",
            "Public URL of the site",
            GeneratedAttribute::new(SITE_DISTRIBUTION, "url").verbatim(),
        ),
        StackOutput::new(
            "ApiEndpoint",
            "Invocation base of the HTTP gateway",
            GeneratedAttribute::new(HTTP_API, "api_endpoint").verbatim(),
        ),
        StackOutput::new(
            "PhotoBucketName",
            "Name of the bucket holding the photo",
            GeneratedAttribute::new(PHOTO_BUCKET, "bucket_name").verbatim(),
        ),
    ]
}

/// Build the portfolio stack for `config`.
///
/// Fingerprints the frontend bundle, so `config.frontend.dist_dir` must
/// exist and contain the built site.
pub fn portfolio_stack(config: &FolioConfig) -> Result<Stack, StackError> {
    let fingerprint = bundle::fingerprint(&config.frontend.dist_dir)?;

    let frontend_bucket = bucket(FRONTEND_BUCKET, false);
    let photo_bucket = bucket(PHOTO_BUCKET, config.photo.retain_on_delete);

    let backend = &config.backend;
    let function_base = ResourceDescriptor::new(BACKEND_FN, ResourceKind::Compute);
    let photo_grant = grant_for(
        &photo_bucket,
        Consumer::Compute {
            descriptor: &function_base,
            needs: AccessLevel::Read,
        },
    )?;
    let function = function_base
        .with_property("function_name", format!("{}-backend", config.project))
        .with_property("runtime", backend.runtime.as_str())
        .with_property("handler", backend.handler.as_str())
        .with_property("architecture", backend.architecture.as_str())
        .with_property("memory_mb", backend.memory_mb)
        .with_property("timeout", Duration::from_secs(backend.timeout_secs))
        .with_property(
            "env.PHOTO_BUCKET",
            GeneratedAttribute::new(PHOTO_BUCKET, "bucket_name").verbatim(),
        )
        .with_property("env.PHOTO_KEY", config.photo.key.as_str())
        .with_property("env.PHOTO_URL_TTL_SECS", config.photo.url_ttl_secs.to_string())
        .with_grant(photo_grant);

    let routes: Vec<(&str, Vec<HttpMethod>)> = backend
        .routes
        .iter()
        .map(|r| (r.path.as_str(), r.methods.clone()))
        .collect();
    let cors = &backend.cors;
    let api = ResourceDescriptor::new(HTTP_API, ResourceKind::Routing)
        .with_property("name", format!("{}-api", config.project))
        .with_property("protocol_type", "HTTP")
        .with_property("cors.allow_origins", list(&cors.allow_origins))
        .with_property("cors.allow_methods", list(&cors.allow_methods))
        .with_property("cors.allow_headers", list(&cors.allow_headers))
        .with_routes(gateway_routes(&function, &routes)?);

    let edge_base = ResourceDescriptor::new(SITE_DISTRIBUTION, ResourceKind::Edge);
    let oai_grant = grant_for(
        &frontend_bucket,
        Consumer::OriginAccessIdentity { edge: &edge_base },
    )?;
    let mut behaviors = vec![static_behavior(&frontend_bucket)?];
    for route in &backend.routes {
        behaviors.push(api_behavior(&format!("{}*", route.path), &api)?);
    }
    let edge = edge_base
        .with_property("default_root_object", config.frontend.index_document.as_str())
        .with_property("price_class", config.edge.price_class.as_str())
        .with_property("static_ttl", Duration::from_secs(config.edge.static_ttl_secs))
        .with_property(
            format!("origin.{}.domain_name", HTTP_API),
            GeneratedAttribute::new(HTTP_API, "api_endpoint").derive(Extraction::Host),
        )
        .with_routes(behaviors)
        .with_grant(oai_grant);

    let deploy_base = ResourceDescriptor::new(DEPLOY_FRONTEND, ResourceKind::Deployment);
    let deploy_grant = grant_for(
        &frontend_bucket,
        Consumer::Deployment {
            descriptor: &deploy_base,
        },
    )?;
    let deploy = deploy_base
        .depends_on(FRONTEND_BUCKET)
        .depends_on(SITE_DISTRIBUTION)
        .with_property(
            "source_dir",
            config.frontend.dist_dir.to_string_lossy().into_owned(),
        )
        .with_property("content_hash", fingerprint.digest.as_str())
        .with_property("file_count", fingerprint.files as i64)
        .with_property(
            "destination_bucket",
            GeneratedAttribute::new(FRONTEND_BUCKET, "bucket_name").verbatim(),
        )
        .with_property(
            "distribution_id",
            GeneratedAttribute::new(SITE_DISTRIBUTION, "distribution_id").verbatim(),
        )
        .with_property("invalidation_paths", list(&config.edge.invalidation_paths))
        .with_grant(deploy_grant);

    let descriptors = vec![frontend_bucket, photo_bucket, function, api, edge, deploy];
    validate_stack(&descriptors)?;

    let outputs = stack_outputs();

    tracing::info!(
        project = %config.project,
        resources = descriptors.len(),
        bundle_files = fingerprint.files,
        "portfolio stack defined"
    );
    Ok(Stack {
        descriptors,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ValueAllowList;
    use tempfile::TempDir;

    fn config(dist: &TempDir) -> FolioConfig {
        std::fs::write(dist.path().join("index.html"), "<h1>portfolio</h1>").unwrap();
        let yaml = format!(
            "photo:\n  key: me.jpg\nfrontend:\n  dist_dir: {}\n",
            dist.path().display()
        );
        FolioConfig::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn declares_six_resources_in_order() {
        let dist = TempDir::new().unwrap();
        let stack = portfolio_stack(&config(&dist)).unwrap();
        let names: Vec<_> = stack.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                FRONTEND_BUCKET,
                PHOTO_BUCKET,
                BACKEND_FN,
                HTTP_API,
                SITE_DISTRIBUTION,
                DEPLOY_FRONTEND
            ]
        );
        assert_eq!(stack.outputs.len(), 4);
    }

    #[test]
    fn function_reads_photo_bucket_by_generated_name() {
        let dist = TempDir::new().unwrap();
        let stack = portfolio_stack(&config(&dist)).unwrap();
        let function = stack.descriptor(BACKEND_FN).unwrap();

        let bucket = function.property("env.PHOTO_BUCKET").unwrap().as_derived().unwrap();
        assert_eq!(bucket.source, GeneratedAttribute::new(PHOTO_BUCKET, "bucket_name"));
        assert_eq!(
            function.property("env.PHOTO_KEY").unwrap().as_text(),
            Some("me.jpg")
        );
        assert_eq!(function.grants.len(), 1);
        assert_eq!(function.grants[0].level, AccessLevel::Read);
    }

    #[test]
    fn distribution_uses_gateway_host_and_never_forwards_host() {
        let dist = TempDir::new().unwrap();
        let stack = portfolio_stack(&config(&dist)).unwrap();
        let edge = stack.descriptor(SITE_DISTRIBUTION).unwrap();

        let origin = edge
            .property("origin.HttpApi.domain_name")
            .unwrap()
            .as_derived()
            .unwrap();
        assert_eq!(origin.extract, Extraction::Host);

        let api_rules: Vec<_> = edge.routes.iter().filter(|r| r.target == HTTP_API).collect();
        assert_eq!(api_rules.len(), 2);
        for rule in api_rules {
            assert!(!rule.forwarding.forwards_host_header());
            assert_eq!(rule.forwarding.query_strings, ValueAllowList::All);
        }
        assert_eq!(edge.routes.iter().filter(|r| r.is_default).count(), 1);
    }

    #[test]
    fn deployment_follows_bucket_and_distribution() {
        let dist = TempDir::new().unwrap();
        let stack = portfolio_stack(&config(&dist)).unwrap();
        let deploy = stack.descriptor(DEPLOY_FRONTEND).unwrap();
        let refs = deploy.references();
        assert!(refs.contains(&FRONTEND_BUCKET));
        assert!(refs.contains(&SITE_DISTRIBUTION));
        assert_eq!(
            deploy.property("invalidation_paths"),
            Some(&PropertyValue::List(vec!["/*".to_string()]))
        );
    }

    #[test]
    fn missing_bundle_is_reported() {
        let mut cfg = FolioConfig::from_yaml("photo:\n  key: me.jpg\n").unwrap();
        cfg.frontend.dist_dir = "/nonexistent/folio/dist".into();
        let err = portfolio_stack(&cfg).unwrap_err();
        assert!(matches!(err, StackError::Bundle(BundleError::Missing(_))));
    }
}
