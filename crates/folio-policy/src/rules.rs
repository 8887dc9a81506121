//! Routing rule construction and validation.
//!
//! Gateways get one rule per explicit route plus a catch-all default, all
//! bound to the same compute resource. Edge distributions get a default
//! behavior for static content and path-pattern behaviors for the API.

use crate::error::RuleError;
use folio_core::{
    ForwardingPolicy, HttpMethod, PathPattern, ResourceDescriptor, ResourceKind, RoutingRule,
};
use std::collections::{BTreeSet, HashSet};

fn expect_kind(descriptor: &ResourceDescriptor, kind: ResourceKind) -> Result<(), RuleError> {
    if descriptor.kind != kind {
        return Err(RuleError::wrong_kind(
            &descriptor.name,
            &kind.to_string(),
            &descriptor.kind.to_string(),
        ));
    }
    Ok(())
}

/// Build gateway rules: one per `(path, methods)` tuple plus a default
/// catch-all, all targeting `compute`. A route that is itself a catch-all
/// duplicates the default and is rejected.
pub fn gateway_routes<P: AsRef<str>>(
    compute: &ResourceDescriptor,
    routes: &[(P, Vec<HttpMethod>)],
) -> Result<Vec<RoutingRule>, RuleError> {
    expect_kind(compute, ResourceKind::Compute)?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(routes.len() + 1);
    for (path, methods) in routes {
        let path = path.as_ref();
        let pattern = PathPattern::parse(path)
            .map_err(|e| RuleError::invalid_pattern(&compute.name, &e.to_string()))?;
        if pattern.is_catch_all() || !seen.insert(pattern.clone()) {
            return Err(RuleError::duplicate_route(&compute.name, path));
        }
        rules.push(RoutingRule::new(pattern, &compute.name).with_methods(methods.iter().copied()));
    }
    rules.push(RoutingRule::catch_all(&compute.name));

    tracing::debug!(target_fn = %compute.name, rules = rules.len(), "built gateway routes");
    Ok(rules)
}

/// Default edge behavior: serve static objects from `bucket` through the
/// distribution's origin access identity. Nothing is forwarded.
pub fn static_behavior(bucket: &ResourceDescriptor) -> Result<RoutingRule, RuleError> {
    expect_kind(bucket, ResourceKind::Storage)?;
    Ok(RoutingRule::catch_all(&bucket.name)
        .with_methods([HttpMethod::Get, HttpMethod::Head])
        .with_forwarding(ForwardingPolicy::none()))
}

/// Path-pattern edge behavior forwarding matching requests to `gateway`.
///
/// The gateway virtual-hosts on its own generated host name, so every viewer
/// header except `Host` is forwarded.
pub fn api_behavior(
    pattern: &str,
    gateway: &ResourceDescriptor,
) -> Result<RoutingRule, RuleError> {
    expect_kind(gateway, ResourceKind::Routing)?;
    let pattern = PathPattern::parse(pattern)
        .map_err(|e| RuleError::invalid_pattern(&gateway.name, &e.to_string()))?;
    Ok(RoutingRule::new(pattern, &gateway.name)
        .with_methods([
            HttpMethod::Get,
            HttpMethod::Head,
            HttpMethod::Options,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Post,
            HttpMethod::Delete,
        ])
        .with_forwarding(ForwardingPolicy::all_viewer_except_host()))
}

/// Validate the rules attached to `resource`:
///
/// 1. exactly one rule is the default behavior,
/// 2. no two rules share a pattern,
/// 3. every target is known (via `kind_of`),
/// 4. no rule forwards `Host` to a second HTTP hop.
pub fn validate_behaviors<F>(resource: &ResourceDescriptor, kind_of: F) -> Result<(), RuleError>
where
    F: Fn(&str) -> Option<ResourceKind>,
{
    let defaults = resource.routes.iter().filter(|r| r.is_default).count();
    match defaults {
        0 => return Err(RuleError::missing_default_behavior(&resource.name)),
        1 => {}
        n => return Err(RuleError::multiple_default_behaviors(&resource.name, n)),
    }

    let mut seen: BTreeSet<&PathPattern> = BTreeSet::new();
    for rule in &resource.routes {
        if !seen.insert(&rule.pattern) {
            return Err(RuleError::duplicate_routing_pattern(
                &resource.name,
                &rule.pattern.to_string(),
            ));
        }

        let target_kind = kind_of(&rule.target)
            .ok_or_else(|| RuleError::unknown_target(&resource.name, &rule.target))?;

        if target_kind.is_http_hop() && rule.forwarding.forwards_host_header() {
            return Err(RuleError::host_header_forwarded(
                &resource.name,
                &rule.pattern.to_string(),
                &rule.target,
            ));
        }
    }

    Ok(())
}

/// Pick the rule serving `path`: the matching non-default rule with the
/// longest literal prefix (an exact pattern beats a wildcard of the same
/// literal), falling back to the default behavior.
pub fn select_rule<'a>(
    rules: &'a [RoutingRule],
    path: &str,
    method: HttpMethod,
) -> Option<&'a RoutingRule> {
    rules
        .iter()
        .filter(|r| !r.is_default && r.pattern.matches(path) && r.accepts(method))
        .max_by_key(|r| (r.pattern.literal().len(), !r.pattern.is_wildcard()))
        .or_else(|| rules.iter().find(|r| r.is_default && r.accepts(method)))
}
