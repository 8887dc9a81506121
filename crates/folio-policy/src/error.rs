//! Rule error types.
//!
//! Errors carry a [`RuleErrorKind`] for programmatic matching and a message
//! naming the offending resource and pattern.

use std::fmt;

/// Error type for routing and permission rule failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    /// The kind of rule error.
    pub kind: RuleErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl RuleError {
    /// Create a new rule error.
    pub fn new(kind: RuleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // ROUTING ERRORS
    // =========================================================================

    /// Two rules on one resource share a path pattern.
    pub fn duplicate_routing_pattern(resource: &str, pattern: &str) -> Self {
        Self::new(
            RuleErrorKind::DuplicateRoutingPattern,
            format!(
                "Resource '{}' declares path pattern '{}' more than once",
                resource, pattern
            ),
        )
    }

    /// A gateway declares the same route path twice.
    pub fn duplicate_route(resource: &str, path: &str) -> Self {
        Self::new(
            RuleErrorKind::DuplicateRoute,
            format!("Gateway route '{}' to '{}' is declared more than once", path, resource),
        )
    }

    /// No rule on the resource is marked as the default behavior.
    pub fn missing_default_behavior(resource: &str) -> Self {
        Self::new(
            RuleErrorKind::MissingDefaultBehavior,
            format!("Resource '{}' has no default behavior", resource),
        )
    }

    /// More than one rule is marked as the default behavior.
    pub fn multiple_default_behaviors(resource: &str, count: usize) -> Self {
        Self::new(
            RuleErrorKind::MultipleDefaultBehaviors,
            format!(
                "Resource '{}' has {} default behaviors; exactly one is required",
                resource, count
            ),
        )
    }

    /// A rule forwards the Host header to a second HTTP hop.
    pub fn host_header_forwarded(resource: &str, pattern: &str, target: &str) -> Self {
        Self::new(
            RuleErrorKind::HostHeaderForwarded,
            format!(
                "Rule '{}' on '{}' forwards the Host header to '{}', which serves its own host name",
                pattern, resource, target
            ),
        )
    }

    /// A path pattern did not parse.
    pub fn invalid_pattern(resource: &str, reason: &str) -> Self {
        Self::new(
            RuleErrorKind::InvalidPattern,
            format!("Resource '{}': {}", resource, reason),
        )
    }

    /// A rule's target is not part of the stack.
    pub fn unknown_target(resource: &str, target: &str) -> Self {
        Self::new(
            RuleErrorKind::UnknownTarget,
            format!("Resource '{}' routes to unknown resource '{}'", resource, target),
        )
    }

    // =========================================================================
    // KIND ERRORS
    // =========================================================================

    /// A resource of the wrong kind was passed to a builder.
    pub fn wrong_kind(resource: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            RuleErrorKind::WrongKind,
            format!(
                "Resource '{}' is a {} resource; expected {}",
                resource, actual, expected
            ),
        )
    }

    // =========================================================================
    // PERMISSION ERRORS
    // =========================================================================

    /// A grant is broader than the consumer requires.
    pub fn grant_too_broad(bucket: &str, principal: &str, level: &str, allowed: &str) -> Self {
        Self::new(
            RuleErrorKind::GrantTooBroad,
            format!(
                "Grant of {} on '{}' to '{}' exceeds the {} access this consumer may hold",
                level, bucket, principal, allowed
            ),
        )
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuleError {}

/// Categories of rule errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleErrorKind {
    // =========================================================================
    // Routing errors
    // =========================================================================
    /// Two rules on one resource share a pattern.
    DuplicateRoutingPattern,
    /// A gateway route path is declared twice.
    DuplicateRoute,
    /// No default behavior.
    MissingDefaultBehavior,
    /// More than one default behavior.
    MultipleDefaultBehaviors,
    /// Host header forwarded to a second HTTP hop.
    HostHeaderForwarded,
    /// Pattern did not parse.
    InvalidPattern,
    /// Rule targets a resource outside the stack.
    UnknownTarget,

    // =========================================================================
    // Kind errors
    // =========================================================================
    /// Builder input is the wrong resource kind.
    WrongKind,

    // =========================================================================
    // Permission errors
    // =========================================================================
    /// Grant exceeds what the consumer needs.
    GrantTooBroad,
}
