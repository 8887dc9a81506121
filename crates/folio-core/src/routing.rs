//! Path-based routing rules and request forwarding policies.
//!
//! A [`RoutingRule`] binds a [`PathPattern`] to a target resource by logical
//! name. Patterns are a literal prefix with an optional trailing `*`; the
//! catch-all pattern is a bare `*`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// HTTP methods a rule accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unknown HTTP method '{}'", other)),
        }
    }
}

/// Error returned when a path pattern is not well formed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// A literal path prefix with an optional trailing wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    literal: String,
    wildcard: bool,
}

impl PathPattern {
    /// Parse a pattern such as `/fortune`, `/photo*` or `*`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let err = |reason: &str| PatternError {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let (literal, wildcard) = match raw.strip_suffix('*') {
            Some(prefix) => (prefix, true),
            None => (raw, false),
        };

        if literal.contains('*') {
            return Err(err("'*' is only allowed as the final character"));
        }
        if literal.is_empty() && !wildcard {
            return Err(err("pattern is empty"));
        }
        if !literal.is_empty() && !literal.starts_with('/') {
            return Err(err("pattern must start with '/'"));
        }
        if literal.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(err("pattern contains whitespace or control characters"));
        }

        // Every request path starts with '/', so `/*` and `*` match the same
        // paths and are stored as the same pattern.
        let literal = if wildcard && literal == "/" { "" } else { literal };

        Ok(Self {
            literal: literal.to_string(),
            wildcard,
        })
    }

    /// The catch-all pattern `*`.
    pub fn any() -> Self {
        Self {
            literal: String::new(),
            wildcard: true,
        }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_catch_all(&self) -> bool {
        self.wildcard && self.literal.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.wildcard {
            path.starts_with(&self.literal)
        } else {
            path == self.literal
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)?;
        if self.wildcard {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PathPattern::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        value.to_string()
    }
}

/// Which named values of one category (headers, query strings, cookies) are
/// forwarded to an origin.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "names", rename_all = "snake_case")]
pub enum ValueAllowList {
    #[default]
    None,
    All,
    Only(BTreeSet<String>),
    AllExcept(BTreeSet<String>),
}

impl ValueAllowList {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ValueAllowList::Only(names.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect())
    }

    pub fn all_except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ValueAllowList::AllExcept(
            names.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect(),
        )
    }

    /// Whether a value with this name reaches the origin. Names compare
    /// case-insensitively.
    pub fn forwards(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        match self {
            ValueAllowList::None => false,
            ValueAllowList::All => true,
            ValueAllowList::Only(names) => names.contains(&name),
            ValueAllowList::AllExcept(names) => !names.contains(&name),
        }
    }
}

/// Explicit forwarding allow-lists for a routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForwardingPolicy {
    #[serde(default)]
    pub headers: ValueAllowList,
    #[serde(default)]
    pub query_strings: ValueAllowList,
    #[serde(default)]
    pub cookies: ValueAllowList,
}

impl ForwardingPolicy {
    /// Forward nothing. Suitable for static object origins.
    pub fn none() -> Self {
        Self::default()
    }

    /// Forward every viewer header except `Host`, plus all query strings and
    /// cookies. Required when the origin is another HTTP endpoint that
    /// virtual-hosts on its own host name.
    pub fn all_viewer_except_host() -> Self {
        Self {
            headers: ValueAllowList::all_except(["host"]),
            query_strings: ValueAllowList::All,
            cookies: ValueAllowList::All,
        }
    }

    pub fn forwards_host_header(&self) -> bool {
        self.headers.forwards("host")
    }
}

/// A path-pattern-to-target binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub pattern: PathPattern,

    /// Logical name of the resource requests are routed to.
    pub target: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub methods: BTreeSet<HttpMethod>,

    #[serde(default)]
    pub forwarding: ForwardingPolicy,

    /// Marks the root/default behavior of a resource.
    #[serde(default)]
    pub is_default: bool,
}

impl RoutingRule {
    pub fn new(pattern: PathPattern, target: impl Into<String>) -> Self {
        Self {
            pattern,
            target: target.into(),
            methods: BTreeSet::new(),
            forwarding: ForwardingPolicy::none(),
            is_default: false,
        }
    }

    /// A default rule matching every path.
    pub fn catch_all(target: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::new(PathPattern::any(), target)
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn with_forwarding(mut self, forwarding: ForwardingPolicy) -> Self {
        self.forwarding = forwarding;
        self
    }

    /// True when this rule accepts the method. An empty set accepts any method.
    pub fn accepts(&self, method: HttpMethod) -> bool {
        self.methods.is_empty() || self.methods.contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_patterns() {
        let p = PathPattern::parse("/photo*").unwrap();
        assert_eq!(p.literal(), "/photo");
        assert!(p.is_wildcard());
        assert!(p.matches("/photo"));
        assert!(p.matches("/photo/large"));
        assert!(!p.matches("/fortune"));
        assert_eq!(p.to_string(), "/photo*");
    }

    #[test]
    fn exact_patterns_match_only_themselves() {
        let p = PathPattern::parse("/fortune").unwrap();
        assert!(p.matches("/fortune"));
        assert!(!p.matches("/fortune/today"));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(PathPattern::parse("").is_err());
        assert!(PathPattern::parse("fortune").is_err());
        assert!(PathPattern::parse("/a*/b").is_err());
        assert!(PathPattern::parse("/a b").is_err());
    }

    #[test]
    fn catch_all_patterns() {
        assert!(PathPattern::any().is_catch_all());
        assert!(PathPattern::parse("/*").unwrap().is_catch_all());
        assert!(PathPattern::any().matches("/anything"));
        assert_eq!(PathPattern::parse("/*").unwrap(), PathPattern::any());
        assert_eq!(PathPattern::parse("/*").unwrap().to_string(), "*");
    }

    #[test]
    fn host_header_policy() {
        let policy = ForwardingPolicy::all_viewer_except_host();
        assert!(!policy.forwards_host_header());
        assert!(policy.headers.forwards("Authorization"));

        let leaky = ForwardingPolicy {
            headers: ValueAllowList::only(["Host", "Accept"]),
            ..ForwardingPolicy::none()
        };
        assert!(leaky.forwards_host_header());
    }

    #[test]
    fn pattern_serializes_as_string() {
        let rule = RoutingRule::new(PathPattern::parse("/fortune*").unwrap(), "HttpApi")
            .with_methods([HttpMethod::Get]);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["pattern"], "/fortune*");
        assert_eq!(json["methods"], serde_json::json!(["GET"]));

        let back: RoutingRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
