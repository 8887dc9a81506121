//! Storage permission grants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level on a storage bucket. Ordered from narrowest to broadest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    ReadWrite,
}

impl AccessLevel {
    /// Object-store actions implied by this level.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            AccessLevel::Read => &["s3:GetObject"],
            AccessLevel::ReadWrite => &[
                "s3:GetObject",
                "s3:ListBucket",
                "s3:PutObject",
                "s3:DeleteObject",
            ],
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Read => f.write_str("read"),
            AccessLevel::ReadWrite => f.write_str("read_write"),
        }
    }
}

/// Grants `principal` the given level of access to `bucket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Logical name of the storage resource.
    pub bucket: String,
    /// Logical name (or identity) receiving access.
    pub principal: String,
    pub level: AccessLevel,
}

impl PermissionGrant {
    pub fn new(bucket: impl Into<String>, principal: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            bucket: bucket.into(),
            principal: principal.into(),
            level,
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        self.level.actions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_narrower_than_read_write() {
        assert!(AccessLevel::Read < AccessLevel::ReadWrite);
        assert_eq!(AccessLevel::Read.actions(), &["s3:GetObject"]);
        assert!(!AccessLevel::Read.actions().contains(&"s3:PutObject"));
        assert!(AccessLevel::ReadWrite.actions().contains(&"s3:PutObject"));
    }
}
