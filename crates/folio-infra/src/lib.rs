//! Folio Infrastructure Definition
//!
//! The portfolio site expressed as resource descriptors: two buckets, a
//! backend function behind an HTTP gateway, a CDN distribution in front of
//! both, and a deployment step for the static bundle.

pub mod bundle;
pub mod stack;

pub use bundle::{BundleError, BundleFingerprint, fingerprint};
pub use stack::{
    BACKEND_FN, DEPLOY_FRONTEND, FRONTEND_BUCKET, HTTP_API, PHOTO_BUCKET, SITE_DISTRIBUTION, Stack,
    StackError, portfolio_stack, stack_outputs,
};
