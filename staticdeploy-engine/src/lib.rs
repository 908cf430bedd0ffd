//! Static file deployment engine.
//!
//! Reconciles a target S3 bucket with the contents of a (versioned) ZIP
//! archive stored in a source bucket:
//! - Archive fetch with optional version pinning and size ceilings
//! - Content fingerprints (hex MD5) for archive entries and bucket objects
//! - Upload with per-object content types, forced or skip-unchanged
//! - Read-only drift checks against a previously recorded fingerprint set
//! - An explicit deployment lifecycle (`absent`, `deployed`, `drifted`)

pub mod archive;
pub mod config;
pub mod content_type;
pub mod digest;
pub mod error;
pub mod lifecycle;
pub mod s3_transport;
pub mod store;
pub mod sync_engine;
pub mod types;

pub use config::DeployConfig;
pub use error::{DeployError, DeployResult};
pub use lifecycle::DeploymentStatus;
pub use store::ObjectStore;
pub use sync_engine::DeploymentEngine;
pub use types::*;
