//! Object storage abstraction used by the engine.
//!
//! `S3Transport` is the production implementation; tests substitute an
//! in-memory store.

use crate::error::DeployResult;
use async_trait::async_trait;

/// One object from a bucket listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    /// ETag exactly as the store reported it (usually quoted).
    pub e_tag: String,
}

/// One page of a bucket listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    /// Token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

/// Minimal object storage operations needed to deploy an archive.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Downloads an object in full, optionally pinned to a version.
    ///
    /// Fails with `TooLarge` when the object exceeds `max_bytes`.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
        max_bytes: u64,
    ) -> DeployResult<Vec<u8>>;

    /// Lists one page of objects, continuing from `continuation_token`.
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> DeployResult<ObjectPage>;

    /// Stores an object with an explicit content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> DeployResult<()>;
}
