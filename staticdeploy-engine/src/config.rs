//! Deployment engine configuration.

use crate::error::{DeployError, DeployResult};
use crate::types::UploadPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the deployment engine and its S3 transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// AWS region for S3.
    pub region: String,

    /// Optional S3 endpoint override (MinIO, LocalStack). Enables path-style
    /// addressing.
    pub endpoint_override: Option<String>,

    /// Static credentials. When absent, the default AWS provider chain is used.
    pub credentials: Option<StaticCredentials>,

    /// Attempts per S3 request, including the first. 1 disables SDK retries.
    pub max_attempts: u32,

    pub limits: ArchiveLimits,

    pub upload_policy: UploadPolicy,

    /// Whether drift checks also list the target bucket.
    pub verify_target: bool,

    /// Extension (without dot) to MIME type, consulted before the built-in table.
    pub content_type_overrides: BTreeMap<String, String>,
}

/// Access key pair for S3-compatible stores without an AWS provider chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Memory ceilings for archive retrieval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveLimits {
    /// Largest source archive that will be downloaded.
    pub max_archive_bytes: u64,
    /// Largest decompressed size accepted for a single entry.
    pub max_entry_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 512 * 1024 * 1024, // 512 MiB
            max_entry_bytes: 256 * 1024 * 1024,   // 256 MiB
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_override: None,
            credentials: None,
            max_attempts: 1,
            limits: ArchiveLimits::default(),
            upload_policy: UploadPolicy::ForceAll,
            verify_target: true,
            content_type_overrides: BTreeMap::new(),
        }
    }
}

impl DeployConfig {
    /// Creates a config for testing with MinIO.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            endpoint_override: Some("http://localhost:9000".to_string()),
            credentials: Some(StaticCredentials {
                access_key_id: "staticdeploy-test".to_string(),
                secret_access_key: "staticdeploy-test-secret".to_string(),
                session_token: None,
            }),
            ..Self::default()
        }
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> DeployResult<()> {
        if self.region.trim().is_empty() {
            return Err(DeployError::Config("region must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(DeployError::Config("max_attempts must be at least 1".into()));
        }
        if self.limits.max_archive_bytes == 0 || self.limits.max_entry_bytes == 0 {
            return Err(DeployError::Config("size limits must be non-zero".into()));
        }
        if let Some(ref creds) = self.credentials {
            if creds.access_key_id.is_empty() || creds.secret_access_key.is_empty() {
                return Err(DeployError::Config(
                    "static credentials need both an access key id and a secret".into(),
                ));
            }
        }
        for (ext, mime) in &self.content_type_overrides {
            if ext.is_empty() || ext.starts_with('.') || mime.is_empty() {
                return Err(DeployError::Config(format!(
                    "invalid content type override {ext:?} => {mime:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_points_at_minio() {
        let config = DeployConfig::test();
        assert_eq!(config.endpoint_override.as_deref(), Some("http://localhost:9000"));
        assert!(config.validate().is_ok());
    }
}
