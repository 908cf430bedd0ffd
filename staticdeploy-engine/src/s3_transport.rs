//! S3 download, listing, and upload operations.
//!
//! The client is built once from `DeployConfig`. Retries are left to the
//! SDK's retry config (one attempt by default); the engine never retries.

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};
use crate::store::{ObjectPage, ObjectStore, ObjectSummary};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};
use tracing::debug;

/// S3-backed object store.
#[derive(Clone, Debug)]
pub struct S3Transport {
    client: S3Client,
}

impl S3Transport {
    /// Wraps an already configured client.
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Builds an S3 client from the deployment config.
    pub async fn from_config(config: &DeployConfig) -> DeployResult<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_types::region::Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts));

        if let Some(ref creds) = config.credentials {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "staticdeploy-static",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(ref endpoint) = config.endpoint_override {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::new(S3Client::from_conf(builder.build())))
    }
}

#[async_trait]
impl ObjectStore for S3Transport {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
        max_bytes: u64,
    ) -> DeployResult<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                DeployError::Transfer(format!(
                    "download failed for s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let declared = resp.content_length().unwrap_or(0).max(0) as u64;
        if declared > max_bytes {
            return Err(DeployError::TooLarge {
                what: format!("s3://{bucket}/{key}"),
                size: declared,
                limit: max_bytes,
            });
        }

        let mut body = resp.body;
        let mut bytes = Vec::with_capacity(declared as usize);
        while let Some(chunk) = body.try_next().await.map_err(|e| {
            DeployError::Transfer(format!("failed to read body of s3://{bucket}/{key}: {e}"))
        })? {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(DeployError::TooLarge {
                    what: format!("s3://{bucket}/{key}"),
                    size,
                    limit: max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(
            "downloaded {} bytes from s3://{bucket}/{key} (version {})",
            bytes.len(),
            version.unwrap_or("latest")
        );
        Ok(bytes)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> DeployResult<ObjectPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                DeployError::Transfer(format!(
                    "list failed for s3://{bucket}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let objects: Vec<ObjectSummary> = resp
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectSummary {
                    key: obj.key()?.to_string(),
                    e_tag: obj.e_tag().unwrap_or_default().to_string(),
                })
            })
            .collect();

        let next_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!("listed {} objects in s3://{bucket}", objects.len());
        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> DeployResult<()> {
        let size = body.len();
        let content_md5 = BASE64.encode(Md5::digest(&body));

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_md5(content_md5)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                DeployError::Transfer(format!(
                    "upload failed for s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("uploaded {size} bytes to s3://{bucket}/{key} as {content_type}");
        Ok(())
    }
}
