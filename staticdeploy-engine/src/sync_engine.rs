//! Deployment orchestrator.
//!
//! Ties together:
//! - Archive retrieval (`ArchiveFetcher`)
//! - Content fingerprints (`digest`)
//! - Per-entry upload with resolved content types
//! - Read-only drift checks against a recorded fingerprint set
//!
//! Every operation is a single attempt. A failed deploy leaves whatever was
//! uploaded before the failure in the target bucket.

use crate::archive::{ArchiveFetcher, ArchiveReader};
use crate::config::{ArchiveLimits, DeployConfig};
use crate::content_type::ContentTypeResolver;
use crate::digest::{digest_archive, digest_target_bucket};
use crate::error::{DeployError, DeployResult};
use crate::store::ObjectStore;
use crate::types::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Deploys archives to target buckets and checks them for drift.
pub struct DeploymentEngine {
    store: Arc<dyn ObjectStore>,
    fetcher: ArchiveFetcher,
    content_types: ContentTypeResolver,
    policy: UploadPolicy,
    verify_target: bool,
}

impl DeploymentEngine {
    pub fn new(store: Arc<dyn ObjectStore>, config: &DeployConfig) -> Self {
        Self {
            fetcher: ArchiveFetcher::new(Arc::clone(&store), config.limits),
            store,
            content_types: ContentTypeResolver::with_overrides(&config.content_type_overrides),
            policy: config.upload_policy,
            verify_target: config.verify_target,
        }
    }

    /// Engine with default limits, forced uploads, and target verification.
    pub fn with_defaults(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(store, &DeployConfig::default())
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: ArchiveLimits) -> Self {
        self.fetcher = ArchiveFetcher::new(Arc::clone(&self.store), limits);
        self
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Fetches and opens the archive named by `locator`.
    pub async fn fetch_archive(&self, locator: &SourceLocator) -> DeployResult<ArchiveReader> {
        self.fetcher.fetch(locator).await
    }

    /// Fingerprints of the archive named by `locator`.
    pub async fn source_fingerprints(
        &self,
        locator: &SourceLocator,
    ) -> DeployResult<FingerprintSet> {
        let mut archive = self.fetch_archive(locator).await?;
        digest_archive(&mut archive)
    }

    /// Fingerprints of the objects currently in `bucket`.
    pub async fn target_fingerprints(&self, bucket: &str) -> DeployResult<FingerprintSet> {
        digest_target_bucket(self.store.as_ref(), bucket).await
    }

    /// Uploads every entry of the archive to `target_bucket` and returns the
    /// archive's fingerprints.
    ///
    /// Under `UploadPolicy::SkipUnchanged` the target is listed first and
    /// entries whose fingerprint already matches are not re-uploaded.
    pub async fn deploy(
        &self,
        locator: &SourceLocator,
        target_bucket: &str,
    ) -> DeployResult<FingerprintSet> {
        let mut archive = self.fetch_archive(locator).await?;

        let existing = match self.policy {
            UploadPolicy::ForceAll => None,
            UploadPolicy::SkipUnchanged => Some(self.target_fingerprints(target_bucket).await?),
        };

        let mut fingerprints = FingerprintSet::new();
        let mut uploaded = 0usize;
        let mut skipped = 0usize;

        for index in 0..archive.len() {
            let Some(entry) = archive.read_entry(index)? else {
                continue;
            };

            let fingerprint = entry.fingerprint();
            if fingerprints.insert(entry.name.clone(), fingerprint.clone()).is_some() {
                warn!("archive contains {} more than once, keeping the last copy", entry.name);
            }

            if existing
                .as_ref()
                .and_then(|target| target.get(&entry.name))
                .is_some_and(|current| *current == fingerprint)
            {
                debug!("skipping unchanged {}", entry.name);
                skipped += 1;
                continue;
            }

            self.upload_entry(target_bucket, entry).await?;
            uploaded += 1;
        }

        info!(
            "deployed {locator} to {target_bucket}: {uploaded} uploaded, {skipped} unchanged"
        );
        Ok(fingerprints)
    }

    async fn upload_entry(&self, target_bucket: &str, entry: ArchiveEntry) -> DeployResult<()> {
        let content_type = self.content_types.resolve(&entry.name, &entry.data);
        let ArchiveEntry { name, data } = entry;

        self.store
            .put_object(target_bucket, &name, data, &content_type)
            .await
            .map_err(|e| DeployError::Upload {
                entry: name.clone(),
                reason: e.to_string(),
            })
    }

    /// Re-evaluates the recorded fingerprints against the current source
    /// archive (and the target bucket, when verification is enabled).
    ///
    /// Only names in `prior` are re-evaluated. A drifted name takes the
    /// source fingerprint, or the absent fingerprint when the source no
    /// longer has it. A name already recorded as absent is not reported
    /// again, and its leftover target object is ignored. Never writes to
    /// the target.
    pub async fn check_drift(
        &self,
        locator: &SourceLocator,
        target_bucket: &str,
        prior: &FingerprintSet,
    ) -> DeployResult<DriftReport> {
        let source = self.source_fingerprints(locator).await?;
        let target = if self.verify_target {
            Some(self.target_fingerprints(target_bucket).await?)
        } else {
            None
        };

        let mut report = DriftReport::default();

        for (name, recorded) in prior {
            match source.get(name) {
                Some(current) if current == recorded => {
                    report.fingerprints.insert(name.clone(), recorded.clone());
                }
                Some(current) => {
                    report.fingerprints.insert(name.clone(), current.clone());
                    report.source_drift.push(Drift::Changed {
                        name: name.clone(),
                        recorded: recorded.clone(),
                        current: current.clone(),
                    });
                }
                None => {
                    report.fingerprints.insert(name.clone(), Fingerprint::absent());
                    // Already recorded as gone: nothing new to report.
                    if !recorded.is_absent() {
                        report.source_drift.push(Drift::Missing {
                            name: name.clone(),
                            recorded: recorded.clone(),
                        });
                    }
                }
            }

            // Objects whose entry left the source stay in the target untracked.
            if recorded.is_absent() {
                continue;
            }

            if let Some(ref target) = target {
                match target.get(name) {
                    Some(current) if current == recorded => {}
                    Some(current) => report.target_drift.push(Drift::Changed {
                        name: name.clone(),
                        recorded: recorded.clone(),
                        current: current.clone(),
                    }),
                    None => report.target_drift.push(Drift::Missing {
                        name: name.clone(),
                        recorded: recorded.clone(),
                    }),
                }
            }
        }

        report.untracked = source
            .names()
            .filter(|name| !prior.contains(name))
            .map(str::to_string)
            .collect();

        if report.has_drift() {
            warn!(
                "{target_bucket} drifted from {locator}: {} source, {} target",
                report.source_drift.len(),
                report.target_drift.len()
            );
        } else {
            debug!("{target_bucket} matches {locator}");
        }
        Ok(report)
    }
}
