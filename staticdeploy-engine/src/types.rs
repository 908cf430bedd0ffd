//! Shared types for deployment operations.

use crate::error::{DeployError, DeployResult};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::str::FromStr;

/// Identifies the archive object in the source bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
    pub bucket: String,
    pub key: String,
    /// Immutable object version. `None` resolves to the latest version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SourceLocator {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        version: Option<String>,
    ) -> DeployResult<Self> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() {
            return Err(DeployError::Format("source bucket must not be empty".into()));
        }
        if key.is_empty() {
            return Err(DeployError::Format("source key must not be empty".into()));
        }
        Ok(Self {
            bucket,
            key,
            version,
        })
    }

    /// Parses `"<bucket>/<key...>"`, splitting on the first `/` only.
    pub fn parse(source: &str, version: Option<String>) -> DeployResult<Self> {
        match source.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Self::new(bucket, key, version)
            }
            _ => Err(DeployError::Format(format!(
                "invalid source {source:?}, expected \"bucket/key\""
            ))),
        }
    }

    /// Returns a copy pinned to the given version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl FromStr for SourceLocator {
    type Err = DeployError;

    fn from_str(s: &str) -> DeployResult<Self> {
        Self::parse(s, None)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One file inside an archive. `name` is used verbatim as the object key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.data)
    }
}

/// Lowercase hex MD5 digest of an object's content.
///
/// The empty fingerprint marks an object that is no longer present.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(data: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(data)))
    }

    /// Builds a fingerprint from a storage ETag, dropping the quoting S3
    /// wraps around it.
    pub fn from_etag(etag: &str) -> Self {
        let unescaped = etag.replace("&quot;", "\"");
        Self(unescaped.trim().trim_matches('"').to_ascii_lowercase())
    }

    pub fn absent() -> Self {
        Self(String::new())
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object name to fingerprint mapping for an archive or a bucket listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintSet(BTreeMap<String, Fingerprint>);

impl FingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fingerprint, returning the previous one for that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        fingerprint: Fingerprint,
    ) -> Option<Fingerprint> {
        self.0.insert(name.into(), fingerprint)
    }

    pub fn get(&self, name: &str) -> Option<&Fingerprint> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Fingerprint> {
        self.0.iter()
    }
}

impl FromIterator<(String, Fingerprint)> for FingerprintSet {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FingerprintSet {
    type Item = (String, Fingerprint);
    type IntoIter = btree_map::IntoIter<String, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FingerprintSet {
    type Item = (&'a String, &'a Fingerprint);
    type IntoIter = btree_map::Iter<'a, String, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether a deploy re-uploads every entry or only the ones whose content
/// differs from the target bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPolicy {
    #[default]
    ForceAll,
    SkipUnchanged,
}

/// What was deployed where, as last observed. Persisted by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub source: SourceLocator,
    pub target_bucket: String,
    pub fingerprints: FingerprintSet,
    pub deployed_at: DateTime<Utc>,
}

/// A single divergence from a recorded fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drift {
    /// Content differs from what was recorded.
    Changed {
        name: String,
        recorded: Fingerprint,
        current: Fingerprint,
    },
    /// Object is no longer present.
    Missing { name: String, recorded: Fingerprint },
}

impl Drift {
    pub fn name(&self) -> &str {
        match self {
            Drift::Changed { name, .. } | Drift::Missing { name, .. } => name,
        }
    }
}

/// Outcome of a drift check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Updated fingerprint set, to be persisted in place of the prior one.
    pub fingerprints: FingerprintSet,
    /// Recorded names whose source content changed or disappeared.
    pub source_drift: Vec<Drift>,
    /// Recorded names whose target object was modified or removed.
    #[serde(default)]
    pub target_drift: Vec<Drift>,
    /// Names present in the source archive but not in the recorded set.
    #[serde(default)]
    pub untracked: Vec<String>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.source_drift.is_empty() || !self.target_drift.is_empty()
    }

    pub fn into_fingerprints(self) -> FingerprintSet {
        self.fingerprints
    }
}
