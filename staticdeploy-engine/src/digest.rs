//! Content fingerprints for archives and target buckets.

use crate::archive::ArchiveReader;
use crate::error::{DeployError, DeployResult};
use crate::store::ObjectStore;
use crate::types::{Fingerprint, FingerprintSet};
use tracing::{debug, warn};

/// Fingerprints every file entry of an archive.
///
/// Aborts on the first entry that cannot be read. When a name occurs more
/// than once, the entry later in the central directory wins.
pub fn digest_archive(reader: &mut ArchiveReader) -> DeployResult<FingerprintSet> {
    let mut fingerprints = FingerprintSet::new();

    for index in 0..reader.len() {
        let Some(entry) = reader.read_entry(index)? else {
            continue;
        };
        let fingerprint = entry.fingerprint();
        if fingerprints.insert(entry.name.clone(), fingerprint).is_some() {
            warn!("archive contains {} more than once, keeping the last copy", entry.name);
        }
    }

    debug!("digested {} archive entries", fingerprints.len());
    Ok(fingerprints)
}

/// Fingerprints every object in `bucket` from its listed ETag, following
/// continuation tokens until the listing is exhausted.
pub async fn digest_target_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
) -> DeployResult<FingerprintSet> {
    let mut fingerprints = FingerprintSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store
            .list_objects(bucket, token.as_deref())
            .await
            .map_err(|e| DeployError::Listing {
                bucket: bucket.to_string(),
                reason: e.to_string(),
            })?;
        pages += 1;

        for object in page.objects {
            fingerprints.insert(object.key, Fingerprint::from_etag(&object.e_tag));
        }

        match page.next_token {
            Some(next) if token.as_deref() != Some(next.as_str()) => token = Some(next),
            Some(next) => {
                return Err(DeployError::Listing {
                    bucket: bucket.to_string(),
                    reason: format!("continuation token {next:?} repeated"),
                });
            }
            None => break,
        }
    }

    debug!(
        "digested {} objects in bucket {bucket} across {pages} page(s)",
        fingerprints.len()
    );
    Ok(fingerprints)
}
