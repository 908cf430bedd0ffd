//! Archive retrieval and random-access reading.
//!
//! The compressed archive is held in memory (bounded by
//! `ArchiveLimits::max_archive_bytes`); entries are decompressed one at a
//! time on demand, each bounded by `ArchiveLimits::max_entry_bytes`.

use crate::config::ArchiveLimits;
use crate::error::{DeployError, DeployResult};
use crate::store::ObjectStore;
use crate::types::{ArchiveEntry, SourceLocator};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;
use zip::ZipArchive;

/// Upper bound on the buffer reserved up front from an entry's declared size.
const PREALLOC_LIMIT: u64 = 64 * 1024;

/// Downloads source archives from object storage.
pub struct ArchiveFetcher {
    store: Arc<dyn ObjectStore>,
    limits: ArchiveLimits,
}

impl ArchiveFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, limits: ArchiveLimits) -> Self {
        Self { store, limits }
    }

    /// Downloads the archive named by `locator` and opens it.
    pub async fn fetch(&self, locator: &SourceLocator) -> DeployResult<ArchiveReader> {
        let bytes = self
            .store
            .get_object(
                &locator.bucket,
                &locator.key,
                locator.version.as_deref(),
                self.limits.max_archive_bytes,
            )
            .await?;

        debug!("fetched archive {locator} ({} bytes)", bytes.len());
        ArchiveReader::open(bytes, self.limits)
    }
}

/// Random-access view over an in-memory ZIP archive.
pub struct ArchiveReader {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    limits: ArchiveLimits,
}

impl ArchiveReader {
    /// Parses `bytes` as a ZIP archive.
    pub fn open(bytes: Vec<u8>, limits: ArchiveLimits) -> DeployResult<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DeployError::Format(format!("not a valid zip archive: {e}")))?;
        Ok(Self { zip, limits })
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.is_empty()
    }

    /// Entry names in central directory order, directories included.
    pub fn entry_names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_string).collect()
    }

    /// Decompresses the entry at `index`. Returns `None` for directories.
    pub fn read_entry(&mut self, index: usize) -> DeployResult<Option<ArchiveEntry>> {
        let max_entry_bytes = self.limits.max_entry_bytes;
        let mut file = self.zip.by_index(index).map_err(|e| DeployError::EntryRead {
            entry: format!("#{index}"),
            reason: e.to_string(),
        })?;

        let name = file.name().to_string();
        if file.is_dir() {
            return Ok(None);
        }

        let declared = file.size();
        if declared > max_entry_bytes {
            return Err(DeployError::TooLarge {
                what: format!("archive entry {name}"),
                size: declared,
                limit: max_entry_bytes,
            });
        }

        // The declared size comes from the archive itself; cap the read too.
        let mut data = Vec::with_capacity(declared.min(PREALLOC_LIMIT) as usize);
        (&mut file)
            .take(max_entry_bytes + 1)
            .read_to_end(&mut data)
            .map_err(|e| DeployError::EntryRead {
                entry: name.clone(),
                reason: e.to_string(),
            })?;

        if data.len() as u64 > max_entry_bytes {
            return Err(DeployError::TooLarge {
                what: format!("archive entry {name}"),
                size: data.len() as u64,
                limit: max_entry_bytes,
            });
        }

        Ok(Some(ArchiveEntry { name, data }))
    }
}
