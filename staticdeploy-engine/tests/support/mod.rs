//! Shared test helpers: an in-memory object store and ZIP builders.
#![allow(dead_code)]

use async_trait::async_trait;
use staticdeploy_engine::store::{ObjectPage, ObjectStore, ObjectSummary};
use staticdeploy_engine::{DeployError, DeployResult, Fingerprint, SourceLocator};
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const SOURCE_BUCKET: &str = "artifacts";
pub const TARGET_BUCKET: &str = "website";

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub version_id: String,
    pub data: Vec<u8>,
    pub content_type: String,
}

impl StoredObject {
    pub fn e_tag(&self) -> String {
        format!("\"{}\"", Fingerprint::of(&self.data))
    }
}

/// Versioned in-memory bucket store with paged listings and injectable
/// failures.
pub struct MemoryStore {
    /// bucket -> key -> versions, oldest first.
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<StoredObject>>>>,
    page_size: usize,
    next_version: Mutex<u64>,
    fail_put_keys: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
    fail_get: Mutex<bool>,
    /// (bucket, key, content type) for every successful put.
    puts: Mutex<Vec<(String, String, String)>>,
    /// Every version id requested through `get_object`.
    gets: Mutex<Vec<Option<String>>>,
    list_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size,
            next_version: Mutex::new(1),
            fail_put_keys: Mutex::new(HashSet::new()),
            fail_list: Mutex::new(false),
            fail_get: Mutex::new(false),
            puts: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
        }
    }

    /// Stores an object directly, bypassing the put log. Returns its version id.
    pub fn seed(&self, bucket: &str, key: &str, data: Vec<u8>) -> String {
        self.store(bucket, key, data, "application/octet-stream".into())
    }

    fn store(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: String) -> String {
        let version_id = {
            let mut next = self.next_version.lock().unwrap();
            let id = format!("v{next}");
            *next += 1;
            id
        };
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(StoredObject {
                version_id: version_id.clone(),
                data,
                content_type,
            });
        version_id
    }

    pub fn latest(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)?
            .get(key)?
            .last()
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fail_put_for(&self, key: &str) {
        self.fail_put_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    pub fn fail_downloads(&self) {
        *self.fail_get.lock().unwrap() = true;
    }

    pub fn clear_failures(&self) {
        self.fail_put_keys.lock().unwrap().clear();
        *self.fail_list.lock().unwrap() = false;
        *self.fail_get.lock().unwrap() = false;
    }

    pub fn puts(&self) -> Vec<(String, String, String)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.puts().into_iter().map(|(_, key, _)| key).collect()
    }

    pub fn requested_versions(&self) -> Vec<Option<String>> {
        self.gets.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
        max_bytes: u64,
    ) -> DeployResult<Vec<u8>> {
        self.gets.lock().unwrap().push(version.map(str::to_string));
        if *self.fail_get.lock().unwrap() {
            return Err(DeployError::Transfer(format!("simulated outage for {bucket}/{key}")));
        }

        let buckets = self.buckets.lock().unwrap();
        let versions = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| DeployError::Transfer(format!("NoSuchKey: {bucket}/{key}")))?;

        let object = match version {
            Some(id) => versions
                .iter()
                .find(|o| o.version_id == id)
                .ok_or_else(|| DeployError::Transfer(format!("NoSuchVersion: {id}")))?,
            None => versions.last().expect("versions are never empty"),
        };

        if object.data.len() as u64 > max_bytes {
            return Err(DeployError::TooLarge {
                what: format!("{bucket}/{key}"),
                size: object.data.len() as u64,
                limit: max_bytes,
            });
        }
        Ok(object.data.clone())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> DeployResult<ObjectPage> {
        *self.list_calls.lock().unwrap() += 1;
        if *self.fail_list.lock().unwrap() {
            return Err(DeployError::Transfer("simulated AccessDenied".into()));
        }

        let start: usize = continuation_token
            .map(|t| t.parse().expect("tokens are offsets"))
            .unwrap_or(0);

        let buckets = self.buckets.lock().unwrap();
        let all: Vec<ObjectSummary> = buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(|(key, versions)| {
                        versions.last().map(|latest| ObjectSummary {
                            key: key.clone(),
                            e_tag: latest.e_tag(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let end = (start + self.page_size).min(all.len());
        let next_token = (end < all.len()).then(|| end.to_string());
        Ok(ObjectPage {
            objects: all[start.min(end)..end].to_vec(),
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
        if self.fail_put_keys.lock().unwrap().contains(key) {
            return Err(DeployError::Transfer(format!("simulated reset uploading {key}")));
        }
        self.store(bucket, key, body, content_type.to_string());
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), content_type.to_string()));
        Ok(())
    }
}

/// Builds a deflated ZIP archive from `(name, content)` pairs, in order.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Uploads an archive to the source bucket and returns a locator for it
/// (unpinned) plus the version id it was stored under.
pub fn publish_archive(
    store: &MemoryStore,
    key: &str,
    entries: &[(&str, &[u8])],
) -> (SourceLocator, String) {
    let version = store.seed(SOURCE_BUCKET, key, build_zip(entries));
    (SourceLocator::new(SOURCE_BUCKET, key, None).unwrap(), version)
}

pub fn md5_hex(data: &[u8]) -> String {
    Fingerprint::of(data).to_string()
}
