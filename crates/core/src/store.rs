//! Key-value storage for translations and progress.
//!
//! Stores are plain values: build one at startup and hand it to whatever
//! needs it. Writes to the same key are last-write-wins.

use crate::error::Result;
use crate::model::{Record, Translation, UserProgress};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

/// Snapshot of everything a store holds, for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub translations_count: usize,
    pub progress_count: usize,
    pub translations: Vec<Translation>,
    pub progress: Vec<UserProgress>,
}

/// Async key-value store.
/// Patterns are either an exact key or a literal prefix ending in `*`.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: Record) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Record>>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Keys matching `pattern`, in ascending order.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Record>>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.get(key).await?);
        }
        Ok(out)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let keys = self.keys("*").await?;
        let mut stats = StoreStats::default();
        for record in self.mget(&keys).await?.into_iter().flatten() {
            match record {
                Record::Translation(t) => stats.translations.push(t),
                Record::Progress(p) => stats.progress.push(p),
            }
        }
        stats.translations_count = stats.translations.len();
        stats.progress_count = stats.progress.len();
        Ok(stats)
    }
}

/// Whether `key` matches a store pattern.
pub fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

fn matching_keys(map: &BTreeMap<String, Record>, pattern: &str) -> Vec<String> {
    map.keys()
        .filter(|k| matches_pattern(pattern, k))
        .cloned()
        .collect()
}

/// Process-local store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: Record) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Record>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(matching_keys(&records, pattern))
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.clear();
        Ok(())
    }
}

/// Store persisted as one JSON object on disk.
/// Every write rewrites the file through a temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Record>> {
        trace!("load path={}", self.path.display());
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, records: &BTreeMap<String, Record>) -> Result<()> {
        trace!("save path={} records={}", self.path.display(), records.len());
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!("saved store to {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, Record>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load()?;
        f(&mut records);
        self.save(&records)
    }

    fn read(&self) -> Result<BTreeMap<String, Record>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn set(&self, key: &str, value: Record) -> Result<()> {
        self.update(|records| {
            records.insert(key.to_string(), value);
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.read()?.remove(key))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Record>>> {
        let records = self.read()?;
        Ok(keys.iter().map(|k| records.get(k).cloned()).collect())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.update(|records| {
            records.remove(key);
        })
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(matching_keys(&self.read()?, pattern))
    }

    async fn clear(&self) -> Result<()> {
        self.update(|records| records.clear())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("store.json");
    path.with_file_name(format!("{file_name}.tmp"))
}
