use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mailnav_core_types::PracticeRecord;

use crate::errors::CacheError;

/// Durable mirror layout. Field names match what earlier builds wrote so
/// existing cache files keep loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCache {
    pub practice_cache: BTreeMap<String, PracticeRecord>,
    /// Epoch milliseconds of the last successful full scrape.
    pub cache_timestamp: i64,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<PersistedCache>, CacheError>;

    async fn save(&self, cache: &PersistedCache) -> Result<(), CacheError>;
}

/// JSON file store. Saves write to a sibling temp file and rename into
/// place so a crash mid-write cannot truncate the mirror.
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self) -> Result<Option<PersistedCache>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted cache yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let cache = serde_json::from_slice(&bytes)?;
        Ok(Some(cache))
    }

    async fn save(&self, cache: &PersistedCache) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(cache)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = cache.practice_cache.len(), "persisted cache");
        Ok(())
    }
}

/// Keeps the mirror in memory; tests and dry runs.
#[derive(Default)]
pub struct MemoryCacheStore {
    inner: Mutex<Option<PersistedCache>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(cache: PersistedCache) -> Self {
        Self {
            inner: Mutex::new(Some(cache)),
        }
    }

    pub fn contents(&self) -> Option<PersistedCache> {
        self.inner.lock().clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> Result<Option<PersistedCache>, CacheError> {
        Ok(self.inner.lock().clone())
    }

    async fn save(&self, cache: &PersistedCache) -> Result<(), CacheError> {
        *self.inner.lock() = Some(cache.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use mailnav_core_types::{PracticeId, PracticeRecord, SecondaryCode};

    fn sample() -> PersistedCache {
        let mut record = PracticeRecord::new(
            PracticeId::parse("A12345").unwrap(),
            "Oak Clinic",
            Utc::now(),
        );
        record.secondary_code = SecondaryCode::Value("CDB9".into());
        let mut practice_cache = BTreeMap::new();
        practice_cache.insert(record.cache_key(), record);
        PersistedCache {
            practice_cache,
            cache_timestamp: Utc::now().timestamp_millis(),
        }
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCacheStore::new(dir.path().join("practice-cache.json"));
        assert!(store.load().await.unwrap().is_none());

        let cache = sample();
        store.save(&cache).await.expect("save");
        let loaded = store.load().await.unwrap().expect("persisted cache");
        assert_eq!(loaded.cache_timestamp, cache.cache_timestamp);
        assert_eq!(
            loaded.practice_cache["Oak Clinic (A12345)"].secondary_code,
            SecondaryCode::Value("CDB9".into())
        );
        assert!(
            !dir.path().join("practice-cache.tmp").exists(),
            "temp file renamed away"
        );
    }

    #[tokio::test]
    async fn file_store_save_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCacheStore::new(dir.path().join("practice-cache.json"));
        store.save(&sample()).await.unwrap();
        let empty = PersistedCache {
            practice_cache: BTreeMap::new(),
            cache_timestamp: 7,
        };
        store.save(&empty).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.cache_timestamp, 7);
        assert!(loaded.practice_cache.is_empty());
    }
}
