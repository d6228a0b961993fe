use super::store::{CacheEntry, CacheStore};
use crate::error::CacheError;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// One JSON file per key under a cache directory
///
/// File names are the blake3 hash of the storage key. Writes go to a temporary
/// file in the same directory and are renamed into place, so readers never see
/// a partial entry.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.dir.join(format!("{}.json", hash.to_hex()))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        // Hash collisions are not worth trusting
        if entry.key != key {
            debug!(path = %path.display(), "cache file belongs to another key");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(entry)?;
        let dir = self.dir.clone();
        let target = self.path_for(key);

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Unavailable(std::io::Error::other(e)))?
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}
