use crate::error::CacheError;
use crate::models::CorpusResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifies one cached corpus: which directory, extracted by which routines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub directory: PathBuf,
    pub routine: String,
}

impl CacheKey {
    pub fn new(directory: impl Into<PathBuf>, routine: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            routine: routine.into(),
        }
    }

    /// Flat string form handed to stores
    pub fn storage_key(&self) -> String {
        format!("{}|{}", self.routine, self.directory.display())
    }
}

/// A stored corpus and when it was computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Storage key the entry was written under
    pub key: String,
    /// Unix seconds at creation
    pub created_at: u64,
    pub corpus: CorpusResult,
}

/// Key-value storage behind the corpus cache
///
/// Concurrent writers for the same key race; the last write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
