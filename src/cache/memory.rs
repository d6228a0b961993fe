use super::store::{CacheEntry, CacheStore};
use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store; entries vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
