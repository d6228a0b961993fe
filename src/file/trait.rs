use crate::models::DocumentRef;
use anyhow::Result;
use async_trait::async_trait;

/// One extraction routine per file type
///
/// Routines return best-effort text. An `Err` is reserved for documents that
/// cannot be decoded at all (missing tool, corrupt file).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the recoverable text of a document
    async fn extract(&self, doc: &DocumentRef) -> Result<String>;

    /// Routine identity, part of the cache key
    fn name(&self) -> &'static str;
}
