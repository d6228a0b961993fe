//! Directory-level extraction.
//!
//! [`ContentExtractor`] walks a directory, classifies every file by content,
//! runs the matching routine and collects the results into a
//! [`CorpusResult`]. Files are processed by a bounded number of workers but
//! results are merged in traversal order on a single task.

use crate::cache::{CacheKey, CorpusCache, DiskStore, MemoryStore};
use crate::classifier::FileTypeClassifier;
use crate::config::{CacheBackend, Config, OnError};
use crate::error::ExtractError;
use crate::file::ExtractorSet;
use crate::models::{CorpusResult, DocumentRef};
use crate::ocr::{PdftoppmRasterizer, TesseractOcr};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How a corpus run reacts to a file that cannot be classified or extracted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure (in traversal order) and return it
    #[default]
    Abort,
    /// Record the failure in the corpus and keep going
    SkipAndReport,
}

impl From<OnError> for FailurePolicy {
    fn from(on_error: OnError) -> Self {
        match on_error {
            OnError::Abort => FailurePolicy::Abort,
            OnError::Skip => FailurePolicy::SkipAndReport,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Files extracted concurrently
    pub workers: usize,
    /// Case-insensitive substring of the relative path that excludes a file.
    /// Empty disables the filter.
    pub exclude_pattern: String,
    pub failure_policy: FailurePolicy,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            exclude_pattern: "store".to_string(),
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl ExtractionSettings {
    fn is_excluded(&self, relative: &Path) -> bool {
        if self.exclude_pattern.is_empty() {
            return false;
        }
        relative
            .to_string_lossy()
            .to_lowercase()
            .contains(&self.exclude_pattern.to_lowercase())
    }
}

/// Turns a directory of mixed documents into text
pub struct ContentExtractor {
    directory: Option<PathBuf>,
    classifier: FileTypeClassifier,
    routines: ExtractorSet,
    settings: ExtractionSettings,
    cache: Option<CorpusCache>,
}

impl ContentExtractor {
    pub fn new(directory: Option<PathBuf>, routines: ExtractorSet, settings: ExtractionSettings) -> Self {
        Self {
            directory,
            classifier: FileTypeClassifier::new(),
            routines,
            settings,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: CorpusCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build an extractor with the command-line OCR tools and the cache
    /// backend named in the config
    pub fn from_config(config: &Config) -> Result<Self, ExtractError> {
        config.validate()?;

        let ocr = TesseractOcr::new()
            .with_executable(config.ocr.executable.clone())
            .with_language(config.ocr.language.clone());
        let rasterizer = PdftoppmRasterizer::new().with_executable(config.pdf.executable.clone());
        let routines = ExtractorSet::standard(
            Arc::new(ocr),
            Arc::new(rasterizer),
            config.pdf.dpi,
            config.pdf.page_workers,
        );

        let settings = ExtractionSettings {
            workers: config.extraction.workers,
            exclude_pattern: config.extraction.exclude_pattern.clone(),
            failure_policy: config.extraction.on_error.into(),
        };

        let extractor = Self::new(config.default_directory(), routines, settings);

        let ttl = Duration::from_secs(config.cache.ttl_secs);
        let extractor = match config.cache.backend {
            CacheBackend::Disk => extractor.with_cache(
                CorpusCache::new(Arc::new(DiskStore::new(config.cache.directory_path()))).with_ttl(ttl),
            ),
            CacheBackend::Memory => {
                extractor.with_cache(CorpusCache::new(Arc::new(MemoryStore::new())).with_ttl(ttl))
            }
            CacheBackend::None => extractor,
        };

        Ok(extractor)
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&CorpusCache> {
        self.cache.as_ref()
    }

    /// Cached corpus for `directory`, or for the configured directory when
    /// none is given
    pub async fn get_all_docs_as_text(&self, directory: Option<&Path>) -> Result<CorpusResult, ExtractError> {
        let dir = directory
            .map(Path::to_path_buf)
            .or_else(|| self.directory.clone())
            .ok_or_else(|| ExtractError::Config("No directory given and none configured".to_string()))?;

        let resolved = dir.canonicalize().map_err(|source| ExtractError::Io {
            file: dir.display().to_string(),
            source,
        })?;

        match &self.cache {
            Some(cache) => {
                let key = CacheKey::new(resolved.clone(), self.cache_identity());
                cache.get_or_compute(&key, || self.extract_corpus(&resolved)).await
            }
            None => self.extract_corpus(&resolved).await,
        }
    }

    /// Anything that changes the output for a directory belongs in the key
    fn cache_identity(&self) -> String {
        format!(
            "{};exclude={};policy={:?}",
            self.routines.identity(),
            self.settings.exclude_pattern.to_lowercase(),
            self.settings.failure_policy
        )
    }

    /// Extract every eligible file under `dir`, bypassing the cache
    pub async fn extract_corpus(&self, dir: &Path) -> Result<CorpusResult, ExtractError> {
        let documents = collect_documents(dir, &self.settings)?;
        info!(directory = %dir.display(), files = documents.len(), "Extracting corpus");

        let workers = self.settings.workers.max(1);
        let mut results = stream::iter(documents)
            .map(|doc| async move {
                let result = self.extract_document(&doc).await;
                (doc, result)
            })
            .buffered(workers);

        let mut corpus = CorpusResult::new();
        while let Some((doc, result)) = results.next().await {
            match result {
                Ok(text) => {
                    corpus.insert(doc.name, text);
                }
                Err(e) => match self.settings.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::SkipAndReport => {
                        warn!(file = %doc.name, error = %e, "Skipping file");
                        corpus.record_failure(doc.name, e.to_string());
                    }
                },
            }
        }

        info!(
            directory = %dir.display(),
            documents = corpus.len(),
            failures = corpus.failures().len(),
            "Corpus extracted"
        );
        Ok(corpus)
    }

    /// Classify then extract one file. Every error names the file by its
    /// corpus key.
    pub async fn extract_document(&self, doc: &DocumentRef) -> Result<String, ExtractError> {
        info!(file = %doc.name, "Extracting");

        let classifier = self.classifier;
        let path = doc.path.clone();
        let tag = tokio::task::spawn_blocking(move || classifier.classify(&path))
            .await
            .map_err(|e| ExtractError::Extraction {
                file: doc.name.clone(),
                source: anyhow::Error::new(e),
            })?
            .map_err(|e| match e {
                ExtractError::UnsupportedType { mime, .. } => ExtractError::UnsupportedType {
                    file: doc.name.clone(),
                    mime,
                },
                ExtractError::Io { source, .. } => ExtractError::Io {
                    file: doc.name.clone(),
                    source,
                },
                other => other,
            })?;

        let routine = self.routines.get(tag).ok_or_else(|| ExtractError::UnsupportedType {
            file: doc.name.clone(),
            mime: format!("{} (no routine registered)", tag),
        })?;

        let text = routine
            .extract(doc)
            .await
            .map_err(|source| ExtractError::Extraction {
                file: doc.name.clone(),
                source,
            })?;

        info!(file = %doc.name, file_type = %tag, routine = routine.name(), chars = text.len(), "Extracted");
        Ok(text)
    }
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("directory", &self.directory)
            .field("routines", &self.routines)
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Files under `root` in traversal order, minus excluded paths. A name seen
/// twice is keyed by its path relative to `root` from the second time on.
fn collect_documents(root: &Path, settings: &ExtractionSettings) -> Result<Vec<DocumentRef>, ExtractError> {
    if !root.is_dir() {
        return Err(ExtractError::Io {
            file: root.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut documents = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ExtractError::Walk {
            dir: root.display().to_string(),
            source,
        })?;
        let path = entry.path();
        // Follows symlinks, so linked evidence files are kept
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if settings.is_excluded(relative) {
            debug!(path = %relative.display(), "Excluded");
            continue;
        }

        let mut doc = DocumentRef::from_path(path);
        if !seen.insert(doc.name.clone()) {
            let key = relative.display().to_string();
            warn!(file = %doc.name, key = %key, "Duplicate file name, keying by relative path");
            seen.insert(key.clone());
            doc.name = key;
        }
        documents.push(doc);
    }

    Ok(documents)
}
