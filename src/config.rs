use crate::error::ExtractError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from evidex.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// What to do when one file in a corpus fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Directory used when the caller names none
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_exclude_pattern")]
    pub exclude_pattern: String,
    #[serde(default)]
    pub on_error: OnError,
}

fn default_workers() -> usize {
    4
}

fn default_exclude_pattern() -> String {
    "store".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            directory: None,
            workers: default_workers(),
            exclude_pattern: default_exclude_pattern(),
            on_error: OnError::Abort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_executable")]
    pub executable: String,
    /// Tesseract language code, e.g. "eng"
    #[serde(default)]
    pub language: Option<String>,
}

fn default_ocr_executable() -> String {
    "tesseract".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            executable: default_ocr_executable(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_pdf_executable")]
    pub executable: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_page_workers")]
    pub page_workers: usize,
}

fn default_pdf_executable() -> String {
    "pdftoppm".to_string()
}

fn default_dpi() -> u32 {
    crate::file::types::pdf::DEFAULT_DPI
}

fn default_page_workers() -> usize {
    2
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            executable: default_pdf_executable(),
            dpi: default_dpi(),
            page_workers: default_page_workers(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Disk,
    Memory,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_cache_directory")]
    pub directory: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_directory() -> String {
    "~/.cache/evidex".to_string()
}

fn default_ttl_secs() -> u64 {
    crate::cache::DEFAULT_TTL.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Disk,
            directory: default_cache_directory(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Cache directory with `~` and environment variables expanded
    pub fn directory_path(&self) -> PathBuf {
        expand_path(&self.directory)
    }
}

/// Expand `~` and `$VARS`; falls back to the raw string when expansion fails
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists, or
    /// return defaults
    pub fn load() -> Result<Self> {
        let default_paths = [
            PathBuf::from("config/evidex.toml"),
            PathBuf::from("./evidex.toml"),
            expand_path("~/.config/evidex/settings.toml"),
        ];

        for path in &default_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Reject settings that would stall or disable extraction
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.extraction.workers == 0 {
            return Err(ExtractError::Config("extraction.workers must be at least 1".to_string()));
        }
        if self.pdf.page_workers == 0 {
            return Err(ExtractError::Config("pdf.page_workers must be at least 1".to_string()));
        }
        if self.pdf.dpi == 0 {
            return Err(ExtractError::Config("pdf.dpi must be positive".to_string()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ExtractError::Config("cache.ttl_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Configured default directory, expanded
    pub fn default_directory(&self) -> Option<PathBuf> {
        self.extraction.directory.as_deref().map(expand_path)
    }
}
