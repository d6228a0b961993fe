use thiserror::Error;

/// Errors surfaced by classification and corpus extraction.
///
/// Every per-file variant carries the offending file name.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The content signature matches no supported file type
    #[error("Unsupported file type: {file} ({mime})")]
    UnsupportedType { file: String, mime: String },

    /// A decoder, OCR or workbook failure for a specific file
    #[error("Failed to extract {file}: {source:#}")]
    Extraction {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    /// The file could not be read
    #[error("Failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("Failed to walk {dir}: {source}")]
    Walk {
        dir: String,
        #[source]
        source: walkdir::Error,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    /// Name of the file this error is about, if any
    pub fn file(&self) -> Option<&str> {
        match self {
            ExtractError::UnsupportedType { file, .. }
            | ExtractError::Extraction { file, .. }
            | ExtractError::Io { file, .. } => Some(file),
            ExtractError::Walk { .. } | ExtractError::Config(_) => None,
        }
    }
}

/// Cache read/write failures. Recovered locally, never returned to callers of
/// the corpus entry point.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("Cache entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
