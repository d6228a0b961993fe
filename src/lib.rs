pub mod cache;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod error;
pub mod file;
pub mod logging;
pub mod models;
pub mod ocr;
pub mod table;

pub use cache::{CacheStore, CorpusCache};
pub use classifier::FileTypeClassifier;
pub use config::Config;
pub use corpus::{ContentExtractor, ExtractionSettings, FailurePolicy};
pub use error::{CacheError, ExtractError};
pub use file::{ExtractorSet, TextExtractor};
pub use models::{CorpusResult, DocumentRef, ExtractedText, FileTypeTag};
pub use ocr::{OcrEngine, PdfRasterizer};
