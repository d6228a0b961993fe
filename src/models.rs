use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported document types, derived from content rather than file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileTypeTag {
    Pdf,
    Image,
    WordDocument,
    PlainText,
    Spreadsheet,
    Csv,
}

/// Word-processing package media type (docx)
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Spreadsheet package media type (xlsx)
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Legacy spreadsheet media type (xls)
pub const XLS_MIME: &str = "application/vnd.ms-excel";

impl FileTypeTag {
    /// Every supported tag
    pub const ALL: [FileTypeTag; 6] = [
        FileTypeTag::Pdf,
        FileTypeTag::Image,
        FileTypeTag::WordDocument,
        FileTypeTag::PlainText,
        FileTypeTag::Spreadsheet,
        FileTypeTag::Csv,
    ];

    /// Map a sniffed media type to a tag. This table is the single list of
    /// supported formats.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(FileTypeTag::Pdf),
            "image/jpeg" | "image/png" | "image/gif" | "image/tiff" => Some(FileTypeTag::Image),
            DOCX_MIME => Some(FileTypeTag::WordDocument),
            "text/plain" => Some(FileTypeTag::PlainText),
            XLSX_MIME | XLS_MIME => Some(FileTypeTag::Spreadsheet),
            "text/csv" | "application/csv" => Some(FileTypeTag::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileTypeTag::Pdf => "pdf",
            FileTypeTag::Image => "image",
            FileTypeTag::WordDocument => "word_document",
            FileTypeTag::PlainText => "plain_text",
            FileTypeTag::Spreadsheet => "spreadsheet",
            FileTypeTag::Csv => "csv",
        }
    }
}

impl fmt::Display for FileTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file queued for extraction. Content is read on demand; routines never
/// write to the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Full path to the file
    pub path: PathBuf,
    /// Key used in the corpus (bare file name unless it collides)
    pub name: String,
}

impl DocumentRef {
    /// Build a reference keyed by the file's own name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// Text recovered from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub file_name: String,
    pub text: String,
}

/// A file that failed under the skip-and-report policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
}

/// Extracted texts for one directory, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusResult {
    documents: Vec<ExtractedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FileFailure>,
}

impl CorpusResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document. Returns false (and leaves the corpus untouched) when
    /// the name is already present.
    pub fn insert(&mut self, file_name: impl Into<String>, text: impl Into<String>) -> bool {
        let file_name = file_name.into();
        if self.contains(&file_name) {
            return false;
        }
        self.documents.push(ExtractedText {
            file_name,
            text: text.into(),
        });
        true
    }

    pub fn record_failure(&mut self, file_name: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(FileFailure {
            file_name: file_name.into(),
            reason: reason.into(),
        });
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.file_name == file_name)
            .map(|d| d.text.as_str())
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.documents.iter().any(|d| d.file_name == file_name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedText> {
        self.documents.iter()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.file_name.as_str()).collect()
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_table() {
        assert_eq!(FileTypeTag::from_mime("application/pdf"), Some(FileTypeTag::Pdf));
        for mime in ["image/jpeg", "image/png", "image/gif", "image/tiff"] {
            assert_eq!(FileTypeTag::from_mime(mime), Some(FileTypeTag::Image));
        }
        assert_eq!(FileTypeTag::from_mime(DOCX_MIME), Some(FileTypeTag::WordDocument));
        assert_eq!(FileTypeTag::from_mime("text/plain"), Some(FileTypeTag::PlainText));
        assert_eq!(FileTypeTag::from_mime(XLSX_MIME), Some(FileTypeTag::Spreadsheet));
        assert_eq!(FileTypeTag::from_mime(XLS_MIME), Some(FileTypeTag::Spreadsheet));
        assert_eq!(FileTypeTag::from_mime("text/csv"), Some(FileTypeTag::Csv));
        assert_eq!(FileTypeTag::from_mime("application/csv"), Some(FileTypeTag::Csv));
    }

    #[test]
    fn test_mime_table_rejects_unknown() {
        assert_eq!(FileTypeTag::from_mime("application/zip"), None);
        assert_eq!(FileTypeTag::from_mime("application/msword"), None);
        assert_eq!(FileTypeTag::from_mime("image/webp"), None);
    }

    #[test]
    fn test_document_ref_from_path() {
        let doc = DocumentRef::from_path("/evidence/case-1/notice.pdf");
        assert_eq!(doc.name, "notice.pdf");
        assert_eq!(doc.path(), Path::new("/evidence/case-1/notice.pdf"));
    }

    #[test]
    fn test_corpus_keeps_insertion_order() {
        let mut corpus = CorpusResult::new();
        assert!(corpus.insert("b.txt", "second"));
        assert!(corpus.insert("a.txt", "first"));
        assert_eq!(corpus.file_names(), vec!["b.txt", "a.txt"]);
        assert_eq!(corpus.get("a.txt"), Some("first"));
    }

    #[test]
    fn test_corpus_rejects_duplicate_names() {
        let mut corpus = CorpusResult::new();
        assert!(corpus.insert("a.txt", "one"));
        assert!(!corpus.insert("a.txt", "two"));
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get("a.txt"), Some("one"));
    }

    #[test]
    fn test_corpus_serialization() {
        let mut corpus = CorpusResult::new();
        corpus.insert("report.csv", "id name");
        corpus.record_failure("broken.pdf", "corrupt");

        let serialized = serde_json::to_string(&corpus).unwrap();
        let deserialized: CorpusResult = serde_json::from_str(&serialized).unwrap();
        assert_eq!(corpus, deserialized);
        assert_eq!(deserialized.failures()[0].file_name, "broken.pdf");
    }
}
