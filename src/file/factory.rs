use crate::file::types::{CsvFile, DocxFile, ImageFile, PdfFile, SpreadsheetFile, TxtFile};
use crate::file::TextExtractor;
use crate::models::FileTypeTag;
use crate::ocr::{OcrEngine, PdfRasterizer};
use std::collections::HashMap;
use std::sync::Arc;

/// Table of extraction routines, one per file type
#[derive(Clone, Default)]
pub struct ExtractorSet {
    routines: HashMap<FileTypeTag, Arc<dyn TextExtractor>>,
}

impl ExtractorSet {
    /// An empty table; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard routines, with OCR and rasterization delegated to the
    /// given collaborators
    pub fn standard(
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PdfRasterizer>,
        dpi: u32,
        page_workers: usize,
    ) -> Self {
        let pdf = PdfFile::new(rasterizer, Arc::clone(&ocr))
            .with_dpi(dpi)
            .with_page_workers(page_workers);

        Self::new()
            .with_routine(FileTypeTag::Pdf, Arc::new(pdf))
            .with_routine(FileTypeTag::Image, Arc::new(ImageFile::new(ocr)))
            .with_routine(FileTypeTag::WordDocument, Arc::new(DocxFile::new()))
            .with_routine(FileTypeTag::PlainText, Arc::new(TxtFile::new()))
            .with_routine(FileTypeTag::Spreadsheet, Arc::new(SpreadsheetFile::new()))
            .with_routine(FileTypeTag::Csv, Arc::new(CsvFile::new()))
    }

    /// Install (or replace) the routine for a tag
    pub fn with_routine(mut self, tag: FileTypeTag, routine: Arc<dyn TextExtractor>) -> Self {
        self.register(tag, routine);
        self
    }

    pub fn register(&mut self, tag: FileTypeTag, routine: Arc<dyn TextExtractor>) {
        self.routines.insert(tag, routine);
    }

    pub fn get(&self, tag: FileTypeTag) -> Option<Arc<dyn TextExtractor>> {
        self.routines.get(&tag).cloned()
    }

    pub fn supports(&self, tag: FileTypeTag) -> bool {
        self.routines.contains_key(&tag)
    }

    /// Stable description of which routine handles which tag. Cached corpora
    /// are only reused by a table with the same identity.
    pub fn identity(&self) -> String {
        FileTypeTag::ALL
            .iter()
            .filter_map(|tag| self.routines.get(tag).map(|r| format!("{}={}", tag, r.name())))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorSet")
            .field("routines", &self.identity())
            .finish()
    }
}
