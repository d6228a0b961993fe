use crate::file::TextExtractor;
use crate::models::DocumentRef;
use crate::ocr::{OcrEngine, PdfRasterizer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolution pages are rendered at before OCR
pub const DEFAULT_DPI: u32 = 300;

/// Scanned PDF handler: every page is rasterized and OCRed
///
/// Page images live in a temporary directory owned by a single call, so
/// concurrent extractions never share file names. The directory is removed
/// whether extraction succeeds or fails.
pub struct PdfFile {
    rasterizer: Arc<dyn PdfRasterizer>,
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
    page_workers: usize,
}

impl PdfFile {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            rasterizer,
            ocr,
            dpi: DEFAULT_DPI,
            page_workers: 1,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Pages OCRed concurrently within one document
    pub fn with_page_workers(mut self, page_workers: usize) -> Self {
        self.page_workers = page_workers.max(1);
        self
    }
}

#[async_trait]
impl TextExtractor for PdfFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        let scratch = tempfile::Builder::new()
            .prefix("evidex-pages-")
            .tempdir()
            .context("Failed to create scratch directory for PDF pages")?;

        let pages = self
            .rasterizer
            .rasterize(doc.path(), self.dpi, scratch.path())
            .await
            .with_context(|| format!("Failed to rasterize PDF: {}", doc.path.display()))?;
        debug!(
            file = %doc.name,
            pages = pages.len(),
            dpi = self.dpi,
            rasterizer = self.rasterizer.name(),
            ocr = self.ocr.name(),
            "rasterized PDF"
        );

        // buffered() keeps page order while running up to page_workers OCR calls
        let texts: Vec<String> = stream::iter(pages)
            .map(|page| {
                let ocr = Arc::clone(&self.ocr);
                async move {
                    ocr.recognize(&page)
                        .await
                        .with_context(|| format!("OCR failed for {}", page.display()))
                }
            })
            .buffered(self.page_workers)
            .try_collect()
            .await?;

        let mut extracted_text = String::new();
        for (idx, text) in texts.iter().enumerate() {
            extracted_text.push_str(&format!("--- Page {} ---\n{}\n", idx + 1, text));
        }

        if let Err(e) = scratch.close() {
            warn!(file = %doc.name, error = %e, "Failed to remove PDF scratch directory");
        }

        Ok(extracted_text)
    }

    fn name(&self) -> &'static str {
        "pdf-raster-ocr"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::file::types::image::tests::{EchoOcr, FailingOcr};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Writes `pages` fake page images and remembers where it put them
    pub(crate) struct StubRasterizer {
        pages: usize,
        pub(crate) out_dirs: Mutex<Vec<PathBuf>>,
        dpis: Mutex<Vec<u32>>,
    }

    impl StubRasterizer {
        pub(crate) fn new(pages: usize) -> Self {
            Self {
                pages,
                out_dirs: Mutex::new(Vec::new()),
                dpis: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PdfRasterizer for StubRasterizer {
        async fn rasterize(&self, _pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
            self.out_dirs.lock().unwrap().push(out_dir.to_path_buf());
            self.dpis.lock().unwrap().push(dpi);
            let mut pages = Vec::new();
            for n in 1..=self.pages {
                let page = out_dir.join(format!("page_{}.png", n));
                std::fs::write(&page, b"png")?;
                pages.push(page);
            }
            Ok(pages)
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_one_marker_per_page_in_order() {
        let rasterizer = Arc::new(StubRasterizer::new(2));
        let pdf = PdfFile::new(rasterizer.clone(), Arc::new(EchoOcr::default())).with_page_workers(2);

        let text = pdf.extract(&DocumentRef::from_path("/evidence/scan.pdf")).await.unwrap();

        assert_eq!(
            text,
            "--- Page 1 ---\ntext of page_1.png\n--- Page 2 ---\ntext of page_2.png\n"
        );
        assert_eq!(text.matches("--- Page ").count(), 2);
        assert_eq!(rasterizer.dpis.lock().unwrap().as_slice(), &[DEFAULT_DPI]);
    }

    #[tokio::test]
    async fn test_scratch_directory_removed_after_success() {
        let rasterizer = Arc::new(StubRasterizer::new(3));
        let pdf = PdfFile::new(rasterizer.clone(), Arc::new(EchoOcr::default()));

        pdf.extract(&DocumentRef::from_path("/evidence/scan.pdf")).await.unwrap();

        let out_dirs = rasterizer.out_dirs.lock().unwrap();
        assert_eq!(out_dirs.len(), 1);
        assert!(!out_dirs[0].exists());
    }

    #[tokio::test]
    async fn test_scratch_directory_removed_after_failure() {
        let rasterizer = Arc::new(StubRasterizer::new(2));
        let pdf = PdfFile::new(rasterizer.clone(), Arc::new(FailingOcr));

        let result = pdf.extract(&DocumentRef::from_path("/evidence/scan.pdf")).await;
        assert!(result.is_err());

        let out_dirs = rasterizer.out_dirs.lock().unwrap();
        assert!(!out_dirs[0].exists());
    }

    #[tokio::test]
    async fn test_concurrent_extractions_use_distinct_directories() {
        let rasterizer = Arc::new(StubRasterizer::new(1));
        let pdf = PdfFile::new(rasterizer.clone(), Arc::new(EchoOcr::default()));
        let doc = DocumentRef::from_path("/evidence/scan.pdf");

        let (a, b) = tokio::join!(pdf.extract(&doc), pdf.extract(&doc));
        assert!(a.is_ok() && b.is_ok());

        let out_dirs = rasterizer.out_dirs.lock().unwrap();
        assert_eq!(out_dirs.len(), 2);
        assert_ne!(out_dirs[0], out_dirs[1]);
    }

    #[tokio::test]
    async fn test_custom_dpi_is_passed_through() {
        let rasterizer = Arc::new(StubRasterizer::new(1));
        let pdf = PdfFile::new(rasterizer.clone(), Arc::new(EchoOcr::default())).with_dpi(150);

        pdf.extract(&DocumentRef::from_path("/evidence/scan.pdf")).await.unwrap();
        assert_eq!(rasterizer.dpis.lock().unwrap().as_slice(), &[150]);
    }

    #[tokio::test]
    async fn test_empty_pdf_has_no_markers() {
        let pdf = PdfFile::new(Arc::new(StubRasterizer::new(0)), Arc::new(EchoOcr::default()));
        let text = pdf.extract(&DocumentRef::from_path("/evidence/empty.pdf")).await.unwrap();
        assert_eq!(text, "");
    }
}
