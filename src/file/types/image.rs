use crate::file::TextExtractor;
use crate::models::DocumentRef;
use crate::ocr::OcrEngine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Image handler: OCR over the whole image
pub struct ImageFile {
    ocr: Arc<dyn OcrEngine>,
}

impl ImageFile {
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextExtractor for ImageFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        debug!(file = %doc.name, ocr = self.ocr.name(), "recognizing image");
        self.ocr
            .recognize(doc.path())
            .await
            .with_context(|| format!("OCR failed for image: {}", doc.path.display()))
    }

    fn name(&self) -> &'static str {
        "image-ocr"
    }
}
