use anyhow::Result;
use std::path::{Path, PathBuf};

/// Optical character recognition over a raster image on disk
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in an image. Empty output is a valid result.
    async fn recognize(&self, image: &Path) -> Result<String>;

    /// Engine identity for logs
    fn name(&self) -> &'static str;
}

/// Renders PDF pages to images
#[async_trait::async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Render every page of `pdf` at `dpi` into `out_dir`, returning the page
    /// images in page order. Each page must get a distinct file name.
    async fn rasterize(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>>;

    /// Rasterizer identity for logs
    fn name(&self) -> &'static str;
}
