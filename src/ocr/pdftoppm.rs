use crate::ocr::PdfRasterizer;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name prefix handed to pdftoppm; pages come out as `page-<n>.png`
const PAGE_PREFIX: &str = "page";

/// PDF rasterizer using pdftoppm (Poppler)
/// Install: brew install poppler (macOS) or apt-get install poppler-utils (Linux)
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    executable: String,
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self {
            executable: "pdftoppm".to_string(),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    fn build_command(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX));
        command
    }

    fn run(&self, pdf: PathBuf, dpi: u32, out_dir: PathBuf) -> Result<Vec<PathBuf>> {
        let output = self
            .build_command(&pdf, dpi, &out_dir)
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {}. Install Poppler utils: brew install poppler (macOS) or apt-get install poppler-utils (Linux)",
                    self.executable
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pdftoppm failed on {}: {}", pdf.display(), stderr.trim());
        }

        collect_pages(&out_dir)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// List rendered page images sorted by page number. pdftoppm zero-pads the
/// number to the width of the page count, so lexical order is not enough.
fn collect_pages(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    let entries = std::fs::read_dir(out_dir)
        .with_context(|| format!("Failed to list rendered pages in {}", out_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let number = stem.strip_prefix(PAGE_PREFIX)?.strip_prefix('-')?;
    number.parse().ok()
}

#[async_trait::async_trait]
impl PdfRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let rasterizer = self.clone();
        let pdf = pdf.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        tokio::task::spawn_blocking(move || rasterizer.run(pdf, dpi, out_dir)).await?
    }

    fn name(&self) -> &'static str {
        "pdftoppm"
    }
}
