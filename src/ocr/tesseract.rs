use crate::ocr::OcrEngine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// OCR through the tesseract command line tool
/// Install: brew install tesseract (macOS) or apt-get install tesseract-ocr (Linux)
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    executable: String,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            executable: "tesseract".to_string(),
            language: None,
        }
    }

    /// Set the tesseract executable (default: "tesseract")
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set the recognition language, e.g. "eng" (default: engine default)
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    fn build_command(&self, image: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg(image).arg("stdout");
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }
        command
    }

    fn run(&self, image: PathBuf) -> Result<String> {
        let output = self
            .build_command(&image)
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {}. Install tesseract: brew install tesseract (macOS) or apt-get install tesseract-ocr (Linux)",
                    self.executable
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed on {}: {}", image.display(), stderr.trim());
        }

        // Recognition is best-effort; keep whatever decodes
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<String> {
        let engine = self.clone();
        let image = image.to_path_buf();
        tokio::task::spawn_blocking(move || engine.run(image)).await?
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}
