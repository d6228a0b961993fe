pub mod pdftoppm;
pub mod tesseract;
pub mod r#trait;

pub use pdftoppm::PdftoppmRasterizer;
pub use r#trait::{OcrEngine, PdfRasterizer};
pub use tesseract::TesseractOcr;

use std::process::Command;

/// Check that an external tool can be spawned
pub fn command_available(executable: &str) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success() || !output.stdout.is_empty() || !output.stderr.is_empty())
        .unwrap_or(false)
}
