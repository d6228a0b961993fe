use crate::classifier::{utf16_bom, Utf16Order};
use crate::file::TextExtractor;
use crate::models::DocumentRef;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Plain text handler
#[derive(Debug, Default)]
pub struct TxtFile;

impl TxtFile {
    pub fn new() -> Self {
        Self
    }
}

/// Decode UTF-16 (by BOM) or UTF-8. Legacy 8-bit text is still text; what
/// doesn't decode is replaced.
fn decode_text(mut bytes: Vec<u8>) -> String {
    if let Some(order) = utf16_bom(&bytes) {
        let units = bytes[2..].chunks_exact(2).map(|pair| match order {
            Utf16Order::Little => u16::from_le_bytes([pair[0], pair[1]]),
            Utf16Order::Big => u16::from_be_bytes([pair[0], pair[1]]),
        });
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }

    if bytes.starts_with(b"\xEF\xBB\xBF") {
        bytes.drain(..3);
    }
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[async_trait]
impl TextExtractor for TxtFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        let bytes = doc
            .read_bytes()
            .await
            .with_context(|| format!("Failed to read text file: {}", doc.path.display()))?;

        Ok(decode_text(bytes))
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
