use crate::file::TextExtractor;
use crate::models::DocumentRef;
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

/// Main document part inside a word-processing package
const DOCUMENT_PART: &str = "word/document.xml";

/// Word-processing document (docx) handler
///
/// Only body paragraphs are extracted. Tables, text boxes and images are
/// skipped.
#[derive(Debug, Default)]
pub struct DocxFile;

impl DocxFile {
    pub fn new() -> Self {
        Self
    }
}

fn read_document_part(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open DOCX file: {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read DOCX package: {}", path.display()))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("{} has no {}", path.display(), DOCUMENT_PART))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {} in {}", DOCUMENT_PART, path.display()))?;
    Ok(xml)
}

/// Collect the text of top-level paragraphs, in document order
pub(crate) fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    // Depth inside tables and text boxes, whose paragraphs are not body text
    let mut skip_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().context("Malformed document XML")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => skip_depth += 1,
                b"w:p" if skip_depth == 0 && current.is_none() => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => skip_depth = skip_depth.saturating_sub(1),
                b"w:p" if skip_depth == 0 => {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if skip_depth == 0 => {
                match (e.name().as_ref(), current.as_mut()) {
                    (b"w:p", None) => paragraphs.push(String::new()),
                    (b"w:tab", Some(text)) => text.push('\t'),
                    (b"w:br" | b"w:cr", Some(text)) => text.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) if in_text && skip_depth == 0 => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&t.unescape().context("Bad text escape in document XML")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[async_trait]
impl TextExtractor for DocxFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        let path = doc.path.clone();
        let text = tokio::task::spawn_blocking(move || -> Result<String> {
            let xml = read_document_part(&path)?;
            let paragraphs = paragraphs_from_xml(&xml)
                .with_context(|| format!("Failed to parse DOCX body: {}", path.display()))?;
            Ok(paragraphs.join("\n"))
        })
        .await??;

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "docx-paragraphs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{write_docx, write_plain_zip};
    use tempfile::TempDir;

    fn body(xml: &str) -> String {
        format!(
            "{}{}{}",
            crate::classifier::tests::DOCUMENT_XML_HEAD,
            xml,
            crate::classifier::tests::DOCUMENT_XML_TAIL
        )
    }

    #[tokio::test]
    async fn test_two_paragraphs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.docx");
        write_docx(
            &path,
            "<w:p><w:r><w:t>Intro</w:t></w:r></w:p><w:p><w:r><w:t>Body</w:t></w:r></w:p>",
        );

        let text = DocxFile::new().extract(&DocumentRef::from_path(&path)).await.unwrap();
        assert_eq!(text, "Intro\nBody");
    }

    #[test]
    fn test_runs_are_concatenated() {
        let xml = body(
            r#"<w:p><w:r><w:t xml:space="preserve">Adverse </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>action</w:t></w:r><w:r><w:tab/><w:t>notice</w:t></w:r></w:p>"#,
        );
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Adverse action\tnotice"]);
    }

    #[test]
    fn test_tables_are_skipped() {
        let xml = body(
            "<w:p><w:r><w:t>Intro</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>Body</w:t></w:r></w:p>",
        );
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Intro", "Body"]);
    }

    #[test]
    fn test_text_boxes_are_skipped() {
        let xml = body(
            "<w:p><w:r><w:t>Before</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></w:r><w:r><w:t> after</w:t></w:r></w:p>",
        );
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Before after"]);
    }

    #[test]
    fn test_empty_paragraphs_and_entities() {
        let xml = body("<w:p/><w:p><w:r><w:t>Terms &amp; conditions</w:t></w:r></w:p><w:p></w:p>");
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["", "Terms & conditions", ""]);
    }

    #[tokio::test]
    async fn test_zip_without_document_part_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.docx");
        write_plain_zip(&path);

        let err = DocxFile::new().extract(&DocumentRef::from_path(&path)).await.unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));
    }
}
