//! Content-based file type detection.
//!
//! Only the bytes of a file are consulted, never its name or extension. Binary
//! formats are recognised by their magic numbers, zip containers are opened to
//! tell word-processing packages from workbooks, and everything else is checked
//! for being text and then for being comma separated.

use crate::error::ExtractError;
use crate::models::{FileTypeTag, DOCX_MIME, XLSX_MIME};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Number of leading bytes inspected when sniffing
const SNIFF_LEN: u64 = 8192;
/// Lines considered when deciding whether text is CSV
const CSV_SAMPLE_RECORDS: usize = 20;
const OCTET_STREAM: &str = "application/octet-stream";

/// Maps file content to a [`FileTypeTag`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTypeClassifier;

impl FileTypeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a file by its content signature
    pub fn classify(&self, path: &Path) -> Result<FileTypeTag, ExtractError> {
        let mime = self.sniff_mime(path)?;
        FileTypeTag::from_mime(&mime).ok_or_else(|| ExtractError::UnsupportedType {
            file: display_name(path),
            mime,
        })
    }

    /// Content-derived media type of a file, supported or not
    pub fn sniff_mime(&self, path: &Path) -> Result<String, ExtractError> {
        let io_err = |source| ExtractError::Io {
            file: display_name(path),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let total_len = file.metadata().map_err(io_err)?.len();
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN).read_to_end(&mut head).map_err(io_err)?;

        if head.is_empty() {
            return Ok("inode/x-empty".to_string());
        }

        let truncated = total_len > SNIFF_LEN;
        let mime = match infer::get(&head).map(|kind| kind.mime_type()) {
            Some(mime) if mime == "application/zip" || mime.starts_with("application/vnd.openxmlformats") => {
                probe_zip_container(path).unwrap_or(mime).to_string()
            }
            Some(mime) if FileTypeTag::from_mime(mime).is_some() => mime.to_string(),
            // Some matchers (BMP "BM", PE "MZ") check only two bytes; text that
            // happens to start with them is still text
            Some(mime) => match sniff_text(&head, truncated) {
                OCTET_STREAM => mime.to_string(),
                text => text.to_string(),
            },
            None => sniff_text(&head, truncated).to_string(),
        };

        debug!(file = %path.display(), %mime, "sniffed media type");
        Ok(mime)
    }
}

/// Look inside a zip for the parts that identify office packages
fn probe_zip_container(path: &Path) -> Option<&'static str> {
    let file = File::open(path).ok()?;
    let archive = zip::ZipArchive::new(file).ok()?;
    let found = archive.file_names().find_map(|name| match name {
        "word/document.xml" => Some(DOCX_MIME),
        "xl/workbook.xml" => Some(XLSX_MIME),
        _ => None,
    });
    found
}

/// Decide between text/csv, text/plain and binary for content without magic
fn sniff_text(head: &[u8], truncated: bool) -> &'static str {
    if utf16_bom(head).is_some() {
        return "text/plain";
    }
    if head.contains(&0) {
        return OCTET_STREAM;
    }

    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        // A multi-byte sequence cut off by the sniff window is still text
        Err(e) if truncated && e.error_len().is_none() => {
            // valid_up_to() is always a char boundary
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => {
            let printable = head
                .iter()
                .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13)
                .count();
            // Mostly printable: legacy 8-bit text
            return if printable * 100 / head.len() > 80 {
                "text/plain"
            } else {
                OCTET_STREAM
            };
        }
    };

    if looks_like_csv(text, truncated) {
        "text/csv"
    } else {
        "text/plain"
    }
}

fn looks_like_csv(text: &str, truncated: bool) -> bool {
    // Drop the last line when the sample ends mid-file
    let sample = if truncated {
        match text.rfind('\n') {
            Some(idx) => &text[..idx],
            None => return false,
        }
    } else {
        text
    };

    if !sample.contains(',') {
        return false;
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());

    let mut widths = Vec::new();
    for record in reader.records().take(CSV_SAMPLE_RECORDS) {
        match record {
            Ok(record) => widths.push(record.len()),
            Err(_) => return false,
        }
    }

    // A complete sample needs a header and two rows; two comma-bearing lines of
    // prose are not a table
    let min_records = if truncated { 2 } else { 3 };
    widths.len() >= min_records && widths[0] >= 2 && widths.iter().all(|&w| w == widths[0])
}

/// Byte order of UTF-16 content announced by a BOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Utf16Order {
    Little,
    Big,
}

pub(crate) fn utf16_bom(bytes: &[u8]) -> Option<Utf16Order> {
    match bytes {
        [0xFF, 0xFE, ..] => Some(Utf16Order::Little),
        [0xFE, 0xFF, ..] => Some(Utf16Order::Big),
        _ => None,
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    pub(crate) const DOCUMENT_XML_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    pub(crate) const DOCUMENT_XML_TAIL: &str = r#"<w:sectPr/></w:body></w:document>"#;

    /// Write a minimal docx whose body is `body_xml`
    pub(crate) fn write_docx(path: &Path, body_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("word/document.xml", FileOptions::default()).unwrap();
        write!(zip, "{}{}{}", DOCUMENT_XML_HEAD, body_xml, DOCUMENT_XML_TAIL).unwrap();
        zip.start_file("[Content_Types].xml", FileOptions::default()).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.finish().unwrap();
    }

    /// Write a plain zip archive with one text member
    pub(crate) fn write_plain_zip(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("readme.txt", FileOptions::default()).unwrap();
        zip.write_all(b"Hello from ZIP!").unwrap();
        zip.finish().unwrap();
    }

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R'];

    #[test]
    fn test_classify_pdf_by_content() {
        let dir = TempDir::new().unwrap();
        // Extension lies; content wins
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n").unwrap();

        let tag = FileTypeClassifier::new().classify(&path).unwrap();
        assert_eq!(tag, FileTypeTag::Pdf);
    }

    #[test]
    fn test_classify_images() {
        let dir = TempDir::new().unwrap();
        let samples: [(&str, &[u8]); 4] = [
            ("a.png", PNG_HEADER),
            ("b.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0]),
            ("c.gif", b"GIF89a\x01\x00\x01\x00\x00\x00\x00"),
            ("d.tif", &[0x49, 0x49, 0x2A, 0x00, 0x08, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
        ];
        let classifier = FileTypeClassifier::new();
        for (name, bytes) in samples {
            let path = dir.path().join(name);
            std::fs::write(&path, bytes).unwrap();
            assert_eq!(classifier.classify(&path).unwrap(), FileTypeTag::Image, "{}", name);
        }
    }

    #[test]
    fn test_classify_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes");
        std::fs::write(&path, "Consumer called on 3 May about the dispute.\nAgent escalated.\n").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }

    #[test]
    fn test_classify_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report");
        std::fs::write(&path, "id,name\n1,alice\n2,bob\n").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::Csv);
    }

    #[test]
    fn test_single_line_with_comma_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("letter.txt");
        std::fs::write(&path, "Dear customer, your dispute was resolved.").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }

    #[test]
    fn test_ragged_rows_are_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "Hello, world\nThis line has, two, commas\n").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }

    #[test]
    fn test_classify_docx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.bin");
        write_docx(&path, "<w:p><w:r><w:t>Intro</w:t></w:r></w:p>");

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::WordDocument);
    }

    #[test]
    fn test_classify_xlsx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "id").unwrap();
        workbook.save(&path).unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::Spreadsheet);
    }

    #[test]
    fn test_zip_archive_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.zip");
        write_plain_zip(&path);

        let err = FileTypeClassifier::new().classify(&path).unwrap_err();
        match err {
            ExtractError::UnsupportedType { file, mime } => {
                assert_eq!(file, "bundle.zip");
                assert_eq!(mime, "application/zip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_binary_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.dat");
        std::fs::write(&path, [0u8, 1, 2, 3, 0, 255, 254, 0]).unwrap();

        let err = FileTypeClassifier::new().classify(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType { .. }));
        assert_eq!(err.file(), Some("blob.dat"));
    }

    #[test]
    fn test_empty_file_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, b"").unwrap();

        let classifier = FileTypeClassifier::new();
        assert_eq!(classifier.sniff_mime(&path).unwrap(), "inode/x-empty");
        assert!(matches!(
            classifier.classify(&path),
            Err(ExtractError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = FileTypeClassifier::new()
            .classify(&dir.path().join("gone.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_two_line_prose_with_commas_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reply.txt");
        std::fs::write(&path, "Dear John, thank you\nRegards, Jane\n").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }

    #[test]
    fn test_text_starting_with_short_magic_is_text() {
        let dir = TempDir::new().unwrap();
        let classifier = FileTypeClassifier::new();

        let bmo = dir.path().join("bmo.txt");
        std::fs::write(&bmo, "BMO statement for March\nBalance carried forward.\n").unwrap();
        assert_eq!(classifier.classify(&bmo).unwrap(), FileTypeTag::PlainText);

        let mz = dir.path().join("mz.txt");
        std::fs::write(&mz, "MZ Holdings letter regarding account 4411\n").unwrap();
        assert_eq!(classifier.classify(&mz).unwrap(), FileTypeTag::PlainText);

        let bmi = dir.path().join("bmi.csv");
        std::fs::write(&bmi, "BMI,weight,height\n22,70,178\n24,80,182\n").unwrap();
        assert_eq!(classifier.classify(&bmi).unwrap(), FileTypeTag::Csv);
    }

    #[test]
    fn test_real_bitmap_stays_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.bmp");
        let mut bytes = b"BM".to_vec();
        bytes.extend_from_slice(&[0x46, 0, 0, 0, 0, 0, 0, 0, 0x36, 0, 0, 0, 0x28, 0, 0, 0]);
        std::fs::write(&path, &bytes).unwrap();

        let err = FileTypeClassifier::new().classify(&path).unwrap_err();
        match err {
            ExtractError::UnsupportedType { mime, .. } => assert_eq!(mime, "image/bmp"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_utf16_with_bom_is_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.txt");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Dispute log".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }

    #[test]
    fn test_latin1_text_is_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.txt");
        // "Café résumé" in ISO-8859-1
        std::fs::write(&path, b"Caf\xe9 r\xe9sum\xe9 for the account holder\n").unwrap();

        assert_eq!(FileTypeClassifier::new().classify(&path).unwrap(), FileTypeTag::PlainText);
    }
}
