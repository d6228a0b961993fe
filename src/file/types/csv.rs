use crate::file::TextExtractor;
use crate::models::DocumentRef;
use crate::table;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// CSV file handler: parsed as a table and rendered as aligned text
#[derive(Debug, Default)]
pub struct CsvFile;

impl CsvFile {
    pub fn new() -> Self {
        Self
    }
}

/// Parse a CSV file into its header row and data rows
fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = rdr
        .byte_headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.byte_records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {} in {}", idx + 1, path.display()))?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    Ok((headers, rows))
}

#[async_trait]
impl TextExtractor for CsvFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        let path = doc.path.clone();
        let text = tokio::task::spawn_blocking(move || -> Result<String> {
            let (headers, rows) = read_table(&path)?;
            Ok(table::render(&headers, &rows))
        })
        .await??;

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "csv-table"
    }
}
