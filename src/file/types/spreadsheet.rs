use crate::file::TextExtractor;
use crate::models::DocumentRef;
use crate::table;
use anyhow::{Context, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;
use std::io::Cursor;
use std::path::Path;

/// Workbook handler (xlsx and legacy xls)
///
/// Every sheet is rendered under a `Sheet: <name>` header, in the order the
/// workbook declares its sheets. The first row of a sheet is its header row.
#[derive(Debug, Default)]
pub struct SpreadsheetFile;

impl SpreadsheetFile {
    pub fn new() -> Self {
        Self
    }
}

fn render_workbook(path: &Path) -> Result<String> {
    // Decoder is chosen from the bytes; the extension may lie
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read workbook: {}", path.display()))?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let mut parts = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet '{}' in {}", sheet_name, path.display()))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(render_cell).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        let body: Vec<Vec<String>> = rows.collect();

        parts.push(format!("Sheet: {}\n", sheet_name));
        parts.push(table::render(&headers, &body));
        parts.push("\n\n".to_string());
    }

    Ok(parts.join("\n"))
}

/// Cell text; date cells become ISO dates instead of serial numbers
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::DateTime(value) if value.is_datetime() => match value.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    }
}

#[async_trait]
impl TextExtractor for SpreadsheetFile {
    async fn extract(&self, doc: &DocumentRef) -> Result<String> {
        let path = doc.path.clone();
        let text = tokio::task::spawn_blocking(move || render_workbook(&path)).await??;
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "workbook-table"
    }
}
