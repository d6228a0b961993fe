/// Render rows as a column-aligned text table without an index column.
///
/// Cells are right-justified to the widest value in their column and columns
/// are separated by a single space. Rows shorter than the header are padded
/// with blanks; extra cells get their own columns.
pub fn render(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (col, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(cell(row, col).chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        let line = widths
            .iter()
            .enumerate()
            .map(|(col, width)| format!("{:>width$}", flatten(cell(row, col)), width = *width))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(line);
    }
    lines.join("\n")
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.as_str()).unwrap_or("")
}

/// Keep each record on one output line
fn flatten(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
