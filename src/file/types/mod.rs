pub mod csv;
pub mod docx;
pub mod image;
pub mod pdf;
pub mod spreadsheet;
pub mod txt;

pub use csv::CsvFile;
pub use docx::DocxFile;
pub use image::ImageFile;
pub use pdf::PdfFile;
pub use spreadsheet::SpreadsheetFile;
pub use txt::TxtFile;
