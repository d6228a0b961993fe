pub mod factory;
pub mod r#trait;
pub mod types;

pub use factory::ExtractorSet;
pub use r#trait::TextExtractor;
pub use types::{CsvFile, DocxFile, ImageFile, PdfFile, SpreadsheetFile, TxtFile};
