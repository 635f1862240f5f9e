pub mod collection;
pub mod handler;
pub mod pdf;
pub mod text;

pub use collection::collect_files;
pub use handler::{ExtractOptions, Extractor, ExtractorRegistry};
pub use pdf::PdfExtractor;
pub use text::TextExtractor;
