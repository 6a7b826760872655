//! # pdf-salvage
//!
//! A tolerant PDF reader. It loads documents that other readers reject (broken
//! cross-reference tables, wrong stream lengths, truncated files, cyclic page
//! trees) and answers read-only queries over them: positioned text, images
//! with their placement, font metadata, and text search.
//!
//! ## Features
//!
//! - **Two load strategies**: the cross-reference index when it is sound, a
//!   linear scan for object headers when it is not
//! - **Bounded recursion**: page tree, reference chains and form XObjects all
//!   have configurable depth ceilings
//! - **Content replay**: text and graphics state tracking with `q`/`Q`, `cm`
//!   and the full text positioning operator set
//! - **Text decoding**: ToUnicode maps, composite (`Type0`) fonts, standard
//!   single-byte encodings and `/Differences`
//! - **Thread safe**: a loaded [`PdfDocument`] is immutable and `Send + Sync`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_salvage::{PdfDocument, SearchOptions};
//!
//! # fn main() -> pdf_salvage::Result<()> {
//! let doc = PdfDocument::open("scan-of-a-scan.pdf")?;
//!
//! for i in 0..doc.page_count() {
//!     println!("--- page {} ---\n{}", i + 1, doc.page_text(i)?);
//! }
//!
//! let hits = doc.search("invoice", SearchOptions::default())?;
//! println!("{} matches", hits.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Tolerance
//!
//! ```rust,no_run
//! use pdf_salvage::{ParseOptions, PdfDocument};
//!
//! # fn main() -> pdf_salvage::Result<()> {
//! let bytes = std::fs::read("damaged.pdf")?;
//! let doc = PdfDocument::from_bytes_with_options(bytes, ParseOptions::lenient())?;
//!
//! println!("loaded via {:?}", doc.load_strategy());
//! for warning in doc.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod geometry;
pub mod graphics;
pub mod operations;
pub mod parser;
pub mod recovery;
pub mod text;

pub use document::PdfDocument;
pub use error::{PdfError, Result};
pub use geometry::{Matrix, Point};
pub use operations::{ExtractedFont, ExtractedImage, ImageFormat};
pub use parser::{
    LoadStrategy, PageDescriptor, ParseError, ParseOptions, RecoveryMode, Resolver, ResourceMap,
};
pub use text::{ExtractedText, FontInfo, SearchOptions, SearchResult};

/// Current version of pdf-salvage
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_garbage_is_not_a_document() {
        let result = PdfDocument::from_bytes(b"definitely not a pdf".to_vec());
        assert!(matches!(result, Err(PdfError::NoCatalog(_))));
    }
}
