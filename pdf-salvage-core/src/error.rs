use thiserror::Error;

/// Errors surfaced to callers of the public API.
///
/// Everything else the parser runs into (a malformed object, an unresolvable
/// stream length, a cyclic reference, an operator with too few operands) is
/// absorbed internally and only shows up as reduced output.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the indexed load nor the recovery scan found a document catalog.
    #[error("No document catalog found: {0}")]
    NoCatalog(String),

    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    #[error("Document has no pages")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, PdfError>;

impl PdfError {
    /// Whether this error was caused by the caller's input rather than the document.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PdfError::PageIndexOutOfRange { .. } | PdfError::EmptyDocument
        )
    }
}
