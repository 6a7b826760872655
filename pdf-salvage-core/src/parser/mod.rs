//! PDF Parser Module
//!
//! The read path: a shared [`lexer`] over raw bytes, the [`objects`] value
//! model built from its tokens, the object [`store`] (indexed load through
//! [`xref`] / [`xref_stream`] and [`object_stream`], with
//! [`crate::recovery`] as the fallback), the reference [`resolver`], the
//! [`page_tree`] walker and the [`content`] stream operator decoder.

pub mod content;
pub mod filters;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod page_tree;
pub mod resolver;
pub mod store;
pub mod xref;
pub mod xref_stream;

use crate::error::PdfError;

pub use self::content::{ContentOperation, ContentParser, TextElement};
pub use self::lexer::{Lexer, Token};
pub use self::objects::{PdfArray, PdfDictionary, PdfName, PdfObject, PdfString};
pub use self::page_tree::{PageDescriptor, ResourceMap};
pub use self::resolver::Resolver;
pub use self::store::{LoadStrategy, ObjectStore, ObjectTable, RawObject};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Irregularities met while parsing.
///
/// Apart from [`ParseError::MissingRoot`], none of these reach the caller:
/// they are logged and the affected object, page or operator is dropped.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Invalid object reference: {0} {1} R")]
    InvalidReference(u32, u32),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref table")]
    InvalidXRef,

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Circular reference detected")]
    CircularReference,

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),

    #[error("Document root not found: {0}")]
    MissingRoot(String),
}

impl From<ParseError> for PdfError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MissingRoot(reason) => PdfError::NoCatalog(reason),
            other => PdfError::NoCatalog(other.to_string()),
        }
    }
}

/// Which load strategies the object store may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Use the cross-reference index, fall back to a full scan when it is
    /// missing or inconsistent.
    #[default]
    Auto,
    /// Skip the index and always rebuild the object table by scanning.
    Always,
    /// Trust the index only; a broken index fails the load.
    Never,
}

/// Options controlling how tolerant the parser is and how deep it may recurse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Ceiling for page tree recursion. Deeper subtrees are truncated.
    pub max_page_tree_depth: usize,
    /// Ceiling for reference chains and `/Parent` walks.
    pub max_reference_depth: usize,
    /// Ceiling for nested form XObject replay.
    pub max_form_depth: usize,
    /// Load strategy selection
    pub recovery: RecoveryMode,
    /// Keep load-time warnings so they can be inspected after the load.
    pub collect_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_page_tree_depth: 64,
            max_reference_depth: 32,
            max_form_depth: 8,
            recovery: RecoveryMode::Auto,
            collect_warnings: false,
        }
    }
}

impl ParseOptions {
    /// Options for documents from unknown generators: recovery enabled and
    /// warnings collected.
    pub fn lenient() -> Self {
        Self {
            collect_warnings: true,
            ..Default::default()
        }
    }

    /// Options that refuse to rebuild a broken cross-reference index.
    pub fn strict() -> Self {
        Self {
            recovery: RecoveryMode::Never,
            ..Default::default()
        }
    }

    pub fn with_max_page_tree_depth(mut self, depth: usize) -> Self {
        self.max_page_tree_depth = depth;
        self
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    pub fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_collect_warnings(mut self, collect: bool) -> Self {
        self.collect_warnings = collect;
        self
    }
}

/// Load-time warning sink: every warning is logged, and kept when requested.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    collect: bool,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub(crate) fn new(collect: bool) -> Self {
        Self {
            collect,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        if self.collect {
            self.warnings.push(message);
        }
    }

    pub(crate) fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
