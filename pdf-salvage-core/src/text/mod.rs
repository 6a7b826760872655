//! Text recovery: fonts, encodings, decoding, extraction and search

pub mod cmap;
pub mod decoder;
pub mod encoding;
pub mod extraction;
pub mod font;
pub mod search;

pub use cmap::{CMap, CodeRange};
pub use decoder::decode_text;
pub use encoding::TextEncoding;
pub use extraction::{extract_text, join_runs, ExtractedText};
pub use font::{EmbeddedProgram, EncodingMode, FontInfo};
pub use search::{search_runs, SearchOptions, SearchResult};
