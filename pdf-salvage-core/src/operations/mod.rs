//! Per-page queries over replayed content
//!
//! Text extraction and search live in [`crate::text`]; this module holds the
//! image and font queries.

pub mod extract_fonts;
pub mod extract_images;

pub use extract_fonts::{extract_fonts, ExtractedFont};
pub use extract_images::{extract_images, ExtractedImage, ImageFormat};
