//! Loaded documents and the read-only query API
//!
//! [`PdfDocument`] owns the object table and the flattened page list, both
//! built once at load time and never modified afterwards. Every query replays
//! the page content from scratch with its own interpreter state, so a
//! document can be shared between threads and queried concurrently.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdf_salvage::{PdfDocument, SearchOptions};
//!
//! # fn main() -> pdf_salvage::Result<()> {
//! let doc = PdfDocument::open("report.pdf")?;
//! println!("{} pages, loaded {:?}", doc.page_count(), doc.load_strategy());
//!
//! for run in doc.extract_text(0)? {
//!     println!("{:>7.1} {:>7.1}  {}", run.x, run.y, run.text);
//! }
//!
//! for hit in doc.search("total", SearchOptions::case_insensitive())? {
//!     println!("page {} at {:?}", hit.page_index, hit.position);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{PdfError, Result};
use crate::graphics::replay::{replay_page, PageEvent};
use crate::operations::extract_fonts::{extract_fonts, ExtractedFont};
use crate::operations::extract_images::{extract_images, ExtractedImage};
use crate::parser::objects::PdfDictionary;
use crate::parser::page_tree::{build_page_list, PageDescriptor};
use crate::parser::resolver::Resolver;
use crate::parser::store::{LoadStrategy, ObjectStore};
use crate::parser::{Diagnostics, ParseOptions};
use crate::text::extraction::{extract_text, join_runs, ExtractedText};
use crate::text::font::FontInfo;
use crate::text::search::{search_runs, SearchOptions, SearchResult};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, OnceLock};

type FontSlot = OnceLock<Option<Arc<FontInfo>>>;

/// A loaded PDF document
#[derive(Debug)]
pub struct PdfDocument {
    store: ObjectStore,
    pages: Vec<PageDescriptor>,
    options: ParseOptions,
    /// One slot per font dictionary, filled on first use
    fonts: HashMap<u32, FontSlot>,
    warnings: Vec<String>,
}

impl PdfDocument {
    /// Load a document from a complete in-memory buffer with default options
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(bytes, ParseOptions::default())
    }

    pub fn from_bytes_with_options(bytes: Vec<u8>, options: ParseOptions) -> Result<Self> {
        let store = ObjectStore::load(&bytes, &options)?;
        drop(bytes);

        let mut diag = Diagnostics::new(options.collect_warnings);
        let resolver = Resolver::new(store.objects(), options.max_reference_depth);
        let catalog = store.catalog().ok_or_else(|| {
            let (num, gen) = store.root();
            PdfError::NoCatalog(format!("catalog object {num} {gen} is missing"))
        })?;
        let pages = build_page_list(&resolver, catalog, options.max_page_tree_depth, &mut |w| {
            diag.warn(w)
        });
        if pages.is_empty() {
            diag.warn("Page tree yielded no pages");
        }

        // Slots for every font dictionary, including those only reachable
        // through form XObjects
        let fonts = store
            .objects()
            .values()
            .filter(|raw| raw.object_type() == Some("Font"))
            .map(|raw| raw.object_number)
            .chain(pages.iter().flat_map(|p| p.resources.fonts.values().copied()))
            .map(|num| (num, FontSlot::new()))
            .collect();

        let mut warnings = store.warnings().to_vec();
        warnings.extend(diag.into_warnings());

        tracing::debug!(
            "Document ready: {} pages, {} objects",
            pages.len(),
            store.len()
        );

        Ok(PdfDocument {
            store,
            pages,
            options,
            fonts,
            warnings,
        })
    }

    /// Read the whole of `reader` and load it
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Result<&PageDescriptor> {
        self.pages.get(index).ok_or(PdfError::PageIndexOutOfRange {
            index,
            page_count: self.pages.len(),
        })
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    /// Text runs of one page, in the order the content stream shows them
    pub fn extract_text(&self, index: usize) -> Result<Vec<ExtractedText>> {
        let page = self.page(index)?;
        Ok(extract_text(&self.replay(page)))
    }

    /// Text runs of every page
    pub fn extract_all_text(&self) -> Result<Vec<Vec<ExtractedText>>> {
        self.require_pages()?;
        Ok(self
            .pages
            .iter()
            .map(|page| extract_text(&self.replay(page)))
            .collect())
    }

    /// Page text as a string, one line per visual line
    pub fn page_text(&self, index: usize) -> Result<String> {
        Ok(join_runs(&self.extract_text(index)?))
    }

    pub fn extract_images(&self, index: usize) -> Result<Vec<ExtractedImage>> {
        let page = self.page(index)?;
        let events = self.replay(page);
        Ok(extract_images(&self.resolver(), &events, page.media_box))
    }

    pub fn extract_fonts(&self, index: usize) -> Result<Vec<ExtractedFont>> {
        let page = self.page(index)?;
        Ok(extract_fonts(&|num| self.font_info(num), page))
    }

    /// Search every page, results ordered by page
    pub fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchResult>> {
        self.require_pages()?;
        Ok(self
            .pages
            .iter()
            .enumerate()
            .flat_map(|(index, page)| {
                let runs = extract_text(&self.replay(page));
                search_runs(&runs, index, query, options)
            })
            .collect())
    }

    pub fn search_page(
        &self,
        index: usize,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let runs = self.extract_text(index)?;
        Ok(search_runs(&runs, index, query, options))
    }

    /// Font dictionary in `object_number`, built once and shared afterwards
    pub fn font_info(&self, object_number: u32) -> Option<Arc<FontInfo>> {
        let load = || FontInfo::load(&self.resolver(), object_number).map(Arc::new);
        match self.fonts.get(&object_number) {
            Some(slot) => slot.get_or_init(load).clone(),
            None => load(),
        }
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.store.objects(), self.options.max_reference_depth)
    }

    /// Irregularities met while loading, when `collect_warnings` was set
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Header version, such as `1.7`
    pub fn version(&self) -> Option<&str> {
        self.store.version()
    }

    pub fn load_strategy(&self) -> LoadStrategy {
        self.store.strategy()
    }

    pub fn object_count(&self) -> usize {
        self.store.len()
    }

    pub fn trailer(&self) -> &PdfDictionary {
        self.store.trailer()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn replay(&self, page: &PageDescriptor) -> Vec<PageEvent> {
        replay_page(
            &self.resolver(),
            &|num| self.font_info(num),
            page,
            self.options.max_form_depth,
        )
    }

    fn require_pages(&self) -> Result<()> {
        if self.pages.is_empty() {
            Err(PdfError::EmptyDocument)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single page document with correct xref offsets
    fn document(content: &str) -> Vec<u8> {
        let bodies = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = out.len();
        let size = bodies.len() + 1;
        out.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        let trailer =
            format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n");
        out.extend_from_slice(trailer.as_bytes());
        out
    }

    #[test]
    fn test_load_and_query() {
        let bytes = document("BT /F1 12 Tf 72 720 Td (Hello) Tj ET");
        let doc = PdfDocument::from_bytes(bytes).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.version(), Some("1.4"));
        assert_eq!(doc.load_strategy(), LoadStrategy::Indexed);

        let text = doc.extract_text(0).unwrap();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].text, "Hello");
        assert_eq!((text[0].x, text[0].y), (72.0, 72.0));
        assert_eq!(text[0].font_size, 12.0);

        let fonts = doc.extract_fonts(0).unwrap();
        assert_eq!(fonts[0].base_font, "Helvetica");
    }

    #[test]
    fn test_font_info_is_cached() {
        let doc = PdfDocument::from_bytes(document("")).unwrap();
        let first = doc.font_info(5).unwrap();
        let second = doc.font_info(5).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(doc.font_info(1).is_none());
    }

    #[test]
    fn test_page_index_out_of_range() {
        let doc = PdfDocument::from_bytes(document("")).unwrap();
        match doc.extract_text(1) {
            Err(PdfError::PageIndexOutOfRange { index, page_count }) => {
                assert_eq!((index, page_count), (1, 1));
            }
            other => panic!("expected PageIndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfDocument>();
    }
}
