//! Property-based tests for parser robustness
//!
//! Nothing in the read path may panic, whatever bytes it is given.

mod common;

use common::{show, single_page};
use pdf_salvage::parser::{ContentParser, Lexer, PdfObject};
use pdf_salvage::text::CMap;
use pdf_salvage::{ParseOptions, PdfDocument, SearchOptions};
use proptest::prelude::*;

// Fragments that steer random input towards interesting lexer states
fn pdf_fragment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,20}",
        "[a-zA-Z0-9()\\\\]{0,20}".prop_map(|s| format!("({s}")),
        "[0-9A-Fa-f ]{0,20}".prop_map(|s| format!("<{s}")),
        "[a-zA-Z#0-9]{0,10}".prop_map(|s| format!("/{s}")),
        Just("<<".to_string()),
        Just(">>".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("1 0 obj".to_string()),
        Just("1 0 R".to_string()),
        Just("stream\n".to_string()),
        Just("endstream".to_string()),
        Just("BI /W 1 ID ".to_string()),
        Just("Tj TJ Tf Td cm q Q Do".to_string()),
    ]
}

fn pdf_soup_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(pdf_fragment_strategy(), 0..40)
        .prop_map(|parts| parts.join(" ").into_bytes())
}

proptest! {
    #[test]
    fn test_lexer_never_panics(input in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut lexer = Lexer::new(&input);
        let mut steps = 0;
        while lexer.next_token().is_some() {
            steps += 1;
            prop_assert!(steps <= input.len() + 1, "lexer did not make progress");
        }
    }

    #[test]
    fn test_object_parser_never_panics(input in pdf_soup_strategy()) {
        let _ = PdfObject::from_bytes(&input);
    }

    #[test]
    fn test_content_parser_never_panics(input in pdf_soup_strategy()) {
        let _ = ContentParser::parse(&input);
    }

    #[test]
    fn test_cmap_parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..512)) {
        let cmap = CMap::parse(&input);
        let _ = cmap.lookup(0x41);
    }

    #[test]
    fn test_loader_never_panics(input in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = PdfDocument::from_bytes(input);
    }

    #[test]
    fn test_loader_never_panics_on_soup(input in pdf_soup_strategy()) {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend_from_slice(&input);
        let _ = PdfDocument::from_bytes_with_options(bytes, ParseOptions::lenient());
    }

    #[test]
    fn test_corrupted_documents_never_panic(
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..16),
        cut in any::<prop::sample::Index>(),
    ) {
        let mut bytes = single_page(&show("Robust text", 72.0, 720.0)).build();
        for (index, value) in flips {
            let i = index.index(bytes.len());
            bytes[i] = value;
        }
        let keep = cut.index(bytes.len() + 1);
        bytes.truncate(keep.max(bytes.len() / 2));

        if let Ok(doc) = PdfDocument::from_bytes(bytes) {
            for page in 0..doc.page_count() {
                let _ = doc.extract_text(page);
                let _ = doc.extract_images(page);
                let _ = doc.extract_fonts(page);
                let _ = doc.page_text(page);
            }
            let _ = doc.search("text", SearchOptions::default());
        }
    }
}
