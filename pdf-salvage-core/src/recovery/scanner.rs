//! PDF object scanner for recovery operations
//!
//! Finds every `N G obj` header in a buffer with one linear pass. A match is
//! accepted only when two whitespace-separated integers sit directly in front
//! of the keyword at a token boundary, and each accepted stream's data is
//! skipped whole, so binary payloads that happen to contain `obj` are not
//! mistaken for objects.

use crate::parser::lexer::{self, is_regular, is_whitespace};
use crate::parser::objects::{PdfDictionary, PdfObject};
use crate::parser::store::{read_header, span_from_body, stream_extent, ObjectSpan};
use std::collections::HashMap;

/// A scanned object header
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedObject {
    /// Object ID
    pub id: u32,
    /// Generation number
    pub generation: u16,
    /// File offset of the header
    pub offset: usize,
}

/// Scan statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanStats {
    /// Total bytes scanned
    pub bytes_scanned: usize,
    /// Number of object headers accepted, duplicates included
    pub objects_found: usize,
    /// Candidate `obj` keywords rejected as not being headers
    pub candidates_rejected: usize,
    /// Stream bodies jumped over
    pub streams_skipped: usize,
}

/// Result of scanning operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Object spans, the last definition of each number winning
    pub(crate) spans: HashMap<u32, ObjectSpan>,
    /// Headers of the winning definitions, in file order
    pub objects: Vec<ScannedObject>,
    /// `trailer` dictionaries, in file order
    pub trailers: Vec<PdfDictionary>,
    /// Scan statistics
    pub stats: ScanStats,
}

/// Scanner for finding PDF objects without an index
#[derive(Debug, Default)]
pub struct ObjectScanner {
    stats: ScanStats,
}

impl ObjectScanner {
    /// Create a new object scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a whole buffer for object headers and trailer dictionaries
    pub fn scan(mut self, input: &[u8]) -> ScanResult {
        let mut spans: HashMap<u32, ObjectSpan> = HashMap::new();
        let mut headers: HashMap<u32, ScannedObject> = HashMap::new();
        let mut pos = 0;

        while let Some(found) = lexer::find(input, b"obj", pos) {
            let Some(header_start) = header_start_before(input, found) else {
                self.stats.candidates_rejected += 1;
                pos = found + 3;
                continue;
            };
            let Some((id, generation, body_start)) = read_header(input, header_start) else {
                self.stats.candidates_rejected += 1;
                pos = found + 3;
                continue;
            };

            let span = span_from_body(input, id, generation, body_start);
            pos = match span.stream_keyword_end {
                Some(keyword_end) => {
                    let declared = PdfObject::from_bytes(&input[span.body.clone()])
                        .and_then(|o| o.as_dict().and_then(|d| d.get_integer("Length")));
                    self.stats.streams_skipped += 1;
                    stream_extent(input, keyword_end, declared).end
                }
                None => span.body.end,
            }
            .max(found + 3);

            self.stats.objects_found += 1;
            // Keep-last-wins, as with incremental updates
            spans.insert(id, span);
            headers.insert(
                id,
                ScannedObject {
                    id,
                    generation,
                    offset: header_start,
                },
            );
        }

        self.stats.bytes_scanned = input.len();

        let mut objects: Vec<ScannedObject> = headers.into_values().collect();
        objects.sort_by_key(|o| o.offset);

        ScanResult {
            spans,
            objects,
            trailers: scan_trailers(input),
            stats: self.stats,
        }
    }
}

/// Offset of `N G` when the `obj` keyword at `keyword` follows it directly.
fn header_start_before(input: &[u8], keyword: usize) -> Option<usize> {
    // `obj` must be a whole keyword
    if input.get(keyword + 3).is_some_and(|&c| is_regular(c)) {
        return None;
    }

    let mut i = keyword;
    i = skip_back(input, i, is_whitespace, 1)?;
    i = skip_back(input, i, |c| c.is_ascii_digit(), 1)?;
    i = skip_back(input, i, is_whitespace, 1)?;
    i = skip_back(input, i, |c| c.is_ascii_digit(), 1)?;

    if i > 0 && is_regular(input[i - 1]) {
        return None;
    }
    Some(i)
}

/// Step back over at least `min` bytes matching `pred`, returning the new start.
fn skip_back(input: &[u8], mut i: usize, pred: impl Fn(u8) -> bool, min: usize) -> Option<usize> {
    let end = i;
    while i > 0 && pred(input[i - 1]) {
        i -= 1;
    }
    (end - i >= min).then_some(i)
}

/// Every dictionary following a `trailer` keyword
fn scan_trailers(input: &[u8]) -> Vec<PdfDictionary> {
    let mut trailers = Vec::new();
    let mut pos = 0;
    while let Some(found) = lexer::find(input, b"trailer", pos) {
        pos = found + b"trailer".len();
        if input.get(pos).is_some_and(|&c| is_regular(c)) {
            continue;
        }
        let mut lexer = lexer::Lexer::at(input, pos);
        if let Some(PdfObject::Dictionary(dict)) = PdfObject::parse(&mut lexer) {
            trailers.push(dict);
            pos = lexer.offset().max(pos);
        }
    }
    trailers
}
