//! Object Store
//!
//! Builds the table from object number to [`RawObject`] once per document.
//! Two load strategies are tried in order:
//!
//! 1. **Indexed**: follow `startxref` to the cross-reference chain (classic
//!    tables, xref streams, `/Prev` and `/XRefStm` links) and read each object
//!    at its recorded offset, unpacking object streams for compressed entries.
//! 2. **Recovered**: scan the whole buffer for `N G obj` headers
//!    (see [`crate::recovery`]).
//!
//! The indexed result is only kept when every recorded offset points at the
//! object it claims to and the catalog has a `/Pages` entry. A single
//! malformed object never fails the load; only a missing catalog does.

use super::filters::decode_stream;
use super::lexer::{self, Lexer, Token};
use super::object_stream::ObjectStream;
use super::objects::{PdfArray, PdfDictionary, PdfObject};
use super::xref::XRefTable;
use super::xref_stream::XRefEntry;
use super::{Diagnostics, ParseError, ParseOptions, ParseResult, RecoveryMode};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::OnceLock;

/// Object number to object, built once per document
pub type ObjectTable = HashMap<u32, RawObject>;

/// Which strategy produced the object table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LoadStrategy {
    /// Read through the cross-reference index
    Indexed,
    /// Rebuilt by scanning the whole buffer
    Recovered,
}

/// One indirect object: its unparsed body plus decoded stream bytes.
///
/// The body is parsed on first access and cached, so a `RawObject` can be
/// shared across threads once the store is built.
#[derive(Debug, Clone)]
pub struct RawObject {
    pub object_number: u32,
    pub generation: u16,
    body: Vec<u8>,
    stream: Option<Vec<u8>>,
    pending_filters: Vec<String>,
    parsed: OnceLock<PdfObject>,
}

impl RawObject {
    /// Object without a stream
    pub fn new(object_number: u32, generation: u16, body: Vec<u8>) -> Self {
        Self {
            object_number,
            generation,
            body,
            stream: None,
            pending_filters: Vec::new(),
            parsed: OnceLock::new(),
        }
    }

    /// Attach stream bytes. `pending_filters` lists filters still applied to them.
    pub fn with_stream(mut self, data: Vec<u8>, pending_filters: Vec<String>) -> Self {
        self.stream = Some(data);
        self.pending_filters = pending_filters;
        self
    }

    /// The unparsed object body (for streams, the dictionary text)
    pub fn dict_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parsed body; `Null` when the body holds no parsable object
    pub fn value(&self) -> &PdfObject {
        self.parsed
            .get_or_init(|| PdfObject::from_bytes(&self.body).unwrap_or(PdfObject::Null))
    }

    pub fn dict(&self) -> Option<&PdfDictionary> {
        self.value().as_dict()
    }

    /// Look up a key in the object's dictionary
    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.dict().and_then(|d| d.get(key))
    }

    /// Value of `/Type`
    pub fn object_type(&self) -> Option<&str> {
        self.dict().and_then(PdfDictionary::get_type)
    }

    /// Stream bytes, decoded as far as the supported filters allow
    pub fn stream(&self) -> Option<&[u8]> {
        self.stream.as_deref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Filters that could not be applied to [`RawObject::stream`]
    pub fn pending_filters(&self) -> &[String] {
        &self.pending_filters
    }
}

/// Location of one `N G obj` body in the buffer
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectSpan {
    pub object_number: u32,
    pub generation: u16,
    pub body: Range<usize>,
    /// Offset just past the `stream` keyword, when there is one
    pub stream_keyword_end: Option<usize>,
}

/// Read `N G obj` at `offset`, returning number, generation and body start.
pub(crate) fn read_header(input: &[u8], offset: usize) -> Option<(u32, u16, usize)> {
    let mut lexer = Lexer::at(input, offset);
    let number = match lexer.next_token()? {
        Token::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => n as u32,
        _ => return None,
    };
    let generation = match lexer.next_token()? {
        Token::Number(g) if g >= 0.0 && g.fract() == 0.0 && g <= f64::from(u16::MAX) => g as u16,
        _ => return None,
    };
    match lexer.next_token()? {
        Token::Keyword(k) if k == "obj" => Some((number, generation, lexer.offset())),
        _ => None,
    }
}

/// Locate the object whose header starts at `offset`
pub(crate) fn scan_span(input: &[u8], offset: usize) -> Option<ObjectSpan> {
    let (object_number, generation, body_start) = read_header(input, offset)?;
    Some(span_from_body(input, object_number, generation, body_start))
}

/// Walk the body tokens until the keyword that ends the object.
pub(crate) fn span_from_body(
    input: &[u8],
    object_number: u32,
    generation: u16,
    body_start: usize,
) -> ObjectSpan {
    let mut lexer = Lexer::at(input, body_start);
    // Start offsets of the two previous tokens, when they were numbers
    let mut numbers_before: [Option<usize>; 2] = [None, None];

    let (body_end, stream_keyword_end) = loop {
        lexer.skip_whitespace();
        let token_start = lexer.offset();
        let Some(token) = lexer.next_token() else {
            break (input.len(), None);
        };
        match token {
            Token::Keyword(ref k) => match k.as_str() {
                "endobj" | "endstream" | "xref" | "trailer" | "startxref" => {
                    break (token_start, None)
                }
                "stream" => break (token_start, Some(lexer.offset())),
                // Next header reached without endobj
                "obj" => match numbers_before {
                    [Some(num_start), Some(_)] => break (num_start, None),
                    _ => break (token_start, None),
                },
                _ => numbers_before = [None, None],
            },
            Token::Number(_) => numbers_before = [numbers_before[1], Some(token_start)],
            _ => numbers_before = [None, None],
        }
    };

    ObjectSpan {
        object_number,
        generation,
        body: body_start..body_end.max(body_start),
        stream_keyword_end,
    }
}

/// Byte range of a stream's data, plus the offset past `endstream`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StreamExtent {
    pub data: Range<usize>,
    pub end: usize,
}

/// Find where a stream's data lies, given the offset past `stream`.
///
/// A declared length is used only when `endstream` follows it; otherwise the
/// data runs to the next `endstream` (or `endobj`), minus the EOL before it.
pub(crate) fn stream_extent(
    input: &[u8],
    keyword_end: usize,
    declared_length: Option<i64>,
) -> StreamExtent {
    let rest = input.get(keyword_end..).unwrap_or_default();
    let data_start = keyword_end
        + if rest.starts_with(b"\r\n") {
            2
        } else if rest.starts_with(b"\n") || rest.starts_with(b"\r") {
            1
        } else {
            0
        };

    if let Some(length) = declared_length.and_then(|l| usize::try_from(l).ok()) {
        if let Some(data_end) = data_start.checked_add(length).filter(|e| *e <= input.len()) {
            let mut after = data_end;
            while input.get(after).is_some_and(|&c| lexer::is_whitespace(c)) {
                after += 1;
            }
            if input[after..].starts_with(b"endstream") {
                return StreamExtent {
                    data: data_start..data_end,
                    end: after + b"endstream".len(),
                };
            }
        }
        tracing::debug!("Declared stream length {length} does not reach endstream, scanning");
    }

    let (terminator, end) = match lexer::find(input, b"endstream", data_start) {
        Some(pos) => (pos, pos + b"endstream".len()),
        None => match lexer::find(input, b"endobj", data_start) {
            Some(pos) => (pos, pos),
            None => (input.len(), input.len()),
        },
    };

    let mut data_end = terminator;
    if input[..data_end].ends_with(b"\r\n") {
        data_end -= 2;
    } else if input[..data_end].ends_with(b"\n") || input[..data_end].ends_with(b"\r") {
        data_end -= 1;
    }

    StreamExtent {
        data: data_start..data_end.max(data_start),
        end,
    }
}

/// Turn a span into a [`RawObject`], decoding its stream.
///
/// `value_of` looks up a non-stream object among the objects already
/// located; it resolves an indirect `/Length`, `/Filter` or `/DecodeParms`.
pub(crate) fn materialize(
    input: &[u8],
    span: &ObjectSpan,
    value_of: &dyn Fn(u32) -> Option<PdfObject>,
) -> RawObject {
    let raw = RawObject::new(
        span.object_number,
        span.generation,
        input[span.body.clone()].to_vec(),
    );

    let Some(keyword_end) = span.stream_keyword_end else {
        return raw;
    };

    let mut dict = raw.dict().cloned().unwrap_or_default();
    let declared_length = match dict.get("Length") {
        Some(PdfObject::Integer(len)) => Some(*len),
        Some(PdfObject::Reference(num, _)) => value_of(*num).and_then(|o| o.as_integer()),
        _ => None,
    };
    for key in ["Filter", "DecodeParms"] {
        if let Some(value) = dict.get(key) {
            let resolved = resolve_one_level(value, value_of);
            dict.insert(key, resolved);
        }
    }

    let extent = stream_extent(input, keyword_end, declared_length);
    let decoded = decode_stream(&input[extent.data], &dict);
    raw.with_stream(decoded.data, decoded.pending_filters)
}

/// Replace a reference, or references held directly in an array, with the
/// objects they name. Unknown references are left in place.
fn resolve_one_level(
    value: &PdfObject,
    value_of: &dyn Fn(u32) -> Option<PdfObject>,
) -> PdfObject {
    let lookup = |item: &PdfObject| match item {
        PdfObject::Reference(num, _) => value_of(*num).unwrap_or_else(|| item.clone()),
        other => other.clone(),
    };
    match lookup(value) {
        PdfObject::Array(array) => PdfObject::Array(PdfArray(array.iter().map(lookup).collect())),
        other => other,
    }
}

/// Materialize every span, resolving indirect stream entries through the span table.
pub(crate) fn materialize_all(input: &[u8], spans: &HashMap<u32, ObjectSpan>) -> ObjectTable {
    let value_of = |num: u32| {
        spans
            .get(&num)
            .filter(|s| s.stream_keyword_end.is_none())
            .and_then(|s| PdfObject::from_bytes(&input[s.body.clone()]))
    };

    spans
        .iter()
        .map(|(&num, span)| (num, materialize(input, span, &value_of)))
        .collect()
}

/// A freshly loaded object table with its trailer
#[derive(Debug)]
pub(crate) struct LoadedTable {
    pub objects: ObjectTable,
    pub trailer: PdfDictionary,
    pub strategy: LoadStrategy,
    /// Index entries whose offset did not hold the object they claimed
    pub mismatches: usize,
}

impl LoadedTable {
    /// Catalog reference from the trailer, if that object is present
    pub fn root(&self) -> Option<(u32, u16)> {
        let (num, gen) = self.trailer.get_reference("Root")?;
        self.objects
            .get(&num)
            .filter(|o| o.dict().is_some())
            .map(|_| (num, gen))
    }

    /// Minimal sanity check for keeping an indexed load
    pub fn is_consistent(&self) -> bool {
        self.mismatches == 0
            && self
                .root()
                .and_then(|(num, _)| self.objects.get(&num))
                .is_some_and(|catalog| catalog.get("Pages").is_some())
    }
}

/// Load through the cross-reference index
fn load_indexed(input: &[u8], diag: &mut Diagnostics) -> ParseResult<LoadedTable> {
    let start = XRefTable::find_startxref(input).ok_or(ParseError::InvalidXRef)?;
    let table = XRefTable::load_chain(input, start, diag)?;

    let mut spans = HashMap::new();
    let mut compressed: BTreeMap<u32, Vec<(u32, u32)>> = BTreeMap::new();
    let mut mismatches = 0;

    for (&num, entry) in table.iter() {
        match *entry {
            XRefEntry::InUse { offset, .. } => {
                let span = usize::try_from(offset)
                    .ok()
                    .and_then(|offset| scan_span(input, offset));
                match span {
                    Some(span) if span.object_number == num => {
                        spans.insert(num, span);
                    }
                    Some(span) => {
                        tracing::debug!(
                            "Xref entry for object {num} points at object {}",
                            span.object_number
                        );
                        mismatches += 1;
                    }
                    None => {
                        tracing::debug!("Xref entry for object {num} points at no object header");
                        mismatches += 1;
                    }
                }
            }
            XRefEntry::Compressed {
                stream_object_number,
                index_within_stream,
            } => compressed
                .entry(stream_object_number)
                .or_default()
                .push((num, index_within_stream)),
            XRefEntry::Free { .. } => {}
        }
    }

    let mut objects = materialize_all(input, &spans);

    let mut unpacked = Vec::new();
    for (stream_num, members) in compressed {
        let Some(container) = objects.get(&stream_num) else {
            diag.warn(format!("Object stream {stream_num} is missing"));
            continue;
        };
        let stream = match ObjectStream::parse(container) {
            Ok(stream) => stream,
            Err(e) => {
                diag.warn(format!("Skipping object stream {stream_num}: {e}"));
                continue;
            }
        };
        for (num, index) in members {
            match stream.get(num, index) {
                Some(raw) => unpacked.push((num, raw)),
                None => tracing::debug!("Object {num} not found in object stream {stream_num}"),
            }
        }
    }
    for (num, raw) in unpacked {
        objects.entry(num).or_insert(raw);
    }

    Ok(LoadedTable {
        objects,
        trailer: table.trailer().clone(),
        strategy: LoadStrategy::Indexed,
        mismatches,
    })
}

/// Loaded, immutable object store for one document
#[derive(Debug)]
pub struct ObjectStore {
    objects: ObjectTable,
    trailer: PdfDictionary,
    root: (u32, u16),
    strategy: LoadStrategy,
    version: Option<String>,
    warnings: Vec<String>,
}

impl ObjectStore {
    /// Build the object table from a complete document buffer.
    ///
    /// Fails only when neither strategy finds a document catalog.
    pub fn load(input: &[u8], options: &ParseOptions) -> ParseResult<Self> {
        let mut diag = Diagnostics::new(options.collect_warnings);

        let version = parse_version(input);
        if version.is_none() {
            diag.warn("No %PDF- header found");
        }

        let indexed = match options.recovery {
            RecoveryMode::Always => None,
            RecoveryMode::Auto | RecoveryMode::Never => match load_indexed(input, &mut diag) {
                Ok(table) => Some(table),
                Err(e) => {
                    diag.warn(format!("Cross-reference index unusable: {e}"));
                    None
                }
            },
        };

        let loaded = match indexed {
            Some(table) if table.is_consistent() => table,
            Some(table) if options.recovery == RecoveryMode::Never => {
                if table.root().is_none() {
                    return Err(ParseError::MissingRoot(
                        "catalog not reachable through the cross-reference index".to_string(),
                    ));
                }
                table
            }
            None if options.recovery == RecoveryMode::Never => {
                return Err(ParseError::MissingRoot(
                    "cross-reference index unusable and recovery disabled".to_string(),
                ));
            }
            indexed => {
                if let Some(table) = &indexed {
                    diag.warn(format!(
                        "Cross-reference index inconsistent ({} misplaced objects), rescanning",
                        table.mismatches
                    ));
                }
                match crate::recovery::recover(input, &mut diag) {
                    Ok(recovered) => recovered,
                    Err(e) => match indexed {
                        Some(table) if table.root().is_some() => {
                            diag.warn(format!("Recovery scan failed ({e}), keeping indexed load"));
                            table
                        }
                        _ => return Err(e),
                    },
                }
            }
        };

        let root = loaded.root().ok_or_else(|| {
            ParseError::MissingRoot("trailer /Root does not name a catalog object".to_string())
        })?;

        if loaded.trailer.contains_key("Encrypt") {
            diag.warn("Document is encrypted; streams are read without decryption");
        }

        tracing::debug!(
            "Loaded {} objects ({:?}), catalog {} {}",
            loaded.objects.len(),
            loaded.strategy,
            root.0,
            root.1
        );

        Ok(ObjectStore {
            objects: loaded.objects,
            trailer: loaded.trailer,
            root,
            strategy: loaded.strategy,
            version,
            warnings: diag.into_warnings(),
        })
    }

    pub fn get(&self, object_number: u32) -> Option<&RawObject> {
        self.objects.get(&object_number)
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn trailer(&self) -> &PdfDictionary {
        &self.trailer
    }

    /// Catalog object number and generation
    pub fn root(&self) -> (u32, u16) {
        self.root
    }

    pub fn catalog(&self) -> Option<&RawObject> {
        self.get(self.root.0)
    }

    pub fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    /// Version from the `%PDF-x.y` header
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Warnings kept when `collect_warnings` was set
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Version string following `%PDF-` near the start of the buffer
fn parse_version(input: &[u8]) -> Option<String> {
    let window = &input[..input.len().min(1024)];
    let start = lexer::find(window, b"%PDF-", 0)? + b"%PDF-".len();
    let version: String = window[start..]
        .iter()
        .take_while(|c| c.is_ascii_digit() || **c == b'.')
        .map(|&c| c as char)
        .collect();
    (!version.is_empty()).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::filters::UNRESOLVED_FILTER;

    /// Assemble objects and a classic xref table with correct offsets
    fn build_pdf(objects: &[&str]) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }

    fn minimal_objects() -> Vec<&'static str> {
        vec![
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
            "<< /Length 13 >>\nstream\nBT (Hi) Tj ET\nendstream",
        ]
    }

    #[test]
    fn test_read_header() {
        assert_eq!(read_header(b"12 0 obj <<>>", 0), Some((12, 0, 8)));
        assert_eq!(read_header(b"  7 3 obj", 0), Some((7, 3, 9)));
        assert_eq!(read_header(b"12 0 R", 0), None);
        assert_eq!(read_header(b"-1 0 obj", 0), None);
    }

    #[test]
    fn test_span_stops_at_endobj_and_stream() {
        let input = b"1 0 obj << /A (endobj) >> endobj";
        let span = scan_span(input, 0).unwrap();
        assert_eq!(&input[span.body.clone()], b" << /A (endobj) >> ");
        assert!(span.stream_keyword_end.is_none());

        let input = b"2 0 obj << /Length 3 >> stream\nabc\nendstream endobj";
        let span = scan_span(input, 0).unwrap();
        assert_eq!(span.stream_keyword_end, Some(30));
    }

    #[test]
    fn test_span_without_endobj_stops_before_next_header() {
        let input = b"1 0 obj << /A 1 >>\n2 0 obj << /B 2 >> endobj";
        let span = scan_span(input, 0).unwrap();
        assert_eq!(&input[span.body.clone()], b" << /A 1 >>\n");
    }

    #[test]
    fn test_stream_extent_with_declared_length() {
        let input = b"stream\r\nabc\r\nendstream";
        let extent = stream_extent(input, 6, Some(3));
        assert_eq!(&input[extent.data.clone()], b"abc");
        assert_eq!(extent.end, input.len());
    }

    #[test]
    fn test_stream_extent_with_wrong_length_scans() {
        let input = b"stream\nabcdef\nendstream";
        let extent = stream_extent(input, 6, Some(2));
        assert_eq!(&input[extent.data.clone()], b"abcdef");

        let extent = stream_extent(input, 6, None);
        assert_eq!(&input[extent.data], b"abcdef");
    }

    #[test]
    fn test_stream_extent_without_endstream() {
        let input = b"stream\nabc\nendobj trailing";
        let extent = stream_extent(input, 6, None);
        assert_eq!(&input[extent.data], b"abc");
    }

    #[test]
    fn test_indirect_length_is_resolved() {
        let input =
            b"4 0 obj << /Length 5 0 R >> stream\nab\nendstream\nendstream endobj\n5 0 obj 12 \
              endobj";
        let mut spans = HashMap::new();
        spans.insert(4, scan_span(input, 0).unwrap());
        let five = lexer::find(input, b"5 0 obj", 0).unwrap();
        spans.insert(5, scan_span(input, five).unwrap());

        let table = materialize_all(input, &spans);
        assert_eq!(table[&4].stream(), Some(&b"ab\nendstream"[..]));
        assert_eq!(table[&5].value(), &PdfObject::Integer(12));
    }

    #[test]
    fn test_indirect_filter_entries() {
        let input = b"4 0 obj << /Length 4 /Filter 5 0 R >> stream\ndata\nendstream endobj\n\
                      5 0 obj [/DCTDecode] endobj\n\
                      6 0 obj << /Length 4 /Filter [9 0 R] >> stream\ndata\nendstream endobj";
        let mut spans = HashMap::new();
        for (num, header) in [(4, &b"4 0 obj"[..]), (5, b"5 0 obj"), (6, b"6 0 obj")] {
            let at = lexer::find(input, header, 0).unwrap();
            spans.insert(num, scan_span(input, at).unwrap());
        }

        let table = materialize_all(input, &spans);
        assert_eq!(table[&4].pending_filters(), ["DCTDecode".to_string()]);
        assert_eq!(table[&4].stream(), Some(&b"data"[..]));
        // A dangling reference is never taken for "no filter"
        assert_eq!(table[&6].pending_filters(), [UNRESOLVED_FILTER.to_string()]);
    }

    #[test]
    fn test_raw_object_lazy_dict() {
        let raw = RawObject::new(3, 0, b"<< /Type /Font /BaseFont /Helvetica >>".to_vec());
        assert_eq!(raw.object_type(), Some("Font"));
        assert_eq!(raw.get("BaseFont").and_then(|o| o.as_name()), Some("Helvetica"));
        assert!(raw.dict_text().contains("/Helvetica"));
        assert!(!raw.has_stream());

        let junk = RawObject::new(4, 0, b"endobj".to_vec());
        assert!(junk.value().is_null());
        assert!(junk.dict().is_none());
    }

    #[test]
    fn test_load_indexed() {
        let pdf = build_pdf(&minimal_objects());
        let store = ObjectStore::load(&pdf, &ParseOptions::default()).unwrap();

        assert_eq!(store.strategy(), LoadStrategy::Indexed);
        assert_eq!(store.len(), 4);
        assert_eq!(store.root(), (1, 0));
        assert_eq!(store.version(), Some("1.4"));
        assert_eq!(store.get(4).and_then(|o| o.stream()), Some(&b"BT (Hi) Tj ET"[..]));
    }

    #[test]
    fn test_corrupt_offsets_fall_back_to_recovery() {
        let mut pdf = build_pdf(&minimal_objects());
        // Shift every object by inserting padding after the header
        pdf.splice(9..9, b"% padding that moves every object\n".iter().copied());

        let store = ObjectStore::load(&pdf, &ParseOptions::lenient()).unwrap();
        assert_eq!(store.strategy(), LoadStrategy::Recovered);
        assert_eq!(store.root(), (1, 0));
        assert!(!store.warnings().is_empty());
    }

    #[test]
    fn test_strict_mode_refuses_broken_index() {
        let pdf = b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n";
        let result = ObjectStore::load(pdf, &ParseOptions::strict());
        assert!(matches!(result, Err(ParseError::MissingRoot(_))));

        let store = ObjectStore::load(pdf, &ParseOptions::default()).unwrap();
        assert_eq!(store.strategy(), LoadStrategy::Recovered);
    }

    #[test]
    fn test_no_catalog_is_fatal() {
        assert!(matches!(
            ObjectStore::load(b"", &ParseOptions::default()),
            Err(ParseError::MissingRoot(_))
        ));
        let no_root = b"%PDF-1.7\n1 0 obj 42 endobj";
        assert!(ObjectStore::load(no_root, &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_encrypt_is_only_a_warning() {
        let mut pdf = build_pdf(&minimal_objects());
        let text = String::from_utf8(pdf.clone()).unwrap();
        let patched = text.replace("/Root 1 0 R", "/Root 1 0 R /Encrypt 9 0 R");
        pdf = patched.into_bytes();

        let store = ObjectStore::load(&pdf, &ParseOptions::lenient()).unwrap();
        assert!(store.warnings().iter().any(|w| w.contains("encrypted")));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(b"%PDF-1.7\n"), Some("1.7".to_string()));
        assert_eq!(parse_version(b"garbage %PDF-2.0 x"), Some("2.0".to_string()));
        assert_eq!(parse_version(b"no header"), None);
    }
}
