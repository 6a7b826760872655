//! PDF Cross-Reference Table Parser
//!
//! Parses xref tables according to ISO 32000-1 Section 7.5.4, and follows
//! the chain of sections an incrementally updated file accumulates: classic
//! tables, cross-reference streams (Section 7.5.8), `/Prev` links and the
//! `/XRefStm` link of hybrid files.

use super::lexer::{self, Lexer, Token};
use super::objects::{PdfDictionary, PdfObject};
use super::store::{materialize, scan_span};
use super::xref_stream::{XRefEntry, XRefStream};
use super::{Diagnostics, ParseError, ParseResult};
use std::collections::{HashMap, HashSet};

/// Upper bound on sections followed through `/Prev`
const MAX_SECTIONS: usize = 1024;

/// Merged cross-reference table
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    /// Map of object number to xref entry
    entries: HashMap<u32, XRefEntry>,
    /// Trailer dictionary, newest keys winning
    trailer: PdfDictionary,
}

/// One section: its entries and its trailer dictionary
struct Section {
    entries: Vec<(u32, XRefEntry)>,
    trailer: PdfDictionary,
}

impl XRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset recorded after the last `startxref` keyword
    pub fn find_startxref(input: &[u8]) -> Option<usize> {
        let keyword = lexer::rfind(input, b"startxref", input.len())?;
        let mut lexer = Lexer::at(input, keyword + b"startxref".len());
        match lexer.next_token()? {
            Token::Number(n) if n >= 0.0 && n.fract() == 0.0 => usize::try_from(n as u64).ok(),
            _ => None,
        }
    }

    /// Load the section at `start` and every older section it links to.
    ///
    /// Newer sections win on conflicting entries. Damaged older sections are
    /// skipped; only an unreadable newest section fails the load.
    pub(crate) fn load_chain(
        input: &[u8],
        start: usize,
        diag: &mut Diagnostics,
    ) -> ParseResult<Self> {
        let mut table = XRefTable::new();
        let mut visited = HashSet::new();
        let mut pending = vec![start];

        while let Some(offset) = pending.pop() {
            if !visited.insert(offset) {
                diag.warn(format!("Cross-reference chain loops back to offset {offset}"));
                continue;
            }
            if visited.len() > MAX_SECTIONS {
                diag.warn("Cross-reference chain too long, ignoring older sections");
                break;
            }

            let section = match Self::parse_section_at(input, offset) {
                Ok(section) => section,
                Err(e) if table.trailer.is_empty() => return Err(e),
                Err(e) => {
                    diag.warn(format!("Skipping cross-reference section at {offset}: {e}"));
                    continue;
                }
            };

            let prev = section.trailer.get_integer("Prev").and_then(to_offset);
            let is_classic = section.trailer.get_type() != Some("XRef");
            let mut section_entries: HashMap<u32, XRefEntry> =
                section.entries.into_iter().collect();

            // Hybrid file: the referenced stream fills the table's gaps
            let xref_stm = section
                .trailer
                .get_integer("XRefStm")
                .and_then(to_offset)
                .filter(|_| is_classic);
            if let Some(stm) = xref_stm {
                if visited.insert(stm) {
                    match Self::parse_section_at(input, stm) {
                        Ok(extra) => {
                            for (num, entry) in extra.entries {
                                if section_entries.get(&num).map_or(true, XRefEntry::is_free) {
                                    section_entries.insert(num, entry);
                                }
                            }
                        }
                        Err(e) => diag.warn(format!("Skipping /XRefStm at {stm}: {e}")),
                    }
                }
            }

            for (num, entry) in section_entries {
                table.entries.entry(num).or_insert(entry);
            }
            for (key, value) in section.trailer.0 {
                table.trailer.0.entry(key).or_insert(value);
            }

            if let Some(prev) = prev {
                pending.push(prev);
            }
        }

        // /Prev and /XRefStm describe the chain, not the document
        table.trailer.0.remove("Prev");
        table.trailer.0.remove("XRefStm");

        Ok(table)
    }

    /// Parse either a classic table or an xref stream at `offset`
    fn parse_section_at(input: &[u8], offset: usize) -> ParseResult<Section> {
        let mut lexer = Lexer::at(input, offset);
        match lexer.peek() {
            Some(Token::Keyword(k)) if k == "xref" => {
                lexer.next_token();
                Self::parse_classic(&mut lexer)
            }
            Some(Token::Number(_)) => Self::parse_stream_section(input, offset),
            _ => Err(ParseError::InvalidXRef),
        }
    }

    /// Parse a classic table positioned after the `xref` keyword
    fn parse_classic(lexer: &mut Lexer<'_>) -> ParseResult<Section> {
        let mut entries = Vec::new();

        loop {
            match lexer.next_token() {
                Some(Token::Keyword(k)) if k == "trailer" => break,
                Some(Token::Number(first)) => {
                    let Some(Token::Number(count)) = lexer.next_token() else {
                        return Err(ParseError::InvalidXRef);
                    };
                    if first < 0.0 || count < 0.0 {
                        return Err(ParseError::InvalidXRef);
                    }
                    for i in 0..count as u64 {
                        let row = (lexer.next_token(), lexer.next_token(), lexer.next_token());
                        let entry = match row {
                            (
                                Some(Token::Number(offset)),
                                Some(Token::Number(gen)),
                                Some(Token::Keyword(flag)),
                            ) => Self::parse_xref_entry(offset, gen, &flag)?,
                            _ => return Err(ParseError::InvalidXRef),
                        };
                        let Ok(num) = u32::try_from(first as u64 + i) else {
                            return Err(ParseError::InvalidXRef);
                        };
                        entries.push((num, entry));
                    }
                }
                _ => return Err(ParseError::InvalidXRef),
            }
        }

        let trailer = PdfObject::parse(lexer)
            .and_then(|obj| match obj {
                PdfObject::Dictionary(dict) => Some(dict),
                _ => None,
            })
            .ok_or(ParseError::InvalidTrailer)?;

        Ok(Section { entries, trailer })
    }

    /// Interpret one `offset generation n|f` row
    fn parse_xref_entry(offset: f64, generation: f64, flag: &str) -> ParseResult<XRefEntry> {
        if offset < 0.0 || generation < 0.0 {
            return Err(ParseError::InvalidXRef);
        }
        let generation = generation.min(f64::from(u16::MAX)) as u16;
        match flag {
            // Offset 0 cannot hold an object header
            "n" if offset > 0.0 => Ok(XRefEntry::InUse {
                offset: offset as u64,
                generation,
            }),
            "n" | "f" => Ok(XRefEntry::Free {
                next_free_object: offset as u32,
                generation,
            }),
            _ => Err(ParseError::InvalidXRef),
        }
    }

    /// Parse a cross-reference stream object at `offset`
    fn parse_stream_section(input: &[u8], offset: usize) -> ParseResult<Section> {
        let span = scan_span(input, offset).ok_or(ParseError::InvalidXRef)?;
        let raw = materialize(input, &span, &|_| None);
        if raw.object_type() != Some("XRef") {
            return Err(ParseError::InvalidXRef);
        }
        if !raw.pending_filters().is_empty() {
            return Err(ParseError::StreamDecodeError(format!(
                "xref stream still encoded with {:?}",
                raw.pending_filters()
            )));
        }
        let dict = raw.dict().cloned().ok_or(ParseError::InvalidXRef)?;
        let data = raw.stream().unwrap_or_default().to_vec();

        let stream = XRefStream::parse(dict, data)?;
        Ok(Section {
            entries: stream.to_xref_entries(),
            trailer: stream.dict,
        })
    }

    /// Get an xref entry by object number
    pub fn get_entry(&self, obj_num: u32) -> Option<&XRefEntry> {
        self.entries.get(&obj_num)
    }

    /// Merged trailer dictionary
    pub fn trailer(&self) -> &PdfDictionary {
        &self.trailer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &XRefEntry)> {
        self.entries.iter()
    }
}

fn to_offset(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}
