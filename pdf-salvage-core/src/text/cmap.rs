//! ToUnicode CMap support for text extraction
//!
//! Parses the `beginbfchar` / `beginbfrange` sections of an embedded
//! ToUnicode CMap (ISO 32000-1:2008 Section 9.10.3) into a code-to-string
//! table. Sections may repeat; later entries override earlier ones.
//!
//! Destinations are UTF-16BE, so one code may map to several characters
//! (ligatures, surrogate pairs).

use crate::parser::lexer::{Lexer, Token};
use crate::text::encoding::glyph_to_char;
use std::collections::HashMap;

/// Largest bfrange expanded; wider ranges are clipped
const MAX_RANGE_SPAN: u32 = 0x1_0000;

/// Character code range mapping
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRange {
    /// Start of the code range
    pub start: Vec<u8>,
    /// End of the code range
    pub end: Vec<u8>,
}

impl CodeRange {
    /// Check if a code is within this range
    pub fn contains(&self, code: &[u8]) -> bool {
        if code.len() != self.start.len() || code.len() != self.end.len() {
            return false;
        }

        code >= &self.start[..] && code <= &self.end[..]
    }
}

/// Parsed ToUnicode CMap
#[derive(Debug, Clone, Default)]
pub struct CMap {
    /// CMap name
    pub name: Option<String>,
    /// Code space ranges
    pub codespace_ranges: Vec<CodeRange>,
    mappings: HashMap<u32, String>,
}

impl CMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CMap program. Malformed entries are skipped.
    pub fn parse(data: &[u8]) -> Self {
        let mut cmap = Self::new();
        let mut lexer = Lexer::new(data);

        while let Some(token) = lexer.next_token() {
            match token {
                Token::Name(ref name) if name == "CMapName" => {
                    if let Some(Token::Name(value)) = lexer.peek() {
                        lexer.next_token();
                        cmap.name = Some(value);
                    }
                }
                Token::Keyword(ref k) if k == "begincodespacerange" => {
                    let section = read_section(&mut lexer, "endcodespacerange");
                    for pair in section.chunks_exact(2) {
                        if let [Token::HexString(start), Token::HexString(end)] = pair {
                            cmap.codespace_ranges.push(CodeRange {
                                start: start.clone(),
                                end: end.clone(),
                            });
                        }
                    }
                }
                Token::Keyword(ref k) if k == "beginbfchar" => {
                    let section = read_section(&mut lexer, "endbfchar");
                    cmap.add_bf_chars(&section);
                }
                Token::Keyword(ref k) if k == "beginbfrange" => {
                    let section = read_section(&mut lexer, "endbfrange");
                    cmap.add_bf_ranges(&section);
                }
                _ => {}
            }
        }

        cmap
    }

    fn add_bf_chars(&mut self, tokens: &[Token]) {
        for pair in tokens.chunks_exact(2) {
            let [Token::HexString(src), dst] = pair else {
                tracing::trace!("Skipping malformed bfchar entry {pair:?}");
                continue;
            };
            let Some(code) = code_value(src) else {
                continue;
            };
            let text = match dst {
                Token::HexString(bytes) => utf16_be(bytes),
                Token::Name(glyph) => match glyph_to_char(glyph) {
                    Some(c) => c.to_string(),
                    None => continue,
                },
                _ => continue,
            };
            self.mappings.insert(code, text);
        }
    }

    fn add_bf_ranges(&mut self, tokens: &[Token]) {
        let mut i = 0;
        while i + 2 < tokens.len() {
            let (Token::HexString(lo), Token::HexString(hi)) = (&tokens[i], &tokens[i + 1]) else {
                i += 1;
                continue;
            };
            let (Some(lo), Some(hi)) = (code_value(lo), code_value(hi)) else {
                i += 3;
                continue;
            };
            let hi = hi.min(lo.saturating_add(MAX_RANGE_SPAN - 1));

            match &tokens[i + 2] {
                Token::HexString(start) => {
                    let start = utf16_be(start);
                    for (offset, code) in (lo..=hi).enumerate() {
                        if let Some(text) = increment_last(&start, offset as u32) {
                            self.mappings.insert(code, text);
                        }
                    }
                    i += 3;
                }
                Token::ArrayStart => {
                    let mut j = i + 3;
                    // None once the range is used up, including past u32::MAX
                    let mut code = Some(lo);
                    while let Some(token) = tokens.get(j) {
                        j += 1;
                        match token {
                            Token::ArrayEnd => break,
                            Token::HexString(bytes) => {
                                if let Some(c) = code.filter(|c| *c <= hi) {
                                    self.mappings.insert(c, utf16_be(bytes));
                                    code = c.checked_add(1);
                                }
                            }
                            _ => {}
                        }
                    }
                    i = j;
                }
                _ => i += 3,
            }
        }
    }

    /// Unicode text for a character code
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Check if a code is in valid codespace
    pub fn is_valid_code(&self, code: &[u8]) -> bool {
        self.codespace_ranges.iter().any(|range| range.contains(code))
    }
}

/// Tokens up to the `end` keyword, arrays left flat
fn read_section(lexer: &mut Lexer<'_>, end: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        if token.is_keyword(end) {
            break;
        }
        tokens.push(token);
    }
    tokens
}

/// Big-endian code value of at most four bytes
fn code_value(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 4 {
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

/// Decode UTF-16BE, keeping an odd trailing byte as its own code point
fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// `text` with its last character advanced by `offset`
fn increment_last(text: &str, offset: u32) -> Option<String> {
    let mut chars: Vec<char> = text.chars().collect();
    let last = chars.last_mut()?;
    *last = char::from_u32(u32::from(*last).checked_add(offset)?)?;
    Some(chars.into_iter().collect())
}
