//! Font dictionaries as seen by text extraction
//!
//! [`FontInfo`] collects what decoding and positioning need from a font
//! dictionary: how codes are split (one byte for simple fonts, two for
//! composite `Type0` fonts), how they map to Unicode, and how wide each
//! glyph is. Everything is optional; a font with nothing usable still
//! decodes as single-byte text with half-em advances.

use crate::parser::objects::{PdfDictionary, PdfObject, PdfString};
use crate::parser::resolver::Resolver;
use crate::text::cmap::CMap;
use crate::text::encoding::{glyph_to_char, TextEncoding};
use std::collections::HashMap;

/// Advance used when a font gives no width for a code, in glyph space
const FALLBACK_WIDTH: f64 = 500.0;

/// How character codes are laid out in strings shown with a font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EncodingMode {
    /// One byte per code
    Simple,
    /// Two bytes per code (composite fonts, `Identity-H` and friends)
    Cid,
}

/// Glyph widths in thousandths of text space
#[derive(Debug, Clone, Default)]
pub struct GlyphWidths {
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: Option<f64>,
}

impl GlyphWidths {
    pub fn width(&self, code: u32) -> f64 {
        if let Some(w) = self.cid_widths.get(&code) {
            return *w;
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .or(self.default_width)
            .unwrap_or(FALLBACK_WIDTH)
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty() && self.cid_widths.is_empty() && self.default_width.is_none()
    }
}

/// Embedded font program
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedProgram {
    /// `FontFile`, `FontFile2` or `FontFile3`
    pub key: String,
    pub object_number: u32,
    /// Stream bytes, inflated when the stream was Flate-compressed
    pub data: Vec<u8>,
}

/// Everything text extraction uses from one font dictionary
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub object_number: u32,
    /// `/Subtype`: Type1, TrueType, Type0, Type3, ...
    pub subtype: String,
    /// `/BaseFont`, empty when absent
    pub base_font: String,
    /// Encoding name as written (`WinAnsiEncoding`, `Identity-H`, ...)
    pub encoding_name: Option<String>,
    pub mode: EncodingMode,
    pub to_unicode: Option<CMap>,
    base_encoding: Option<TextEncoding>,
    differences: HashMap<u8, char>,
    widths: GlyphWidths,
    pub embedded: Option<EmbeddedProgram>,
}

impl FontInfo {
    /// Read the font dictionary stored in `object_number`.
    ///
    /// Dictionaries typed as something other than `/Font`, or untyped ones
    /// with neither `/Subtype` nor `/BaseFont`, are not fonts.
    pub fn load(resolver: &Resolver<'_>, object_number: u32) -> Option<Self> {
        let dict = resolver.object(object_number)?.dict()?;
        let is_font = match dict.get_type() {
            Some(kind) => kind == "Font",
            None => dict.contains_key("Subtype") || dict.contains_key("BaseFont"),
        };
        if !is_font {
            return None;
        }
        Some(Self::from_dict(resolver, object_number, dict))
    }

    pub fn from_dict(resolver: &Resolver<'_>, object_number: u32, dict: &PdfDictionary) -> Self {
        let subtype = dict
            .get("Subtype")
            .and_then(|v| resolver.resolve_name(v))
            .unwrap_or("Unknown")
            .to_string();
        let base_font = dict
            .get("BaseFont")
            .and_then(|v| resolver.resolve_name(v))
            .unwrap_or_default()
            .to_string();

        let mode = if subtype == "Type0" {
            EncodingMode::Cid
        } else {
            EncodingMode::Simple
        };

        let mut info = FontInfo {
            object_number,
            subtype,
            base_font,
            encoding_name: None,
            mode,
            to_unicode: None,
            base_encoding: None,
            differences: HashMap::new(),
            widths: GlyphWidths::default(),
            embedded: None,
        };

        info.read_encoding(resolver, dict);
        info.to_unicode = dict.get("ToUnicode").and_then(|v| load_cmap(resolver, v));

        match mode {
            EncodingMode::Simple => {
                info.widths = simple_widths(resolver, dict);
                info.embedded = dict
                    .get("FontDescriptor")
                    .and_then(|d| resolver.resolve_dict(d))
                    .and_then(|d| embedded_program(resolver, d));
            }
            EncodingMode::Cid => {
                // Metrics and the program live on the descendant CIDFont
                let descendant = dict
                    .get("DescendantFonts")
                    .and_then(|v| resolver.resolve_array(v))
                    .and_then(|a| a.get(0))
                    .and_then(|v| resolver.resolve_dict(v));
                if let Some(descendant) = descendant {
                    info.widths = cid_widths(resolver, descendant);
                    info.embedded = descendant
                        .get("FontDescriptor")
                        .and_then(|d| resolver.resolve_dict(d))
                        .and_then(|d| embedded_program(resolver, d));
                }
            }
        }

        info
    }

    fn read_encoding(&mut self, resolver: &Resolver<'_>, dict: &PdfDictionary) {
        let Some(encoding) = dict.get("Encoding").and_then(|v| resolver.resolve(v)) else {
            return;
        };
        match encoding {
            PdfObject::Name(name) => {
                self.encoding_name = Some(name.as_str().to_string());
                self.base_encoding = TextEncoding::from_name(name.as_str());
            }
            PdfObject::Dictionary(enc) => {
                let base = enc.get("BaseEncoding").and_then(|v| resolver.resolve_name(v));
                self.encoding_name = Some(base.unwrap_or("Custom").to_string());
                self.base_encoding = base.and_then(TextEncoding::from_name);
                let diffs = enc.get("Differences").and_then(|v| resolver.resolve_array(v));
                if let Some(diffs) = diffs {
                    self.differences = parse_differences(diffs.iter());
                }
            }
            // Embedded CMap streams for composite fonts
            _ => {
                if self.mode == EncodingMode::Cid {
                    self.encoding_name = Some("Embedded".to_string());
                }
            }
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    /// Split a shown string into character codes
    pub fn codes(&self, string: &PdfString) -> Vec<u32> {
        let bytes = string.as_bytes();
        match self.mode {
            EncodingMode::Simple => bytes.iter().map(|&b| u32::from(b)).collect(),
            EncodingMode::Cid => bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
                .collect(),
        }
    }

    /// Width of a code in thousandths of text space
    pub fn glyph_width(&self, code: u32) -> f64 {
        self.widths.width(code)
    }

    /// Character for a single-byte code through `/Differences` and the base encoding
    pub fn simple_char(&self, byte: u8) -> char {
        if let Some(c) = self.differences.get(&byte) {
            return *c;
        }
        self.base_encoding
            .and_then(|e| e.decode_byte(byte))
            .unwrap_or(char::from(byte))
    }

    pub fn has_simple_encoding(&self) -> bool {
        self.base_encoding.is_some() || !self.differences.is_empty()
    }
}

fn load_cmap(resolver: &Resolver<'_>, value: &PdfObject) -> Option<CMap> {
    let raw = resolver.resolve_raw(value)?;
    if !raw.pending_filters().is_empty() {
        tracing::debug!(
            "ToUnicode stream {} still encoded with {:?}",
            raw.object_number,
            raw.pending_filters()
        );
        return None;
    }
    let cmap = CMap::parse(raw.stream()?);
    (!cmap.is_empty()).then_some(cmap)
}

fn parse_differences<'o>(items: impl Iterator<Item = &'o PdfObject>) -> HashMap<u8, char> {
    let mut differences = HashMap::new();
    let mut code: Option<u32> = None;
    for item in items {
        match item {
            PdfObject::Integer(n) => code = u32::try_from(*n).ok(),
            PdfObject::Name(name) => {
                if let Some(c) = code {
                    if let (Ok(byte), Some(ch)) = (u8::try_from(c), glyph_to_char(name.as_str())) {
                        differences.insert(byte, ch);
                    }
                    code = c.checked_add(1);
                }
            }
            _ => {}
        }
    }
    differences
}

fn simple_widths(resolver: &Resolver<'_>, dict: &PdfDictionary) -> GlyphWidths {
    let first_char = dict
        .get("FirstChar")
        .and_then(|v| resolver.resolve_number(v))
        .filter(|n| *n >= 0.0)
        .map_or(0, |n| n as u32);
    let widths = dict
        .get("Widths")
        .and_then(|v| resolver.resolve_array(v))
        .map(|a| {
            a.iter()
                .map(|w| resolver.resolve_number(w).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();
    let missing_width = dict
        .get("FontDescriptor")
        .and_then(|d| resolver.resolve_dict(d))
        .and_then(|d| d.get("MissingWidth"))
        .and_then(|v| resolver.resolve_number(v))
        .filter(|w| *w > 0.0);

    GlyphWidths {
        first_char,
        widths,
        cid_widths: HashMap::new(),
        default_width: missing_width,
    }
}

/// `/DW` and `/W` of a CIDFont. `/W` mixes `c [w1 w2 ...]` and `c_first c_last w`.
fn cid_widths(resolver: &Resolver<'_>, dict: &PdfDictionary) -> GlyphWidths {
    let default_width = dict
        .get("DW")
        .and_then(|v| resolver.resolve_number(v))
        .unwrap_or(1000.0);

    let mut cid_widths = HashMap::new();
    if let Some(w) = dict.get("W").and_then(|v| resolver.resolve_array(v)) {
        let items: Vec<&PdfObject> = w.iter().collect();
        let mut i = 0;
        while i < items.len() {
            let Some(first) = resolver.resolve_number(items[i]).filter(|n| *n >= 0.0) else {
                i += 1;
                continue;
            };
            let first = first as u32;
            match items.get(i + 1).map(|v| resolver.resolve(v)) {
                Some(Some(PdfObject::Array(list))) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(width) = resolver.resolve_number(width) {
                            cid_widths.insert(first.saturating_add(offset as u32), width);
                        }
                    }
                    i += 2;
                }
                Some(Some(last)) => {
                    let last = last.as_number().filter(|n| *n >= 0.0).map_or(first, |n| n as u32);
                    let width = items.get(i + 2).and_then(|v| resolver.resolve_number(v));
                    if let Some(width) = width {
                        // Clip absurd ranges
                        for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                            cid_widths.insert(cid, width);
                        }
                    }
                    i += 3;
                }
                _ => break,
            }
        }
    }

    GlyphWidths {
        first_char: 0,
        widths: Vec::new(),
        cid_widths,
        default_width: Some(default_width),
    }
}

fn embedded_program(
    resolver: &Resolver<'_>,
    descriptor: &PdfDictionary,
) -> Option<EmbeddedProgram> {
    ["FontFile", "FontFile2", "FontFile3"].into_iter().find_map(|key| {
        let raw = resolver.resolve_raw(descriptor.get(key)?)?;
        Some(EmbeddedProgram {
            key: key.to_string(),
            object_number: raw.object_number,
            data: raw.stream()?.to_vec(),
        })
    })
}
