//! Decoding shown strings to Unicode
//!
//! Dispatch order:
//! - literal strings starting with the UTF-16BE byte-order mark decode as UTF-16BE;
//! - with a ToUnicode map, codes go through the map, and unmapped codes are
//!   taken as Unicode scalars rather than dropped; hex strings under a
//!   composite font use two-byte codes, literal strings always one byte each;
//! - hex strings under a composite font without a map decode as UTF-16BE;
//! - everything else is single-byte text, through the font's `/Differences`
//!   and base encoding when it has them, Latin-1 otherwise.

use crate::parser::objects::PdfString;
use crate::text::font::{EncodingMode, FontInfo};

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];

/// Decode a shown string with the font active when it was shown
pub fn decode_text(string: &PdfString, font: Option<&FontInfo>) -> String {
    let bytes = string.as_bytes();

    if !string.is_hex() && bytes.starts_with(&UTF16_BOM) {
        return utf16_be(&bytes[2..]);
    }

    let Some(font) = font else {
        return latin1(bytes);
    };

    if let Some(cmap) = &font.to_unicode {
        let two_byte = string.is_hex() && font.mode == EncodingMode::Cid && bytes.len() % 2 == 0;
        let codes: Vec<u32> = if two_byte {
            bytes
                .chunks_exact(2)
                .map(|pair| u32::from(u16::from_be_bytes([pair[0], pair[1]])))
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        };

        let mut text = String::with_capacity(codes.len());
        for code in codes {
            match cmap.lookup(code) {
                Some(mapped) => text.push_str(mapped),
                None => text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
            }
        }
        return text;
    }

    match font.mode {
        EncodingMode::Cid if string.is_hex() => utf16_be(bytes),
        EncodingMode::Cid => latin1(bytes),
        EncodingMode::Simple => bytes.iter().map(|&b| font.simple_char(b)).collect(),
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
