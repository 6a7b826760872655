//! Single-byte font encodings and glyph names
//!
//! Used for simple fonts that carry no `/ToUnicode` map. Only the tables
//! needed for text recovery are kept: the Windows-1252 block of
//! `WinAnsiEncoding`, the upper half of `MacRomanEncoding`, the places where
//! `PDFDocEncoding` departs from Latin-1, and the quote characters where
//! `StandardEncoding` departs from ASCII.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    StandardEncoding,
    MacRomanEncoding,
    WinAnsiEncoding,
    PdfDocEncoding,
}

impl TextEncoding {
    /// Encoding for a `/Encoding` or `/BaseEncoding` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(TextEncoding::StandardEncoding),
            "MacRomanEncoding" => Some(TextEncoding::MacRomanEncoding),
            "WinAnsiEncoding" => Some(TextEncoding::WinAnsiEncoding),
            "PDFDocEncoding" => Some(TextEncoding::PdfDocEncoding),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::StandardEncoding => "StandardEncoding",
            TextEncoding::MacRomanEncoding => "MacRomanEncoding",
            TextEncoding::WinAnsiEncoding => "WinAnsiEncoding",
            TextEncoding::PdfDocEncoding => "PDFDocEncoding",
        }
    }

    /// Character for one code, `None` where the encoding leaves it undefined
    pub fn decode_byte(&self, byte: u8) -> Option<char> {
        match self {
            TextEncoding::WinAnsiEncoding => match byte {
                0x80..=0x9F => win_ansi_high(byte),
                _ => Some(char::from(byte)),
            },
            TextEncoding::PdfDocEncoding => match byte {
                0x18..=0x1F => Some(PDF_DOC_ACCENTS[usize::from(byte - 0x18)]),
                0x80..=0xA0 => pdf_doc_high(byte),
                0xAD => None,
                _ => Some(char::from(byte)),
            },
            TextEncoding::MacRomanEncoding => match byte {
                0x80..=0xFF => Some(MAC_ROMAN_HIGH[usize::from(byte - 0x80)]),
                _ => Some(char::from(byte)),
            },
            TextEncoding::StandardEncoding => match byte {
                0x27 => Some('\u{2019}'),
                0x60 => Some('\u{2018}'),
                0x00..=0x7F => Some(char::from(byte)),
                _ => None,
            },
        }
    }

    pub fn decode(&self, data: &[u8]) -> String {
        data.iter()
            .map(|&b| self.decode_byte(b).unwrap_or(char::from(b)))
            .collect()
    }
}

fn win_ansi_high(byte: u8) -> Option<char> {
    let ch = match byte {
        0x80 => '\u{20AC}', // Euro sign
        0x82 => '\u{201A}', // Single low quotation mark
        0x83 => '\u{0192}', // Latin small letter f with hook
        0x84 => '\u{201E}', // Double low quotation mark
        0x85 => '\u{2026}', // Horizontal ellipsis
        0x86 => '\u{2020}', // Dagger
        0x87 => '\u{2021}', // Double dagger
        0x88 => '\u{02C6}', // Circumflex accent
        0x89 => '\u{2030}', // Per mille sign
        0x8A => '\u{0160}', // Latin capital letter S with caron
        0x8B => '\u{2039}', // Single left angle quotation mark
        0x8C => '\u{0152}', // Latin capital ligature OE
        0x8E => '\u{017D}', // Latin capital letter Z with caron
        0x91 => '\u{2018}', // Left single quotation mark
        0x92 => '\u{2019}', // Right single quotation mark
        0x93 => '\u{201C}', // Left double quotation mark
        0x94 => '\u{201D}', // Right double quotation mark
        0x95 => '\u{2022}', // Bullet
        0x96 => '\u{2013}', // En dash
        0x97 => '\u{2014}', // Em dash
        0x98 => '\u{02DC}', // Small tilde
        0x99 => '\u{2122}', // Trade mark sign
        0x9A => '\u{0161}', // Latin small letter s with caron
        0x9B => '\u{203A}', // Single right angle quotation mark
        0x9C => '\u{0153}', // Latin small ligature oe
        0x9E => '\u{017E}', // Latin small letter z with caron
        0x9F => '\u{0178}', // Latin capital letter Y with diaeresis
        _ => return None,
    };
    Some(ch)
}

const PDF_DOC_ACCENTS: [char; 8] = ['˘', 'ˇ', 'ˆ', '˙', '˝', '˛', '˚', '˜'];

/// PDFDocEncoding departs from Latin-1 in 0x80..=0xA0; 0x9F is undefined
fn pdf_doc_high(byte: u8) -> Option<char> {
    #[rustfmt::skip]
    const TABLE: [char; 32] = [
        '•', '†', '‡', '…', '—', '–', 'ƒ', '⁄', '‹', '›', '−', '‰', '„', '“', '”', '‘',
        '’', '‚', '™', 'ﬁ', 'ﬂ', 'Ł', 'Œ', 'Š', 'Ÿ', 'Ž', 'ı', 'ł', 'œ', 'š', 'ž', '\0',
    ];
    match byte {
        0x9F => None,
        0xA0 => Some('€'),
        _ => TABLE.get(usize::from(byte.wrapping_sub(0x80))).copied(),
    }
}

#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Unicode character for a glyph name used in `/Differences`.
///
/// Covers single-letter names, the ASCII punctuation names, common Latin-1
/// accented letters, typographic punctuation, ligatures and the `uniXXXX` /
/// `uXXXX` conventions.
pub fn glyph_to_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }

    if let Some(hex) = name.strip_prefix("uni") {
        if let Some(code) = hex.get(..4) {
            return u32::from_str_radix(code, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code);
            }
        }
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotesinglbase" => '\u{201A}',
        "quotedblbase" => '\u{201E}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "perthousand" => '\u{2030}',
        "trademark" => '\u{2122}',
        "Euro" => '\u{20AC}',
        "copyright" => '©',
        "registered" => '®',
        "degree" => '°',
        "section" => '§',
        "paragraph" => '¶',
        "sterling" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "currency" => '¤',
        "germandbls" => 'ß',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "ff" => '\u{FB00}',
        "ffi" => '\u{FB03}',
        "ffl" => '\u{FB04}',
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acircumflex" => 'Â',
        "Adieresis" => 'Ä',
        "Aring" => 'Å',
        "Ccedilla" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecircumflex" => 'Ê',
        "Edieresis" => 'Ë',
        "Iacute" => 'Í',
        "Ntilde" => 'Ñ',
        "Oacute" => 'Ó',
        "Odieresis" => 'Ö',
        "Uacute" => 'Ú',
        "Udieresis" => 'Ü',
        "agrave" => 'à',
        "aacute" => 'á',
        "acircumflex" => 'â',
        "adieresis" => 'ä',
        "aring" => 'å',
        "ccedilla" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecircumflex" => 'ê',
        "edieresis" => 'ë',
        "iacute" => 'í',
        "icircumflex" => 'î',
        "idieresis" => 'ï',
        "ntilde" => 'ñ',
        "oacute" => 'ó',
        "ocircumflex" => 'ô',
        "odieresis" => 'ö',
        "uacute" => 'ú',
        "ucircumflex" => 'û',
        "udieresis" => 'ü',
        _ => return None,
    };
    Some(ch)
}
