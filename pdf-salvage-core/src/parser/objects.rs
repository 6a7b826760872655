//! PDF Object Parser
//!
//! Parses PDF objects from tokens according to ISO 32000-1 Section 7.3.
//!
//! Parsing is tolerant: an unterminated array or dictionary yields what was
//! read before the input ran out, and stray tokens where a key or value is
//! expected are skipped.

use super::lexer::{Lexer, Token};
use std::borrow::Borrow;
use std::collections::HashMap;

/// Nesting ceiling for arrays and dictionaries
const MAX_NESTING: usize = 256;

/// PDF Name object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdfName(pub String);

impl Borrow<str> for PdfName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How a string was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Literal,
    Hex,
}

/// PDF String object
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString {
    pub bytes: Vec<u8>,
    pub kind: StringKind,
}

/// PDF Array object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

/// PDF Dictionary object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub HashMap<PdfName, PdfObject>);

/// PDF Object types
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(PdfString),
    Name(PdfName),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Reference(u32, u16), // object number, generation number
}

/// Outcome of reading one value position
enum Parsed {
    Value(PdfObject),
    /// A structural keyword (`endobj`, `stream`, ...) ends the enclosing object
    Stop,
    /// A token that is not a value; the caller moves on
    Skip,
}

/// Keywords that can never appear inside an object body
fn is_terminator(keyword: &str) -> bool {
    matches!(
        keyword,
        "endobj" | "stream" | "endstream" | "obj" | "xref" | "trailer" | "startxref"
    )
}

impl PdfObject {
    /// Parse the next PDF object from a lexer.
    ///
    /// Returns `None` at end of input or when the next token is a structural
    /// keyword, in which case the lexer is left in front of that keyword.
    pub fn parse(lexer: &mut Lexer<'_>) -> Option<Self> {
        loop {
            match Self::parse_value(lexer, 0)? {
                Parsed::Value(obj) => return Some(obj),
                Parsed::Stop => return None,
                Parsed::Skip => continue,
            }
        }
    }

    /// Parse the first object in `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::parse(&mut Lexer::new(bytes))
    }

    fn parse_value(lexer: &mut Lexer<'_>, depth: usize) -> Option<Parsed> {
        let saved = lexer.offset();
        let token = lexer.next_token()?;

        let parsed = match token {
            Token::Number(n) => Parsed::Value(Self::number_or_reference(lexer, n)),
            Token::LiteralString(bytes) => Parsed::Value(PdfObject::String(PdfString {
                bytes,
                kind: StringKind::Literal,
            })),
            Token::HexString(bytes) => Parsed::Value(PdfObject::String(PdfString {
                bytes,
                kind: StringKind::Hex,
            })),
            Token::Name(name) => Parsed::Value(PdfObject::Name(PdfName(name))),
            Token::ArrayStart if depth >= MAX_NESTING => Parsed::Value(PdfObject::Null),
            Token::DictStart if depth >= MAX_NESTING => Parsed::Value(PdfObject::Null),
            Token::ArrayStart => Parsed::Value(Self::parse_array(lexer, depth + 1)),
            Token::DictStart => {
                Parsed::Value(PdfObject::Dictionary(Self::parse_dictionary(lexer, depth + 1)))
            }
            Token::Keyword(word) => match word.as_str() {
                "true" => Parsed::Value(PdfObject::Boolean(true)),
                "false" => Parsed::Value(PdfObject::Boolean(false)),
                "null" => Parsed::Value(PdfObject::Null),
                w if is_terminator(w) => {
                    lexer.set_position(saved);
                    Parsed::Stop
                }
                _ => Parsed::Skip,
            },
            Token::ArrayEnd | Token::DictEnd => Parsed::Skip,
        };

        Some(parsed)
    }

    /// Turn a number into an integer, a real, or the start of `N G R`.
    fn number_or_reference(lexer: &mut Lexer<'_>, n: f64) -> Self {
        if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
            let mut ahead = *lexer;
            if let Some(Token::Number(gen)) = ahead.next_token() {
                if gen >= 0.0 && gen.fract() == 0.0 && gen <= f64::from(u16::MAX) {
                    if let Some(Token::Keyword(k)) = ahead.next_token() {
                        if k == "R" {
                            *lexer = ahead;
                            return PdfObject::Reference(n as u32, gen as u16);
                        }
                    }
                }
            }
        }

        if n.fract() == 0.0 && n.abs() < 9.0e15 {
            PdfObject::Integer(n as i64)
        } else {
            PdfObject::Real(n)
        }
    }

    fn parse_array(lexer: &mut Lexer<'_>, depth: usize) -> Self {
        let mut elements = Vec::new();

        loop {
            let saved = lexer.offset();
            match lexer.peek() {
                None => break,
                Some(Token::ArrayEnd) => {
                    lexer.next_token();
                    break;
                }
                // `>>` inside an array means the array was never closed
                Some(Token::DictEnd) => {
                    lexer.set_position(saved);
                    break;
                }
                Some(_) => {}
            }
            match Self::parse_value(lexer, depth) {
                Some(Parsed::Value(obj)) => elements.push(obj),
                Some(Parsed::Skip) => {}
                Some(Parsed::Stop) | None => break,
            }
        }

        PdfObject::Array(PdfArray(elements))
    }

    fn parse_dictionary(lexer: &mut Lexer<'_>, depth: usize) -> PdfDictionary {
        let mut dict = HashMap::new();

        loop {
            let saved = lexer.offset();
            let Some(token) = lexer.next_token() else {
                break;
            };
            match token {
                Token::DictEnd => break,
                Token::Name(key) => match Self::parse_value(lexer, depth) {
                    Some(Parsed::Value(value)) => {
                        dict.insert(PdfName(key), value);
                    }
                    Some(Parsed::Skip) => {}
                    Some(Parsed::Stop) | None => break,
                },
                Token::Keyword(ref k) if is_terminator(k) => {
                    lexer.set_position(saved);
                    break;
                }
                // Stray token where a key belongs
                _ => {}
            }
        }

        PdfDictionary(dict)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfObject::Integer(i) => Some(*i as f64),
            PdfObject::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<(u32, u16)> {
        match self {
            PdfObject::Reference(num, gen) => Some((*num, *gen)),
            _ => None,
        }
    }
}

impl PdfDictionary {
    pub fn new() -> Self {
        PdfDictionary(HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PdfObject) {
        self.0.insert(PdfName(key.into()), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PdfName, &PdfObject)> {
        self.0.iter()
    }

    /// Get the dictionary type (value of /Type key)
    pub fn get_type(&self) -> Option<&str> {
        self.get_name("Type")
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PdfObject::as_name)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PdfObject::as_integer)
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PdfObject::as_number)
    }

    pub fn get_reference(&self, key: &str) -> Option<(u32, u16)> {
        self.get(key).and_then(PdfObject::as_reference)
    }
}

impl PdfArray {
    pub fn new() -> Self {
        PdfArray(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfObject> {
        self.0.iter()
    }

    /// All elements as numbers, or `None` if any element is not numeric
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        self.0.iter().map(PdfObject::as_number).collect()
    }
}

impl PdfString {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        PdfString {
            bytes: bytes.into(),
            kind: StringKind::Literal,
        }
    }

    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        PdfString {
            bytes: bytes.into(),
            kind: StringKind::Hex,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_hex(&self) -> bool {
        self.kind == StringKind::Hex
    }

    /// Lossy text form, used for names and metadata rather than shown text
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl PdfName {
    pub fn new(name: impl Into<String>) -> Self {
        PdfName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> Vec<PdfObject> {
        let mut lexer = Lexer::new(input);
        std::iter::from_fn(|| PdfObject::parse(&mut lexer)).collect()
    }

    #[test]
    fn test_parse_simple_objects() {
        let objects = parse_all(b"null true false 123 -456 3.14 /Name (Hello) <41>");
        assert_eq!(
            objects,
            vec![
                PdfObject::Null,
                PdfObject::Boolean(true),
                PdfObject::Boolean(false),
                PdfObject::Integer(123),
                PdfObject::Integer(-456),
                PdfObject::Real(3.14),
                PdfObject::Name(PdfName::new("Name")),
                PdfObject::String(PdfString::literal(b"Hello".to_vec())),
                PdfObject::String(PdfString::hex(b"A".to_vec())),
            ]
        );
    }

    #[test]
    fn test_parse_references() {
        let objects = parse_all(b"[1 0 R 2 5 R 3 4]");
        let array = objects[0].as_array().unwrap();
        assert_eq!(array.get(0).unwrap().as_reference(), Some((1, 0)));
        assert_eq!(array.get(1).unwrap().as_reference(), Some((2, 5)));
        assert_eq!(array.get(2).unwrap().as_integer(), Some(3));
        assert_eq!(array.get(3).unwrap().as_integer(), Some(4));
    }

    #[test]
    fn test_parse_dictionary() {
        let obj = PdfObject::from_bytes(b"<< /Type /Page /Parent 1 0 R /MediaBox [0 0 612 792] >>")
            .unwrap();
        let dict = obj.as_dict().unwrap();

        assert_eq!(dict.get_type(), Some("Page"));
        assert_eq!(dict.get_reference("Parent"), Some((1, 0)));
        assert_eq!(
            dict.get("MediaBox").unwrap().as_array().unwrap().as_numbers(),
            Some(vec![0.0, 0.0, 612.0, 792.0])
        );
    }

    #[test]
    fn test_parse_nested_dictionary_without_spaces() {
        let obj = PdfObject::from_bytes(b"<</Font<</F1 5 0 R/F2 6 0 R>>/XObject<<>>>>").unwrap();
        let fonts = obj.as_dict().unwrap().get("Font").unwrap().as_dict().unwrap();
        assert_eq!(fonts.get_reference("F1"), Some((5, 0)));
        assert_eq!(fonts.get_reference("F2"), Some((6, 0)));
    }

    #[test]
    fn test_unterminated_dictionary_keeps_parsed_entries() {
        let obj = PdfObject::from_bytes(b"<< /Type /Catalog /Pages 2 0 R").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get_type(), Some("Catalog"));
        assert_eq!(dict.get_reference("Pages"), Some((2, 0)));
    }

    #[test]
    fn test_dictionary_stops_at_structural_keyword() {
        let input = b"<< /Length 5 stream\nhello";
        let mut lexer = Lexer::new(input);
        let obj = PdfObject::parse(&mut lexer).unwrap();
        assert_eq!(obj.as_dict().unwrap().get_integer("Length"), Some(5));
        assert_eq!(lexer.next_token(), Some(Token::Keyword("stream".to_string())));
    }

    #[test]
    fn test_stray_tokens_are_skipped() {
        let obj = PdfObject::from_bytes(b"<< 42 /A 1 ] /B garbage /C 3 >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get_integer("A"), Some(1));
        assert_eq!(dict.get_integer("C"), Some(3));
        assert!(!dict.contains_key("B"));
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let mut input = Vec::new();
        input.extend(std::iter::repeat(b'[').take(10_000));
        input.extend(std::iter::repeat(b']').take(10_000));
        // Must not overflow the stack
        assert!(PdfObject::from_bytes(&input).is_some());
    }

    #[test]
    fn test_parse_returns_none_on_terminator() {
        let mut lexer = Lexer::new(b"endobj");
        assert!(PdfObject::parse(&mut lexer).is_none());
        assert_eq!(lexer.offset(), 0);
    }
}
