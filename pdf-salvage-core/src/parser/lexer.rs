//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. The same lexer
//! serves object syntax, content streams and embedded CMaps.
//!
//! The lexer works over a borrowed byte slice and never fails: unterminated
//! strings are truncated at end of input, stray delimiters come back as
//! one-character keywords, and malformed numbers read as zero.

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric operand, integer or real
    Number(f64),

    /// Literal string `( ... )` with escapes already decoded
    LiteralString(Vec<u8>),

    /// Hexadecimal string `< ... >` as decoded bytes
    HexString(Vec<u8>),

    /// Name object without the leading slash. `#xx` escapes are kept verbatim.
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Any other run of regular characters: `obj`, `R`, `true`, `Tj`, ...
    Keyword(String),
}

impl Token {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Keyword(k) if k == keyword)
    }
}

/// PDF Lexer over an in-memory buffer
#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer positioned at the start of `input`
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Create a lexer positioned at `offset` (clamped to the input length)
    pub fn at(input: &'a [u8], offset: usize) -> Self {
        Self {
            input,
            position: offset.min(input.len()),
        }
    }

    /// Byte offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.input.len());
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Look at the next token without consuming it
    pub fn peek(&self) -> Option<Token> {
        let mut copy = *self;
        copy.next_token()
    }

    /// Get the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let ch = *self.input.get(self.position)?;

        let token = match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.input.get(self.position + 1) == Some(&b'<') {
                    self.position += 2;
                    Token::DictStart
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.input.get(self.position + 1) == Some(&b'>') {
                    self.position += 2;
                    Token::DictEnd
                } else {
                    self.position += 1;
                    Token::Keyword(">".to_string())
                }
            }
            b'[' => {
                self.position += 1;
                Token::ArrayStart
            }
            b']' => {
                self.position += 1;
                Token::ArrayEnd
            }
            b')' | b'{' | b'}' => {
                self.position += 1;
                Token::Keyword((ch as char).to_string())
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
            _ => self.read_keyword(),
        };

        Some(token)
    }

    /// Skip whitespace and comments
    pub fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.get(self.position) {
            if is_whitespace(ch) {
                self.position += 1;
            } else if ch == b'%' {
                while let Some(&c) = self.input.get(self.position) {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.position += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Skip the binary payload of an inline image, positioned right after `ID`.
    ///
    /// Leaves the lexer after the terminating `EI`, or at end of input when
    /// no terminator is found.
    pub fn skip_inline_image_data(&mut self) {
        // A single whitespace byte separates ID from the data
        if self
            .input
            .get(self.position)
            .is_some_and(|&c| is_whitespace(c))
        {
            self.position += 1;
        }

        let mut cursor = self.position;
        while let Some(found) = find(self.input, b"EI", cursor) {
            let before_ok = found == 0 || is_whitespace(self.input[found - 1]);
            let after_ok = self
                .input
                .get(found + 2)
                .map_or(true, |&c| is_whitespace(c) || is_delimiter(c));
            if before_ok && after_ok {
                self.position = found + 2;
                return;
            }
            cursor = found + 1;
        }
        self.position = self.input.len();
    }

    fn read_name(&mut self) -> Token {
        self.position += 1; // consume '/'
        let start = self.position;
        while self
            .input
            .get(self.position)
            .is_some_and(|&c| is_regular(c))
        {
            self.position += 1;
        }
        Token::Name(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }

    fn read_literal_string(&mut self) -> Token {
        self.position += 1; // consume '('
        let mut string = Vec::new();
        let mut depth = 1usize;

        while let Some(&ch) = self.input.get(self.position) {
            self.position += 1;
            match ch {
                b'\\' => {
                    let Some(&next) = self.input.get(self.position) else {
                        break;
                    };
                    self.position += 1;
                    match next {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(b'\x08'),
                        b'f' => string.push(b'\x0C'),
                        b'(' | b')' | b'\\' => string.push(next),
                        b'0'..=b'7' => {
                            let mut value = u32::from(next - b'0');
                            for _ in 0..2 {
                                match self.input.get(self.position) {
                                    Some(&d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.position += 1;
                                    }
                                    _ => break,
                                }
                            }
                            string.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.input.get(self.position) == Some(&b'\n') {
                                self.position += 1;
                            }
                        }
                        b'\n' => {}
                        // Unknown escape: backslash is dropped
                        other => string.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    string.push(ch);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    string.push(ch);
                }
                _ => string.push(ch),
            }
        }

        Token::LiteralString(string)
    }

    fn read_hex_string(&mut self) -> Token {
        self.position += 1; // consume '<'
        let mut bytes = Vec::new();
        let mut high: Option<u8> = None;

        while let Some(&ch) = self.input.get(self.position) {
            self.position += 1;
            if ch == b'>' {
                break;
            }
            let Some(nibble) = hex_value(ch) else {
                continue;
            };
            match high.take() {
                Some(h) => bytes.push((h << 4) | nibble),
                None => high = Some(nibble),
            }
        }

        // Odd trailing nibble is zero-padded
        if let Some(h) = high {
            bytes.push(h << 4);
        }

        Token::HexString(bytes)
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        while self
            .input
            .get(self.position)
            .is_some_and(|&c| c.is_ascii_digit() || matches!(c, b'.' | b'+' | b'-'))
        {
            self.position += 1;
        }
        Token::Number(parse_number(&self.input[start..self.position]))
    }

    fn read_keyword(&mut self) -> Token {
        let start = self.position;
        while self
            .input
            .get(self.position)
            .is_some_and(|&c| is_regular(c))
        {
            self.position += 1;
        }
        if self.position == start {
            // Not reachable for regular input, but never stall
            self.position += 1;
        }
        Token::Keyword(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Read the token starting at or after `offset`, returning it with the offset past it.
pub fn next_token(input: &[u8], offset: usize) -> Option<(Token, usize)> {
    let mut lexer = Lexer::at(input, offset);
    let token = lexer.next_token()?;
    Some((token, lexer.offset()))
}

/// Parse the longest valid `[sign] digits [. digits]` prefix of a numeric run.
fn parse_number(run: &[u8]) -> f64 {
    let mut text = String::with_capacity(run.len());
    let mut seen_dot = false;
    let mut seen_digit = false;

    for (i, &c) in run.iter().enumerate() {
        match c {
            b'+' | b'-' if i == 0 => text.push(c as char),
            b'0'..=b'9' => {
                seen_digit = true;
                text.push(c as char);
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                text.push('.');
            }
            _ => break,
        }
    }

    if !seen_digit {
        return 0.0;
    }
    if text.ends_with('.') {
        text.push('0');
    }
    if text.starts_with('.') || text.starts_with("-.") || text.starts_with("+.") {
        text = text.replacen('.', "0.", 1);
    }
    text.parse::<f64>().unwrap_or(0.0)
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

/// PDF whitespace characters (Table 1)
pub(crate) fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

/// PDF delimiter characters (Table 2)
pub(crate) fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

pub(crate) fn is_regular(ch: u8) -> bool {
    !is_whitespace(ch) && !is_delimiter(ch)
}

/// Position of the first occurrence of `needle` at or after `from`.
pub(crate) fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Position of the last occurrence of `needle` that starts before `before`.
pub(crate) fn rfind(haystack: &[u8], needle: &[u8], before: usize) -> Option<usize> {
    let end = before.min(haystack.len());
    if needle.is_empty() || end < needle.len() {
        return None;
    }
    haystack[..end]
        .windows(needle.len())
        .rposition(|w| w == needle)
}
