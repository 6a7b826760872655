//! PDF Content Stream Parser
//!
//! Turns the token stream of a page's drawing program into the operators
//! needed for text and image extraction. Operands accumulate on a stack that
//! is cleared at every operator; each operator takes what it needs from the
//! top. An operator with missing or mistyped operands is dropped and parsing
//! carries on with the next one.
//!
//! Operators that do not affect text or image placement (paths, colors,
//! marked content) are consumed and discarded.

use super::lexer::{Lexer, Token};
use super::objects::PdfString;

/// Nesting limit for operand arrays
const MAX_ARRAY_DEPTH: usize = 32;

/// Represents a single operator in a PDF content stream
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    // Graphics state operators
    SaveGraphicsState,                                // q
    RestoreGraphicsState,                             // Q
    SetTransformMatrix(f64, f64, f64, f64, f64, f64), // cm

    // Text object operators
    BeginText, // BT
    EndText,   // ET

    // Text state operators
    SetCharSpacing(f64),       // Tc
    SetWordSpacing(f64),       // Tw
    SetHorizontalScaling(f64), // Tz
    SetLeading(f64),           // TL
    SetFont(String, f64),      // Tf
    SetTextRise(f64),          // Ts

    // Text positioning operators
    MoveText(f64, f64),                          // Td
    MoveTextSetLeading(f64, f64),                // TD
    SetTextMatrix(f64, f64, f64, f64, f64, f64), // Tm
    NextLine,                                    // T*

    // Text showing operators
    ShowText(PdfString),                             // Tj
    ShowTextArray(Vec<TextElement>),                 // TJ
    NextLineShowText(PdfString),                     // '
    SetSpacingNextLineShowText(f64, f64, PdfString), // "

    // XObject operators
    PaintXObject(String), // Do
}

/// Represents a text element in a TJ array
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    Text(PdfString),
    Spacing(f64),
}

/// Operand accumulated ahead of an operator
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Number(f64),
    String(PdfString),
    Name(String),
    Array(Vec<Operand>),
    /// Booleans, null and dictionaries; only their position matters
    Other,
}

/// Content stream parser
#[derive(Debug, Clone)]
pub struct ContentParser<'a> {
    lexer: Lexer<'a>,
    operands: Vec<Operand>,
}

impl<'a> ContentParser<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(content),
            operands: Vec::new(),
        }
    }

    /// Parse a whole content stream
    pub fn parse(content: &[u8]) -> Vec<ContentOperation> {
        ContentParser::new(content).collect()
    }

    fn read_array(&mut self, depth: usize) -> Vec<Operand> {
        let mut items = Vec::new();
        loop {
            let saved = self.lexer.offset();
            let Some(token) = self.lexer.next_token() else {
                break;
            };
            match token {
                Token::ArrayEnd => break,
                Token::ArrayStart if depth < MAX_ARRAY_DEPTH => {
                    items.push(Operand::Array(self.read_array(depth + 1)))
                }
                Token::Keyword(ref k) if !is_literal_keyword(k) => {
                    // Unterminated array; let the operator through
                    self.lexer.set_position(saved);
                    break;
                }
                other => {
                    if let Some(operand) = self.simple_operand(other) {
                        items.push(operand);
                    }
                }
            }
        }
        items
    }

    fn skip_dictionary(&mut self) {
        let mut depth = 1usize;
        while let Some(token) = self.lexer.next_token() {
            match token {
                Token::DictStart => depth += 1,
                Token::DictEnd => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    fn simple_operand(&mut self, token: Token) -> Option<Operand> {
        Some(match token {
            Token::Number(n) => Operand::Number(n),
            Token::LiteralString(bytes) => Operand::String(PdfString::literal(bytes)),
            Token::HexString(bytes) => Operand::String(PdfString::hex(bytes)),
            Token::Name(name) => Operand::Name(name),
            Token::DictStart => {
                self.skip_dictionary();
                Operand::Other
            }
            Token::Keyword(_) => Operand::Other,
            Token::ArrayStart | Token::ArrayEnd | Token::DictEnd => return None,
        })
    }

    /// Skip `BI <params> ID <data> EI`, positioned after `BI`
    fn skip_inline_image(&mut self) {
        while let Some(token) = self.lexer.next_token() {
            if token.is_keyword("ID") {
                self.lexer.skip_inline_image_data();
                return;
            }
            if token.is_keyword("EI") {
                return;
            }
        }
    }

    fn operation(&self, operator: &str) -> Option<ContentOperation> {
        let ops = &self.operands;
        let op = match operator {
            "q" => ContentOperation::SaveGraphicsState,
            "Q" => ContentOperation::RestoreGraphicsState,
            "cm" => {
                let [a, b, c, d, e, f] = numbers(ops)?;
                ContentOperation::SetTransformMatrix(a, b, c, d, e, f)
            }

            "BT" => ContentOperation::BeginText,
            "ET" => ContentOperation::EndText,

            "Tc" => ContentOperation::SetCharSpacing(number(ops)?),
            "Tw" => ContentOperation::SetWordSpacing(number(ops)?),
            "Tz" => ContentOperation::SetHorizontalScaling(number(ops)?),
            "TL" => ContentOperation::SetLeading(number(ops)?),
            "Ts" => ContentOperation::SetTextRise(number(ops)?),
            "Tf" => {
                let [size] = numbers(ops)?;
                match ops.len().checked_sub(2).and_then(|i| ops.get(i)) {
                    Some(Operand::Name(name)) => ContentOperation::SetFont(name.clone(), size),
                    _ => return None,
                }
            }

            "Td" => {
                let [tx, ty] = numbers(ops)?;
                ContentOperation::MoveText(tx, ty)
            }
            "TD" => {
                let [tx, ty] = numbers(ops)?;
                ContentOperation::MoveTextSetLeading(tx, ty)
            }
            "Tm" => {
                let [a, b, c, d, e, f] = numbers(ops)?;
                ContentOperation::SetTextMatrix(a, b, c, d, e, f)
            }
            "T*" => ContentOperation::NextLine,

            "Tj" => ContentOperation::ShowText(last_string(ops)?),
            "'" => ContentOperation::NextLineShowText(last_string(ops)?),
            "\"" => {
                let string = last_string(ops)?;
                let position = ops.iter().rposition(|o| matches!(o, Operand::String(_)))?;
                let [aw, ac] = numbers(&ops[..position])?;
                ContentOperation::SetSpacingNextLineShowText(aw, ac, string)
            }
            "TJ" => match ops.last() {
                Some(Operand::Array(items)) => ContentOperation::ShowTextArray(
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Operand::String(s) => Some(TextElement::Text(s.clone())),
                            Operand::Number(n) => Some(TextElement::Spacing(*n)),
                            _ => None,
                        })
                        .collect(),
                ),
                _ => return None,
            },

            "Do" => match ops.last() {
                Some(Operand::Name(name)) => ContentOperation::PaintXObject(name.clone()),
                _ => return None,
            },

            _ => return None,
        };
        Some(op)
    }
}

impl Iterator for ContentParser<'_> {
    type Item = ContentOperation;

    fn next(&mut self) -> Option<ContentOperation> {
        loop {
            let token = self.lexer.next_token()?;
            let operator = match token {
                Token::Keyword(word) if !is_literal_keyword(&word) => word,
                Token::ArrayStart => {
                    let items = self.read_array(1);
                    self.operands.push(Operand::Array(items));
                    continue;
                }
                other => {
                    if let Some(operand) = self.simple_operand(other) {
                        self.operands.push(operand);
                    }
                    continue;
                }
            };

            if operator == "BI" {
                self.skip_inline_image();
                self.operands.clear();
                continue;
            }

            let op = self.operation(&operator);
            if op.is_none() && is_known_operator(&operator) {
                tracing::trace!(
                    "Skipping '{operator}' with unusable operands {:?}",
                    self.operands
                );
            }
            self.operands.clear();
            if let Some(op) = op {
                return Some(op);
            }
        }
    }
}

fn is_literal_keyword(word: &str) -> bool {
    matches!(word, "true" | "false" | "null")
}

fn is_known_operator(word: &str) -> bool {
    matches!(
        word,
        "cm" | "Tc" | "Tw" | "Tz" | "TL" | "Ts" | "Tf" | "Td"
            | "TD" | "Tm" | "Tj" | "'" | "\"" | "TJ" | "Do"
    )
}

/// The top `N` operands, all of which must be numbers
fn numbers<const N: usize>(operands: &[Operand]) -> Option<[f64; N]> {
    let start = operands.len().checked_sub(N)?;
    let mut values = [0.0; N];
    for (slot, operand) in values.iter_mut().zip(&operands[start..]) {
        match operand {
            Operand::Number(n) => *slot = *n,
            _ => return None,
        }
    }
    Some(values)
}

fn number(operands: &[Operand]) -> Option<f64> {
    numbers::<1>(operands).map(|[n]| n)
}

/// Nearest string operand, looking past numbers and arrays only
fn last_string(operands: &[Operand]) -> Option<PdfString> {
    for operand in operands.iter().rev() {
        match operand {
            Operand::String(s) => return Some(s.clone()),
            Operand::Number(_) | Operand::Array(_) => continue,
            _ => return None,
        }
    }
    None
}
