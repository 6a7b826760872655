//! Content stream interpreter
//!
//! Replays the operators of one content stream against a graphics state and
//! reports what is drawn to a [`ContentSink`]: one [`TextRun`] per show-text
//! operator and one callback per `Do`.
//!
//! Positions are reported in a top-left origin with y growing downwards:
//! `x` is measured from the left edge of the media box and `y` from its top
//! edge. `q`/`Q` keep a full state stack; `Q` with nothing saved goes back
//! to the state the interpreter started with.

use super::state::GraphicsState;
use crate::geometry::{Matrix, Point};
use crate::parser::content::{ContentOperation, ContentParser, TextElement};
use crate::parser::objects::PdfString;

/// Saved states kept before further `q` operators are ignored
const MAX_STATE_DEPTH: usize = 256;

/// Width of a shown string, in text space units before scaling by the font size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StringMetrics {
    /// Sum of glyph widths, in em
    pub width: f64,
    /// Number of character codes
    pub codes: usize,
    /// Single-byte code 32 occurrences, which receive word spacing
    pub spaces: usize,
}

impl StringMetrics {
    /// Half an em per byte, used when nothing is known about the font
    pub fn estimate(string: &PdfString) -> Self {
        let bytes = string.as_bytes();
        Self {
            width: bytes.len() as f64 * 0.5,
            codes: bytes.len(),
            spaces: bytes.iter().filter(|&&b| b == b' ').count(),
        }
    }
}

/// A show-text event
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Font resource name in effect, empty when no `Tf` was seen
    pub font_name: String,
    /// Size given to `Tf`
    pub font_size: f64,
    /// Font size after the text and transformation matrices
    pub effective_size: f64,
    /// Start of the run, top-left origin
    pub position: Point,
    /// Horizontal advance of the run on the page
    pub width: f64,
    /// Strings shown, in order; `TJ` arrays give several
    pub strings: Vec<PdfString>,
}

/// Receives what a content stream draws
pub trait ContentSink {
    /// Measure a string in the named font
    fn measure(&mut self, font_name: &str, string: &PdfString) -> StringMetrics {
        let _ = font_name;
        StringMetrics::estimate(string)
    }

    fn text_shown(&mut self, run: TextRun);

    /// `Do` with the transformation in effect
    fn xobject_invoked(&mut self, name: &str, ctm: &Matrix);
}

/// Interpreter for one content stream
#[derive(Debug, Clone)]
pub struct ContentInterpreter {
    media_box: [f64; 4],
    initial: GraphicsState,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl ContentInterpreter {
    pub fn new(media_box: [f64; 4]) -> Self {
        Self::with_ctm(media_box, Matrix::identity())
    }

    /// Start from a transformation other than identity (form XObjects)
    pub fn with_ctm(media_box: [f64; 4], ctm: Matrix) -> Self {
        let initial = GraphicsState::with_ctm(ctm);
        Self {
            media_box,
            state: initial.clone(),
            initial,
            stack: Vec::new(),
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
        }
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    /// Parse and replay a whole content stream
    pub fn run<S: ContentSink + ?Sized>(&mut self, content: &[u8], sink: &mut S) {
        for op in ContentParser::new(content) {
            self.execute(op, sink);
        }
    }

    pub fn execute<S: ContentSink + ?Sized>(&mut self, op: ContentOperation, sink: &mut S) {
        match op {
            ContentOperation::SaveGraphicsState => {
                if self.stack.len() < MAX_STATE_DEPTH {
                    self.stack.push(self.state.clone());
                } else {
                    tracing::trace!("Graphics state stack full, ignoring q");
                }
            }
            ContentOperation::RestoreGraphicsState => {
                self.state = self.stack.pop().unwrap_or_else(|| self.initial.clone());
            }
            ContentOperation::SetTransformMatrix(a, b, c, d, e, f) => {
                self.state.ctm = Matrix::new(a, b, c, d, e, f).multiply(&self.state.ctm);
            }

            ContentOperation::BeginText => {
                self.text_matrix = Matrix::identity();
                self.line_matrix = Matrix::identity();
            }
            ContentOperation::EndText => {}

            ContentOperation::SetCharSpacing(v) => self.state.text.char_spacing = v,
            ContentOperation::SetWordSpacing(v) => self.state.text.word_spacing = v,
            ContentOperation::SetHorizontalScaling(v) => {
                self.state.text.horizontal_scaling = v / 100.0
            }
            ContentOperation::SetLeading(v) => self.state.text.leading = v,
            ContentOperation::SetTextRise(v) => self.state.text.rise = v,
            ContentOperation::SetFont(name, size) => {
                self.state.text.font_name = Some(name);
                self.state.text.font_size = size;
            }

            ContentOperation::MoveText(tx, ty) => self.move_text(tx, ty),
            ContentOperation::MoveTextSetLeading(tx, ty) => {
                self.state.text.leading = -ty;
                self.move_text(tx, ty);
            }
            ContentOperation::SetTextMatrix(a, b, c, d, e, f) => {
                self.text_matrix = Matrix::new(a, b, c, d, e, f);
                self.line_matrix = self.text_matrix;
            }
            ContentOperation::NextLine => self.next_line(),

            ContentOperation::ShowText(string) => self.show(vec![TextElement::Text(string)], sink),
            ContentOperation::ShowTextArray(elements) => self.show(elements, sink),
            ContentOperation::NextLineShowText(string) => {
                self.next_line();
                self.show(vec![TextElement::Text(string)], sink);
            }
            ContentOperation::SetSpacingNextLineShowText(aw, ac, string) => {
                self.state.text.word_spacing = aw;
                self.state.text.char_spacing = ac;
                self.next_line();
                self.show(vec![TextElement::Text(string)], sink);
            }

            ContentOperation::PaintXObject(name) => sink.xobject_invoked(&name, &self.state.ctm),
        }
    }

    fn move_text(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_text(0.0, -leading);
    }

    /// Page point of the text origin, top-left convention
    fn text_origin(&self) -> Point {
        let rise = self.state.text.rise;
        let p = self
            .text_matrix
            .multiply(&self.state.ctm)
            .transform_point(0.0, rise);
        Point::new(p.x - self.media_box[0], self.media_box[3] - p.y)
    }

    fn show<S: ContentSink + ?Sized>(&mut self, elements: Vec<TextElement>, sink: &mut S) {
        let text = &self.state.text;
        let font_name = text.font_name.clone().unwrap_or_default();
        let font_size = text.font_size;
        let scaling = text.horizontal_scaling;
        let start = self.text_origin();
        let effective_size =
            font_size.abs() * self.text_matrix.multiply(&self.state.ctm).y_scale();

        let mut strings = Vec::new();
        for element in elements {
            let tx = match &element {
                TextElement::Text(string) => {
                    let metrics = sink.measure(&font_name, string);
                    (metrics.width * font_size
                        + self.state.text.char_spacing * metrics.codes as f64
                        + self.state.text.word_spacing * metrics.spaces as f64)
                        * scaling
                }
                TextElement::Spacing(adjust) => -adjust / 1000.0 * font_size * scaling,
            };
            self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
            if let TextElement::Text(string) = element {
                strings.push(string);
            }
        }

        if strings.is_empty() {
            return;
        }
        let end = self.text_origin();
        sink.text_shown(TextRun {
            font_name,
            font_size,
            effective_size,
            position: start,
            width: end.x - start.x,
            strings,
        });
    }
}
