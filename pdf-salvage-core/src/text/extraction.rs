//! Text extraction from replayed pages
//!
//! Each show-text event becomes one [`ExtractedText`], in the order the
//! content stream shows them. Positions use a top-left origin with y growing
//! downwards.
//!
//! Joining runs into page text is a heuristic: consecutive runs whose
//! baselines are within half a font size share a line, and a gap wider than
//! a quarter em between them becomes a space.

use crate::graphics::replay::{PageEvent, TextEvent};
use crate::text::decoder::decode_text;

/// Baseline distance, in font sizes, still treated as the same line
const SAME_LINE_TOLERANCE: f64 = 0.5;
/// Horizontal gap, in font sizes, that separates words
const WORD_GAP: f64 = 0.25;

/// A run of text with its position on the page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractedText {
    pub text: String,
    /// Distance from the left edge of the media box
    pub x: f64,
    /// Distance from the top edge of the media box
    pub y: f64,
    /// Font resource name, without the slash
    pub font_name: String,
    /// Font size on the page
    pub font_size: f64,
    /// Horizontal advance of the run
    pub width: f64,
}

impl ExtractedText {
    fn from_event(event: &TextEvent) -> Self {
        let run = &event.run;
        let text: String = run
            .strings
            .iter()
            .map(|s| decode_text(s, event.font.as_deref()))
            .collect();
        let font_size = if run.effective_size > 0.0 {
            run.effective_size
        } else {
            run.font_size.abs()
        };

        ExtractedText {
            text,
            x: run.position.x,
            y: run.position.y,
            font_name: run.font_name.clone(),
            font_size,
            width: run.width,
        }
    }
}

/// How two consecutive runs are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Joint {
    Adjacent,
    Space,
    NewLine,
}

pub(crate) fn joint(prev: &ExtractedText, cur: &ExtractedText) -> Joint {
    let size = prev.font_size.max(cur.font_size);
    if (cur.y - prev.y).abs() > SAME_LINE_TOLERANCE * size {
        return Joint::NewLine;
    }
    let gap = cur.x - (prev.x + prev.width);
    if gap > WORD_GAP * cur.font_size || cur.x < prev.x {
        Joint::Space
    } else {
        Joint::Adjacent
    }
}

/// Text runs of replayed page events, empty runs dropped
pub fn extract_text(events: &[PageEvent]) -> Vec<ExtractedText> {
    events
        .iter()
        .filter_map(|event| match event {
            PageEvent::Text(text) => Some(ExtractedText::from_event(text)),
            PageEvent::Image(_) => None,
        })
        .filter(|item| !item.text.is_empty())
        .collect()
}

/// Join runs into plain text, one line per visual line
pub fn join_runs(items: &[ExtractedText]) -> String {
    let mut out = String::new();
    let mut prev: Option<&ExtractedText> = None;

    for item in items {
        if let Some(prev) = prev {
            match joint(prev, item) {
                Joint::NewLine => out.push('\n'),
                Joint::Space => {
                    if !out.ends_with(' ') && !item.text.starts_with(' ') {
                        out.push(' ');
                    }
                }
                Joint::Adjacent => {}
            }
        }
        out.push_str(&item.text);
        prev = Some(item);
    }

    out
}
