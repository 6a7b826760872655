//! Graphics state tracked while replaying a content stream
//!
//! Only the parts that affect where text and images land are kept: the
//! current transformation matrix and the text state parameters
//! (ISO 32000-1 Section 9.3). The text and line matrices are not part of the
//! saved state; they live for one `BT`/`ET` block.

use crate::geometry::Matrix;

/// Text state parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Font resource name set by `Tf`
    pub font_name: Option<String>,
    /// Font size set by `Tf`
    pub font_size: f64,
    /// Tc
    pub char_spacing: f64,
    /// Tw
    pub word_spacing: f64,
    /// Tz, as a fraction (`100 Tz` is 1.0)
    pub horizontal_scaling: f64,
    /// TL
    pub leading: f64,
    /// Ts
    pub rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// State saved by `q` and restored by `Q`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub text: TextState,
}

impl GraphicsState {
    pub fn with_ctm(ctm: Matrix) -> Self {
        Self {
            ctm,
            text: TextState::default(),
        }
    }
}
