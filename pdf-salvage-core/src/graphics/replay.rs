//! Page replay
//!
//! Runs a page's content through the [`ContentInterpreter`] with the page's
//! resources, resolving font names to [`FontInfo`] for measuring and
//! decoding, and descending into form XObjects. The result is a flat list of
//! [`PageEvent`]s in drawing order.
//!
//! Forms replay with their `/Matrix` applied on top of the invoking
//! transformation and their own `/Resources` layered over the invoking ones.
//! Nesting stops at `max_form_depth`, and a form never re-enters itself.

use super::interpreter::{ContentInterpreter, ContentSink, StringMetrics, TextRun};
use crate::geometry::Matrix;
use crate::parser::objects::{PdfObject, PdfString};
use crate::parser::page_tree::{PageDescriptor, ResourceMap};
use crate::parser::resolver::Resolver;
use crate::parser::store::RawObject;
use crate::text::font::FontInfo;
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up fonts by object number
pub trait FontSource {
    fn font(&self, object_number: u32) -> Option<Arc<FontInfo>>;
}

impl<F> FontSource for F
where
    F: Fn(u32) -> Option<Arc<FontInfo>>,
{
    fn font(&self, object_number: u32) -> Option<Arc<FontInfo>> {
        self(object_number)
    }
}

/// Text shown on a page, with the font it was shown in
#[derive(Debug, Clone)]
pub struct TextEvent {
    pub run: TextRun,
    pub font: Option<Arc<FontInfo>>,
}

/// An image XObject painted on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    /// Resource name used with `Do`
    pub name: String,
    pub object_number: u32,
    /// Transformation in effect; maps the unit square onto the page
    pub ctm: Matrix,
}

#[derive(Debug, Clone)]
pub enum PageEvent {
    Text(TextEvent),
    Image(ImageEvent),
}

/// Concatenated content streams of a page.
///
/// Streams that are missing or still encoded with an unsupported filter are
/// left out.
pub fn page_content(resolver: &Resolver<'_>, page: &PageDescriptor) -> Vec<u8> {
    let mut content = Vec::new();
    for &num in &page.content_object_numbers {
        let Some(raw) = resolver.object(num) else {
            continue;
        };
        if let Some(data) = decoded_stream(raw) {
            if !content.is_empty() {
                content.push(b'\n');
            }
            content.extend_from_slice(data);
        }
    }
    content
}

fn decoded_stream(raw: &RawObject) -> Option<&[u8]> {
    if !raw.pending_filters().is_empty() {
        tracing::debug!(
            "Content stream {} needs unsupported filter {:?}",
            raw.object_number,
            raw.pending_filters()
        );
        return None;
    }
    raw.stream()
}

/// Replay one page and collect its text and image events
pub fn replay_page(
    resolver: &Resolver<'_>,
    fonts: &dyn FontSource,
    page: &PageDescriptor,
    max_form_depth: usize,
) -> Vec<PageEvent> {
    let mut events = Vec::new();
    let mut frame = Frame {
        resolver,
        fonts,
        resources: page.resources.clone(),
        media_box: page.media_box,
        depth: 0,
        max_form_depth,
        form_chain: Vec::new(),
        font_cache: HashMap::new(),
        events: &mut events,
    };
    let content = page_content(resolver, page);
    ContentInterpreter::new(page.media_box).run(&content, &mut frame);
    events
}

/// Sink for one content stream: the page itself or a form within it
struct Frame<'r, 'a, 'e> {
    resolver: &'r Resolver<'a>,
    fonts: &'r dyn FontSource,
    resources: ResourceMap,
    media_box: [f64; 4],
    depth: usize,
    max_form_depth: usize,
    /// Forms being replayed, outermost first
    form_chain: Vec<u32>,
    font_cache: HashMap<String, Option<Arc<FontInfo>>>,
    events: &'e mut Vec<PageEvent>,
}

impl Frame<'_, '_, '_> {
    fn font(&mut self, name: &str) -> Option<Arc<FontInfo>> {
        if let Some(cached) = self.font_cache.get(name) {
            return cached.clone();
        }
        let font = self
            .resources
            .font(name)
            .and_then(|num| self.fonts.font(num));
        if font.is_none() && !name.is_empty() {
            tracing::debug!("Font resource /{name} not found");
        }
        self.font_cache.insert(name.to_string(), font.clone());
        font
    }

    fn replay_form(&mut self, name: &str, form: &RawObject, ctm: &Matrix) {
        let num = form.object_number;
        if self.depth >= self.max_form_depth {
            tracing::warn!(
                "Form /{name} nested deeper than {} levels, skipped",
                self.max_form_depth
            );
            return;
        }
        if self.form_chain.contains(&num) {
            tracing::warn!("Form /{name} (object {num}) invokes itself, skipped");
            return;
        }
        let Some(content) = decoded_stream(form) else {
            return;
        };

        let resolver = self.resolver;
        let matrix = form
            .get("Matrix")
            .and_then(|m| resolver.resolve_array(m))
            .and_then(|a| {
                let values: Vec<f64> =
                    a.iter().filter_map(|v| resolver.resolve_number(v)).collect();
                Matrix::from_slice(&values)
            })
            .unwrap_or_default();
        let resources = match form.get("Resources").and_then(|r| resolver.resolve_dict(r)) {
            Some(own) => self
                .resources
                .overlay(&ResourceMap::from_dict(resolver, own)),
            None => self.resources.clone(),
        };

        let mut form_chain = self.form_chain.clone();
        form_chain.push(num);
        let mut child = Frame {
            resolver,
            fonts: self.fonts,
            resources,
            media_box: self.media_box,
            depth: self.depth + 1,
            max_form_depth: self.max_form_depth,
            form_chain,
            font_cache: HashMap::new(),
            events: &mut *self.events,
        };
        ContentInterpreter::with_ctm(self.media_box, matrix.multiply(ctm)).run(content, &mut child);
    }
}

impl ContentSink for Frame<'_, '_, '_> {
    fn measure(&mut self, font_name: &str, string: &PdfString) -> StringMetrics {
        let Some(font) = self.font(font_name) else {
            return StringMetrics::estimate(string);
        };
        let codes = font.codes(string);
        StringMetrics {
            width: codes.iter().map(|&c| font.glyph_width(c)).sum::<f64>() / 1000.0,
            spaces: if string.as_bytes().len() == codes.len() {
                codes.iter().filter(|&&c| c == 32).count()
            } else {
                0
            },
            codes: codes.len(),
        }
    }

    fn text_shown(&mut self, run: TextRun) {
        let font = self.font(&run.font_name);
        self.events.push(PageEvent::Text(TextEvent { run, font }));
    }

    fn xobject_invoked(&mut self, name: &str, ctm: &Matrix) {
        let Some(num) = self.resources.xobject(name) else {
            tracing::debug!("XObject /{name} not in resources");
            return;
        };
        let Some(xobject) = self.resolver.object(num) else {
            tracing::debug!("XObject /{name} points at missing object {num}");
            return;
        };
        let subtype = xobject
            .get("Subtype")
            .and_then(PdfObject::as_name)
            .unwrap_or_default();
        match subtype {
            "Image" => self.events.push(PageEvent::Image(ImageEvent {
                name: name.to_string(),
                object_number: num,
                ctm: *ctm,
            })),
            "Form" => self.replay_form(name, xobject, ctm),
            other => tracing::debug!("Ignoring XObject /{name} of subtype {other:?}"),
        }
    }
}
