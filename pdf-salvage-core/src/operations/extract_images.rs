//! PDF image extraction functionality
//!
//! Turns the image events of a replayed page into [`ExtractedImage`]s: the
//! image dictionary's parameters, its stream bytes, and where it lands on
//! the page. An image XObject maps the unit square through the transformation
//! in effect at `Do`, so its displayed size is the length of the transformed
//! unit vectors.

use crate::graphics::replay::{ImageEvent, PageEvent};
use crate::parser::objects::PdfObject;
use crate::parser::resolver::Resolver;

/// Encoding of the bytes in [`ExtractedImage::data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ImageFormat {
    /// Decoded samples
    Raw,
    /// DCTDecode
    Jpeg,
    /// JPXDecode
    Jpeg2000,
    /// JBIG2Decode
    Jbig2,
    /// CCITTFaxDecode
    CcittFax,
    /// Any other filter left undecoded
    Other,
}

impl ImageFormat {
    fn from_filter(filter: Option<&str>) -> Self {
        match filter {
            None => ImageFormat::Raw,
            Some("DCTDecode") => ImageFormat::Jpeg,
            Some("JPXDecode") => ImageFormat::Jpeg2000,
            Some("JBIG2Decode") => ImageFormat::Jbig2,
            Some("CCITTFaxDecode") => ImageFormat::CcittFax,
            Some(_) => ImageFormat::Other,
        }
    }
}

/// An image placed on a page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractedImage {
    /// XObject resource name
    pub resource_name: String,
    pub object_number: u32,
    /// Width in samples
    pub width: u32,
    /// Height in samples
    pub height: u32,
    pub bits_per_component: u32,
    /// Color space family (`DeviceRGB`, `ICCBased`, `Indexed`, ...)
    pub color_space: String,
    /// First filter still applied to `data`, `None` once fully decoded
    pub filter: Option<String>,
    pub format: ImageFormat,
    /// Stream bytes, Flate already undone
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,
    /// Left edge, from the left of the media box
    pub x: f64,
    /// Top edge, from the top of the media box
    pub y: f64,
    pub display_width: f64,
    pub display_height: f64,
}

/// Images painted by the events of one page
pub fn extract_images(
    resolver: &Resolver<'_>,
    events: &[PageEvent],
    media_box: [f64; 4],
) -> Vec<ExtractedImage> {
    events
        .iter()
        .filter_map(|event| match event {
            PageEvent::Image(image) => extract_image(resolver, image, media_box),
            PageEvent::Text(_) => None,
        })
        .collect()
}

fn extract_image(
    resolver: &Resolver<'_>,
    event: &ImageEvent,
    media_box: [f64; 4],
) -> Option<ExtractedImage> {
    let raw = resolver.object(event.object_number)?;
    let dict = raw.dict()?;

    let dimension = |key: &str| {
        dict.get(key)
            .and_then(|v| resolver.resolve_number(v))
            .filter(|n| *n >= 0.0)
            .map_or(0, |n| n as u32)
    };
    let image_mask = dict
        .get("ImageMask")
        .and_then(|v| resolver.resolve(v))
        .and_then(PdfObject::as_bool)
        .unwrap_or(false);
    let bits_per_component = if image_mask { 1 } else { dimension("BitsPerComponent") };
    let color_space = if image_mask {
        "ImageMask".to_string()
    } else {
        dict.get("ColorSpace")
            .and_then(|cs| color_space_name(resolver, cs))
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let filter = raw.pending_filters().first().cloned();
    let ctm = &event.ctm;
    let display_width = ctm.x_scale();
    let display_height = ctm.y_scale();

    // Unit square corners, to get the page-space bounding box
    let corners =
        [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(u, v)| ctm.transform_point(u, v));
    let left = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let top = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Some(ExtractedImage {
        resource_name: event.name.clone(),
        object_number: event.object_number,
        width: dimension("Width"),
        height: dimension("Height"),
        bits_per_component,
        color_space,
        format: ImageFormat::from_filter(filter.as_deref()),
        filter,
        data: raw.stream().map(<[u8]>::to_vec).unwrap_or_default(),
        x: left - media_box[0],
        y: media_box[3] - top,
        display_width,
        display_height,
    })
}

fn color_space_name(resolver: &Resolver<'_>, value: &PdfObject) -> Option<String> {
    match resolver.resolve(value)? {
        PdfObject::Name(name) => Some(name.as_str().to_string()),
        PdfObject::Array(array) => array
            .get(0)
            .and_then(|family| resolver.resolve_name(family))
            .map(str::to_string),
        _ => None,
    }
}
