//! Font metadata for a page

use crate::graphics::replay::FontSource;
use crate::parser::page_tree::PageDescriptor;

/// A font resource of a page
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtractedFont {
    /// Resource name, without the slash
    pub resource_name: String,
    pub base_font: String,
    pub subtype: String,
    /// Encoding name; `Custom` for a `/Differences` dictionary without a
    /// base, `Builtin` when the font names none
    pub encoding: String,
    pub object_number: u32,
    pub is_embedded: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub program: Option<Vec<u8>>,
}

/// Fonts named in a page's resources, ordered by resource name.
///
/// Resources pointing at something that is not a font dictionary are left
/// out.
pub fn extract_fonts(fonts: &dyn FontSource, page: &PageDescriptor) -> Vec<ExtractedFont> {
    page.resources
        .fonts
        .iter()
        .filter_map(|(name, &num)| {
            let Some(info) = fonts.font(num) else {
                tracing::debug!("Font /{name} (object {num}) is not a font dictionary");
                return None;
            };
            Some(ExtractedFont {
                resource_name: name.clone(),
                base_font: info.base_font.clone(),
                subtype: info.subtype.clone(),
                encoding: info
                    .encoding_name
                    .clone()
                    .unwrap_or_else(|| "Builtin".to_string()),
                object_number: num,
                is_embedded: info.is_embedded(),
                program: info.embedded.as_ref().map(|p| p.data.clone()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::page_tree::ResourceMap;
    use crate::parser::resolver::Resolver;
    use crate::parser::store::{ObjectTable, RawObject};
    use crate::text::font::FontInfo;
    use std::sync::Arc;

    fn page_with_fonts(fonts: &[(&str, u32)]) -> PageDescriptor {
        let mut resources = ResourceMap::default();
        for (name, num) in fonts {
            resources.fonts.insert(name.to_string(), *num);
        }
        PageDescriptor {
            index: 0,
            object_number: 3,
            media_box: [0.0, 0.0, 612.0, 792.0],
            resources,
            content_object_numbers: Vec::new(),
        }
    }

    #[test]
    fn test_font_metadata() {
        let mut objects = ObjectTable::new();
        objects.insert(
            5,
            RawObject::new(
                5,
                0,
                b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                    .to_vec(),
            ),
        );
        objects.insert(
            6,
            RawObject::new(
                6,
                0,
                b"<< /Type /Font /Subtype /TrueType /BaseFont /ABCDEF+Arial /FontDescriptor 7 0 \
                  R >>"
                    .to_vec(),
            ),
        );
        objects.insert(
            7,
            RawObject::new(7, 0, b"<< /Type /FontDescriptor /FontFile2 8 0 R >>".to_vec()),
        );
        objects.insert(
            8,
            RawObject::new(8, 0, b"<< /Length1 4 >>".to_vec())
                .with_stream(b"true".to_vec(), Vec::new()),
        );
        objects.insert(9, RawObject::new(9, 0, b"[1 2 3]".to_vec()));
        let resolver = Resolver::new(&objects, 32);
        let source = |num: u32| FontInfo::load(&resolver, num).map(Arc::new);

        let page = page_with_fonts(&[("F2", 6), ("F1", 5), ("F9", 9)]);
        let fonts = extract_fonts(&source, &page);

        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].resource_name, "F1");
        assert_eq!(fonts[0].base_font, "Helvetica");
        assert_eq!(fonts[0].encoding, "WinAnsiEncoding");
        assert!(!fonts[0].is_embedded);

        assert_eq!(fonts[1].subtype, "TrueType");
        assert_eq!(fonts[1].encoding, "Builtin");
        assert!(fonts[1].is_embedded);
        assert_eq!(fonts[1].program.as_deref(), Some(&b"true"[..]));
    }
}
