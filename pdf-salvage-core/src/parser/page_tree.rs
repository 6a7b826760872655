//! PDF Page Tree Parser
//!
//! Flattens the page tree into an ordered list of [`PageDescriptor`]s.
//! `/Kids` arrays are expanded depth-first, left to right, which is the
//! document's declared page order. `/Resources` and `/MediaBox` are
//! inherited down the tree: a resource name visible to a page is the
//! nearest definition found walking from the page up through its parents.
//!
//! Recursion is capped at `max_page_tree_depth`; deeper subtrees, cycles
//! and nodes that cannot be resolved are dropped with a warning.

use super::objects::{PdfDictionary, PdfObject};
use super::resolver::{Resolver, DEFAULT_MEDIA_BOX};
use super::store::RawObject;
use std::collections::{BTreeMap, HashSet};

/// Resource names visible to a page, mapped to object numbers
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResourceMap {
    /// `/Font` entries
    pub fonts: BTreeMap<String, u32>,
    /// `/XObject` entries
    pub xobjects: BTreeMap<String, u32>,
}

impl ResourceMap {
    /// Read the `/Font` and `/XObject` sub-dictionaries of a resources dictionary.
    ///
    /// Entries that are not indirect references are skipped.
    pub fn from_dict(resolver: &Resolver<'_>, resources: &PdfDictionary) -> Self {
        let collect = |key: &str| -> BTreeMap<String, u32> {
            let Some(sub) = resources.get(key).and_then(|v| resolver.resolve_dict(v)) else {
                return BTreeMap::new();
            };
            sub.iter()
                .filter_map(|(name, value)| match value {
                    PdfObject::Reference(num, _) => Some((name.as_str().to_string(), *num)),
                    _ => {
                        tracing::trace!("Skipping direct /{key} resource /{}", name.as_str());
                        None
                    }
                })
                .collect()
        };

        Self {
            fonts: collect("Font"),
            xobjects: collect("XObject"),
        }
    }

    /// Layer `child` over `self`; child names win
    pub fn overlay(&self, child: &ResourceMap) -> ResourceMap {
        let mut merged = self.clone();
        merged
            .fonts
            .extend(child.fonts.iter().map(|(k, v)| (k.clone(), *v)));
        merged
            .xobjects
            .extend(child.xobjects.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    pub fn font(&self, name: &str) -> Option<u32> {
        self.fonts.get(name).copied()
    }

    pub fn xobject(&self, name: &str) -> Option<u32> {
        self.xobjects.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty() && self.xobjects.is_empty()
    }
}

/// One page, with its inherited attributes resolved
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageDescriptor {
    /// 0-based position in reading order
    pub index: u32,
    /// Object number of the `/Page` dictionary
    pub object_number: u32,
    /// Effective media box [llx, lly, urx, ury], corners normalized
    pub media_box: [f64; 4],
    pub resources: ResourceMap,
    /// Content stream objects, concatenated in this order
    pub content_object_numbers: Vec<u32>,
}

impl PageDescriptor {
    pub fn width(&self) -> f64 {
        self.media_box[2] - self.media_box[0]
    }

    pub fn height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }
}

/// Attributes accumulated on the way down the tree
#[derive(Debug, Clone)]
struct Inherited {
    resources: ResourceMap,
    media_box: Option<[f64; 4]>,
}

/// Flatten the page tree under `catalog` into page descriptors
pub fn build_page_list(
    resolver: &Resolver<'_>,
    catalog: &RawObject,
    max_depth: usize,
    warn: &mut dyn FnMut(String),
) -> Vec<PageDescriptor> {
    let Some(root) = catalog.get("Pages").and_then(PdfObject::as_reference) else {
        warn("Catalog has no /Pages reference".to_string());
        return Vec::new();
    };

    let mut walker = PageTreeWalker {
        resolver,
        max_depth,
        visited: HashSet::new(),
        pages: Vec::new(),
        warn,
    };
    let inherited = Inherited {
        resources: ResourceMap::default(),
        media_box: None,
    };
    walker.walk(root.0, &inherited, 0);
    walker.pages
}

struct PageTreeWalker<'r, 'a, 'w> {
    resolver: &'r Resolver<'a>,
    max_depth: usize,
    visited: HashSet<u32>,
    pages: Vec<PageDescriptor>,
    warn: &'w mut dyn FnMut(String),
}

impl PageTreeWalker<'_, '_, '_> {
    fn walk(&mut self, node: u32, inherited: &Inherited, depth: usize) {
        if depth > self.max_depth {
            (self.warn)(format!(
                "Page tree deeper than {} levels, subtree at object {node} dropped",
                self.max_depth
            ));
            return;
        }
        if !self.visited.insert(node) {
            (self.warn)(format!("Page tree revisits object {node}, skipping"));
            return;
        }

        let resolver = self.resolver;
        let Some(dict) = resolver.object(node).and_then(RawObject::dict) else {
            (self.warn)(format!("Page tree node {node} is missing or not a dictionary"));
            return;
        };

        let resources = match dict.get("Resources").and_then(|r| resolver.resolve_dict(r)) {
            Some(local) => inherited
                .resources
                .overlay(&ResourceMap::from_dict(resolver, local)),
            None => inherited.resources.clone(),
        };
        let media_box = dict
            .get("MediaBox")
            .and_then(|m| resolver.rectangle(m))
            .or(inherited.media_box);

        let kids = dict.get("Kids");
        let is_leaf = match dict.get_type() {
            Some("Page") => true,
            Some("Pages") => false,
            _ => kids.is_none(),
        };

        if is_leaf {
            self.pages.push(PageDescriptor {
                index: self.pages.len() as u32,
                object_number: node,
                media_box: media_box.unwrap_or(DEFAULT_MEDIA_BOX),
                resources,
                content_object_numbers: content_object_numbers(resolver, dict.get("Contents")),
            });
            return;
        }

        let Some(kids) = kids.and_then(|k| resolver.resolve_array(k)) else {
            tracing::debug!("Page tree node {node} has no /Kids array");
            return;
        };

        let inherited = Inherited {
            resources,
            media_box,
        };
        for kid in kids.iter() {
            match kid {
                PdfObject::Reference(num, _) => self.walk(*num, &inherited, depth + 1),
                other => tracing::debug!("Ignoring direct /Kids entry {other:?}"),
            }
        }
    }
}

/// Object numbers of a page's content streams.
///
/// `/Contents` may be a stream reference, an array of references, or a
/// reference to such an array.
fn content_object_numbers(resolver: &Resolver<'_>, contents: Option<&PdfObject>) -> Vec<u32> {
    let Some(contents) = contents else {
        return Vec::new();
    };

    let stream_ref = |value: &PdfObject| -> Option<u32> {
        let raw = resolver.resolve_raw(value)?;
        raw.has_stream().then_some(raw.object_number)
    };

    if let Some(num) = stream_ref(contents) {
        return vec![num];
    }
    match resolver.resolve_array(contents) {
        Some(array) => array.iter().filter_map(stream_ref).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::store::ObjectTable;

    fn table(objects: &[(u32, &str)]) -> ObjectTable {
        objects
            .iter()
            .map(|(num, body)| {
                let raw = RawObject::new(*num, 0, body.as_bytes().to_vec());
                let raw = if body.contains("/Length") {
                    raw.with_stream(b"BT ET".to_vec(), Vec::new())
                } else {
                    raw
                };
                (*num, raw)
            })
            .collect()
    }

    fn pages(objects: &ObjectTable, max_depth: usize) -> (Vec<PageDescriptor>, Vec<String>) {
        let resolver = Resolver::new(objects, 32);
        let mut warnings = Vec::new();
        let list = build_page_list(&resolver, &objects[&1], max_depth, &mut |w| warnings.push(w));
        (list, warnings)
    }

    #[test]
    fn test_nested_tree_order_and_inheritance() {
        let objects = table(&[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (
                2,
                "<< /Type /Pages /Kids [3 0 R 6 0 R] /MediaBox [0 0 500 700] /Resources << /Font \
                 << /F1 20 0 R /F2 21 0 R >> >> >>",
            ),
            (3, "<< /Type /Pages /Parent 2 0 R /Kids [4 0 R 5 0 R] >>"),
            (4, "<< /Type /Page /Parent 3 0 R /Contents 10 0 R >>"),
            (
                5,
                "<< /Type /Page /Parent 3 0 R /MediaBox [0 0 300 400] /Resources << /Font << /F1 \
                 22 0 R >> >> >>",
            ),
            (6, "<< /Type /Page /Parent 2 0 R /Contents [10 0 R 11 0 R] >>"),
            (10, "<< /Length 5 >>"),
            (11, "<< /Length 5 >>"),
        ]);
        let (list, warnings) = pages(&objects, 64);

        assert!(warnings.is_empty());
        assert_eq!(
            list.iter().map(|p| p.object_number).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );
        assert_eq!(list[0].index, 0);
        assert_eq!(list[2].index, 2);

        assert_eq!(list[0].media_box, [0.0, 0.0, 500.0, 700.0]);
        assert_eq!(list[1].media_box, [0.0, 0.0, 300.0, 400.0]);

        // Nearest definition wins, others stay inherited
        assert_eq!(list[1].resources.font("F1"), Some(22));
        assert_eq!(list[1].resources.font("F2"), Some(21));
        assert_eq!(list[0].resources.font("F1"), Some(20));

        assert_eq!(list[0].content_object_numbers, vec![10]);
        assert_eq!(list[2].content_object_numbers, vec![10, 11]);
        assert!(list[1].content_object_numbers.is_empty());
    }

    #[test]
    fn test_indirect_resources_match_inline() {
        let objects = table(&[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R 4 0 R] >>"),
            (3, "<< /Type /Page /Resources 7 0 R >>"),
            (4, "<< /Type /Page /Resources << /Font << /F1 5 0 R >> >> >>"),
            (7, "<< /Font << /F1 5 0 R >> >>"),
        ]);
        let (list, _) = pages(&objects, 64);
        assert_eq!(list[0].resources.font("F1"), Some(5));
        assert_eq!(list[0].resources, list[1].resources);
        assert_eq!(list[0].media_box, DEFAULT_MEDIA_BOX);
    }

    #[test]
    fn test_contents_reference_to_array() {
        let objects = table(&[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R] >>"),
            (3, "<< /Type /Page /Contents 8 0 R >>"),
            (8, "[10 0 R 99 0 R 11 0 R]"),
            (10, "<< /Length 5 >>"),
            (11, "<< /Length 5 >>"),
        ]);
        let (list, _) = pages(&objects, 64);
        assert_eq!(list[0].content_object_numbers, vec![10, 11]);
    }

    #[test]
    fn test_cycle_and_depth_are_bounded() {
        let objects = table(&[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Type /Pages /Kids [3 0 R 2 0 R] >>"),
            (3, "<< /Type /Pages /Kids [4 0 R] >>"),
            (4, "<< /Type /Pages /Kids [5 0 R] >>"),
            (5, "<< /Type /Page >>"),
        ]);
        let (list, warnings) = pages(&objects, 64);
        assert_eq!(list.len(), 1);
        assert_eq!(warnings.len(), 1);

        let (shallow, warnings) = pages(&objects, 1);
        assert!(shallow.is_empty());
        assert!(warnings.iter().any(|w| w.contains("deeper")));
    }

    #[test]
    fn test_untyped_leaf_and_missing_pages() {
        let objects = table(&[
            (1, "<< /Type /Catalog /Pages 2 0 R >>"),
            (2, "<< /Kids [3 0 R 4 0 R] >>"),
            (3, "<< /MediaBox [0 0 10 10] >>"),
        ]);
        let (list, warnings) = pages(&objects, 64);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].object_number, 3);
        assert_eq!(warnings.len(), 1);

        let no_pages = table(&[(1, "<< /Type /Catalog >>")]);
        let (list, warnings) = pages(&no_pages, 64);
        assert!(list.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
