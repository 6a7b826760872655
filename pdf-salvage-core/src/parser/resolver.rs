//! Reference Resolver
//!
//! Resolves indirect references against the loaded object table and looks
//! up inheritable page attributes by walking the `/Parent` chain. Every walk
//! tracks the object numbers it has visited and is capped in depth, so a
//! document with reference cycles resolves to "not found" instead of looping.

use super::objects::{PdfArray, PdfDictionary, PdfObject};
use super::store::{ObjectTable, RawObject};

/// US Letter, used when no page or ancestor defines `/MediaBox`
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Read-only view over an object table
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    objects: &'a ObjectTable,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(objects: &'a ObjectTable, max_depth: usize) -> Self {
        Self { objects, max_depth }
    }

    /// Look up an object by number
    pub fn object(&self, object_number: u32) -> Option<&'a RawObject> {
        self.objects.get(&object_number)
    }

    /// The raw object a value refers to.
    ///
    /// Follows objects whose whole body is another reference. Direct values
    /// have no raw object and yield `None`.
    pub fn resolve_raw(&self, value: &PdfObject) -> Option<&'a RawObject> {
        let (mut num, _) = value.as_reference()?;
        let mut visited = Vec::new();
        loop {
            if visited.contains(&num) || visited.len() >= self.max_depth {
                tracing::debug!("Reference chain through object {num} does not terminate");
                return None;
            }
            visited.push(num);
            let raw = self.object(num)?;
            match raw.value() {
                PdfObject::Reference(next, _) => num = *next,
                _ => return Some(raw),
            }
        }
    }

    /// Resolve a value to a direct object.
    ///
    /// Direct values are returned unchanged; references are followed until a
    /// direct value is reached. Missing objects and cycles give `None`.
    pub fn resolve<'v>(&self, value: &'v PdfObject) -> Option<&'v PdfObject>
    where
        'a: 'v,
    {
        match value {
            PdfObject::Reference(..) => self.resolve_raw(value).map(RawObject::value),
            direct => Some(direct),
        }
    }

    pub fn resolve_dict<'v>(&self, value: &'v PdfObject) -> Option<&'v PdfDictionary>
    where
        'a: 'v,
    {
        self.resolve(value).and_then(PdfObject::as_dict)
    }

    pub fn resolve_array<'v>(&self, value: &'v PdfObject) -> Option<&'v PdfArray>
    where
        'a: 'v,
    {
        self.resolve(value).and_then(PdfObject::as_array)
    }

    pub fn resolve_number(&self, value: &PdfObject) -> Option<f64> {
        self.resolve(value).and_then(PdfObject::as_number)
    }

    pub fn resolve_name<'v>(&self, value: &'v PdfObject) -> Option<&'v str>
    where
        'a: 'v,
    {
        self.resolve(value).and_then(PdfObject::as_name)
    }

    /// Look up `key` on a page, then on each `/Parent` in turn.
    ///
    /// Returns the first definition found (unresolved), or `None` when no
    /// ancestor defines the key or the chain loops.
    pub fn resolve_inherited(&self, page_object_number: u32, key: &str) -> Option<&'a PdfObject> {
        let mut current = page_object_number;
        let mut visited = Vec::new();

        loop {
            if visited.contains(&current) {
                tracing::debug!("Parent chain of object {page_object_number} loops");
                return None;
            }
            if visited.len() > self.max_depth {
                tracing::debug!("Parent chain of object {page_object_number} too deep");
                return None;
            }
            visited.push(current);

            let dict = self.object(current)?.dict()?;
            if let Some(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get_reference("Parent")?.0;
        }
    }

    /// Effective media box of a page, falling back to [`DEFAULT_MEDIA_BOX`]
    pub fn media_box(&self, page_object_number: u32) -> [f64; 4] {
        self.resolve_inherited(page_object_number, "MediaBox")
            .and_then(|value| self.rectangle(value))
            .unwrap_or(DEFAULT_MEDIA_BOX)
    }

    /// Read a rectangle, normalizing corner order.
    ///
    /// Degenerate rectangles (zero width or height) are rejected.
    pub fn rectangle(&self, value: &PdfObject) -> Option<[f64; 4]> {
        let array = self.resolve_array(value)?;
        if array.len() < 4 {
            return None;
        }
        let mut coords = [0.0; 4];
        for (slot, item) in coords.iter_mut().zip(array.iter()) {
            *slot = self.resolve_number(item)?;
        }
        let [x0, y0, x1, y1] = coords;
        let rect = [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)];
        if rect[2] - rect[0] <= 0.0
            || rect[3] - rect[1] <= 0.0
            || rect.iter().any(|v| !v.is_finite())
        {
            return None;
        }
        Some(rect)
    }
}
