//! Binary cross-reference streams (`/Type /XRef`)
//!
//! Rows are fixed-width big-endian records described by `/W`, grouped into
//! subsections by `/Index`. Type 2 rows point into object streams.

use crate::parser::objects::{PdfDictionary, PdfObject};
use crate::parser::{ParseError, ParseResult};

/// Upper bound on a single `/W` field width; wider fields cannot fit a u64
const MAX_FIELD_WIDTH: usize = 8;

/// One decoded row of a cross-reference stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XRefEntry {
    Free {
        next_free_object: u32,
        generation: u16,
    },
    /// Object stored directly at a byte offset
    InUse { offset: u64, generation: u16 },
    /// Object packed inside the object stream `stream_object_number`
    Compressed {
        stream_object_number: u32,
        index_within_stream: u32,
    },
}

impl XRefEntry {
    pub fn is_free(&self) -> bool {
        matches!(self, XRefEntry::Free { .. })
    }
}

/// A decoded cross-reference stream, ready to be turned into rows
#[derive(Debug)]
pub struct XRefStream {
    /// Stream dictionary, which doubles as the trailer
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
    /// Byte width of each of the three row fields
    pub widths: [usize; 3],
    /// `(first, count)` subsections; defaults to `(0, Size)`
    pub index: Vec<(u32, u32)>,
}

impl XRefStream {
    /// Parse a cross-reference stream from its dictionary and decoded data
    pub fn parse(dict: PdfDictionary, data: Vec<u8>) -> ParseResult<Self> {
        let w = dict
            .get("W")
            .and_then(PdfObject::as_array)
            .ok_or_else(|| ParseError::MissingKey("W array in xref stream".to_string()))?;

        let mut widths = [0usize; 3];
        for (slot, obj) in widths.iter_mut().zip(w.iter()) {
            let width = obj.as_integer().ok_or_else(|| ParseError::SyntaxError {
                position: 0,
                message: "Invalid width in W array".to_string(),
            })?;
            if !(0..=MAX_FIELD_WIDTH as i64).contains(&width) {
                return Err(ParseError::SyntaxError {
                    position: 0,
                    message: format!("Unsupported field width {width} in W array"),
                });
            }
            *slot = width as usize;
        }
        if w.len() < 3 {
            return Err(ParseError::SyntaxError {
                position: 0,
                message: format!("W array must have 3 elements, found {}", w.len()),
            });
        }

        let index = match dict.get("Index").and_then(PdfObject::as_array) {
            Some(array) => array
                .0
                .chunks(2)
                .filter_map(|pair| match pair {
                    [first, count] => {
                        let first = first.as_integer().filter(|v| *v >= 0)?;
                        let count = count.as_integer().filter(|v| *v >= 0)?;
                        Some((first as u32, count as u32))
                    }
                    _ => None,
                })
                .collect(),
            None => {
                let size = dict
                    .get_integer("Size")
                    .filter(|v| *v >= 0)
                    .ok_or_else(|| ParseError::MissingKey("Size".to_string()))?;
                vec![(0, size as u32)]
            }
        };

        Ok(XRefStream {
            dict,
            data,
            widths,
            index,
        })
    }

    /// Convert the cross-reference stream to xref entries.
    ///
    /// Entries past the end of truncated data are dropped, and entries of an
    /// unknown type are skipped.
    pub fn to_xref_entries(&self) -> Vec<(u32, XRefEntry)> {
        let entry_size: usize = self.widths.iter().sum();
        if entry_size == 0 {
            return Vec::new();
        }

        let mut entries = Vec::new();
        let mut rows = self.data.chunks_exact(entry_size);

        'sections: for &(first_obj, count) in &self.index {
            for i in 0..count {
                let Some(row) = rows.next() else {
                    tracing::debug!("Xref stream data truncated after {} entries", entries.len());
                    break 'sections;
                };
                let Some(obj_num) = first_obj.checked_add(i) else {
                    break 'sections;
                };

                let [w0, w1, _] = self.widths;
                // A zero-width type field means every entry is type 1
                let entry_type = if w0 == 0 { 1 } else { read_field(&row[..w0]) };
                let field2 = read_field(&row[w0..w0 + w1]);
                let field3 = read_field(&row[w0 + w1..]);

                let entry = match entry_type {
                    0 => XRefEntry::Free {
                        next_free_object: field2 as u32,
                        generation: field3 as u16,
                    },
                    1 => XRefEntry::InUse {
                        offset: field2,
                        generation: field3 as u16,
                    },
                    2 => XRefEntry::Compressed {
                        stream_object_number: field2 as u32,
                        index_within_stream: field3 as u32,
                    },
                    other => {
                        tracing::trace!("Skipping xref stream entry of type {other}");
                        continue;
                    }
                };

                entries.push((obj_num, entry));
            }
        }

        entries
    }
}

/// Big-endian unsigned field
fn read_field(bytes: &[u8]) -> u64 {
    let mut value = 0u64;
    for &byte in bytes {
        value = (value << 8) | (byte as u64);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(input: &[u8]) -> PdfDictionary {
        PdfObject::from_bytes(input)
            .and_then(|o| o.as_dict().cloned())
            .unwrap()
    }

    #[test]
    fn test_read_field() {
        assert_eq!(read_field(&[]), 0);
        assert_eq!(read_field(&[0x12]), 0x12);
        assert_eq!(read_field(&[0x12, 0x34]), 0x1234);
        assert_eq!(read_field(&[0x00, 0x01, 0x00]), 256);
    }

    #[test]
    fn test_xref_entry_parsing() {
        let data = vec![
            0, 0, 0, 0xFF, // free
            1, 0, 0x0F, 0, // in use at offset 15
            2, 0, 5, 3, // compressed in object 5, index 3
        ];
        let stream =
            XRefStream::parse(dict(b"<< /Type /XRef /W [1 2 1] /Size 3 >>"), data).unwrap();
        let entries = stream.to_xref_entries();

        assert_eq!(entries.len(), 3);
        assert!(entries[0].1.is_free());
        assert_eq!(
            entries[1],
            (
                1,
                XRefEntry::InUse {
                    offset: 15,
                    generation: 0
                }
            )
        );
        assert_eq!(
            entries[2],
            (
                2,
                XRefEntry::Compressed {
                    stream_object_number: 5,
                    index_within_stream: 3
                }
            )
        );
    }

    #[test]
    fn test_multiple_index_ranges() {
        let data = vec![1, 0, 10, 0, 1, 0, 20, 0, 1, 0, 30, 0];
        let stream =
            XRefStream::parse(dict(b"<< /W [1 2 1] /Index [3 1 10 2] /Size 12 >>"), data).unwrap();
        let numbers: Vec<u32> = stream.to_xref_entries().iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![3, 10, 11]);
    }

    #[test]
    fn test_zero_width_type_defaults_to_in_use() {
        let data = vec![0, 42, 0];
        let stream = XRefStream::parse(dict(b"<< /W [0 2 1] /Size 1 >>"), data).unwrap();
        assert_eq!(
            stream.to_xref_entries(),
            vec![(
                0,
                XRefEntry::InUse {
                    offset: 42,
                    generation: 0
                }
            )]
        );
    }

    #[test]
    fn test_truncated_data_keeps_complete_rows() {
        let data = vec![1, 0, 10, 0, 1, 0];
        let stream = XRefStream::parse(dict(b"<< /W [1 2 1] /Size 5 >>"), data).unwrap();
        assert_eq!(stream.to_xref_entries().len(), 1);
    }

    #[test]
    fn test_invalid_w_array() {
        assert!(XRefStream::parse(dict(b"<< /Size 1 >>"), vec![]).is_err());
        assert!(XRefStream::parse(dict(b"<< /W [1 2] /Size 1 >>"), vec![]).is_err());
        assert!(XRefStream::parse(dict(b"<< /W [1 20 1] /Size 1 >>"), vec![]).is_err());
    }
}
