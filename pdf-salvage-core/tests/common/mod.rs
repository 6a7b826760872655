//! Minimal in-memory document builder shared by the integration tests
//!
//! Objects are written in the order they are added, so adding the same
//! number twice mimics an incremental update.

#![allow(dead_code)]

use std::collections::BTreeMap;

pub struct PdfBuilder {
    version: &'static str,
    objects: Vec<(u32, Vec<u8>)>,
    packed: Vec<(u32, String)>,
    trailer_extra: String,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.7",
            objects: Vec::new(),
            packed: Vec::new(),
            trailer_extra: String::new(),
        }
    }

    pub fn version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    /// Add `num 0 obj <body> endobj`, body written verbatim
    pub fn object(mut self, num: u32, body: &str) -> Self {
        self.objects
            .push((num, format!("{num} 0 obj\n{body}\nendobj\n").into_bytes()));
        self
    }

    /// Add a stream object; `/Length` is appended to `dict_entries`
    pub fn stream(mut self, num: u32, dict_entries: &str, data: &[u8]) -> Self {
        let length = data.len();
        let mut bytes =
            format!("{num} 0 obj\n<< {dict_entries} /Length {length} >>\nstream\n").into_bytes();
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(b"\nendstream\nendobj\n");
        self.objects.push((num, bytes));
        self
    }

    /// Add an object stored inside an object stream
    pub fn packed(mut self, num: u32, body: &str) -> Self {
        self.packed.push((num, body.to_string()));
        self
    }

    /// Extra trailer entries, such as `/Encrypt 9 0 R`
    pub fn trailer_entry(mut self, entry: &str) -> Self {
        self.trailer_extra.push(' ');
        self.trailer_extra.push_str(entry);
        self
    }

    /// Header plus every object; returns the bytes and each number's last offset
    fn body(&self, object_stream: Option<u32>) -> (Vec<u8>, BTreeMap<u32, usize>) {
        let mut out = format!("%PDF-{}\n%\u{e2}\u{e3}\n", self.version).into_bytes();
        let mut offsets = BTreeMap::new();
        for (num, bytes) in &self.objects {
            offsets.insert(*num, out.len());
            out.extend_from_slice(bytes);
        }
        if let (Some(container), false) = (object_stream, self.packed.is_empty()) {
            offsets.insert(container, out.len());
            out.extend_from_slice(&self.object_stream(container));
        }
        (out, offsets)
    }

    fn object_stream(&self, container: u32) -> Vec<u8> {
        let mut header = String::new();
        let mut bodies = String::new();
        for (num, body) in &self.packed {
            header.push_str(&format!("{num} {} ", bodies.len()));
            bodies.push_str(body);
            bodies.push('\n');
        }
        let data = format!("{header}{bodies}");
        format!(
            "{container} 0 obj\n<< /Type /ObjStm /N {} /First {} /Length {} \
             >>\nstream\n{data}\nendstream\nendobj\n",
            self.packed.len(),
            header.len(),
            data.len()
        )
        .into_bytes()
    }

    fn size(&self, offsets: &BTreeMap<u32, usize>) -> u32 {
        let packed_max = self.packed.iter().map(|(n, _)| *n).max().unwrap_or(0);
        offsets.keys().copied().max().unwrap_or(0).max(packed_max) + 1
    }

    /// Classic xref table and trailer with correct offsets
    pub fn build(&self) -> Vec<u8> {
        self.build_with_offset_shift(0)
    }

    /// Classic xref table whose offsets are all off by `shift` bytes
    pub fn build_with_offset_shift(&self, shift: usize) -> Vec<u8> {
        let (mut out, offsets) = self.body(None);
        let size = self.size(&offsets);
        let xref = out.len();

        out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
        for num in 0..size {
            match offsets.get(&num) {
                Some(offset) => {
                    out.extend_from_slice(format!("{:010} 00000 n \n", offset + shift).as_bytes())
                }
                None => out.extend_from_slice(b"0000000000 65535 f \n"),
            }
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {size} /Root 1 0 R{} >>\nstartxref\n{xref}\n%%EOF\n",
                self.trailer_extra
            )
            .as_bytes(),
        );
        out
    }

    /// Objects only: no xref, no trailer, no startxref
    pub fn build_without_xref(&self) -> Vec<u8> {
        let container = self.size(&BTreeMap::new()).max(100);
        let (mut out, _) = self.body(Some(container));
        out.extend_from_slice(b"%%EOF\n");
        out
    }

    /// Cross-reference stream (`/W [1 4 2]`); packed objects go into object
    /// stream `container` with type 2 entries
    pub fn build_with_xref_stream(&self, container: u32, xref_num: u32) -> Vec<u8> {
        let (mut out, offsets) = self.body(Some(container));
        let size = self.size(&offsets).max(xref_num + 1);
        let xref = out.len();

        let mut rows = Vec::new();
        for num in 0..size {
            let packed_index = self.packed.iter().position(|(n, _)| *n == num);
            let (kind, field2, field3): (u8, u32, u16) = if num == xref_num {
                (1, xref as u32, 0)
            } else if let Some(offset) = offsets.get(&num) {
                (1, *offset as u32, 0)
            } else if let Some(index) = packed_index {
                (2, container, index as u16)
            } else {
                (0, 0, 0xFFFF)
            };
            rows.push(kind);
            rows.extend_from_slice(&field2.to_be_bytes());
            rows.extend_from_slice(&field3.to_be_bytes());
        }

        out.extend_from_slice(
            format!(
                "{xref_num} 0 obj\n<< /Type /XRef /Size {size} /W [1 4 2] /Root 1 0 R{} /Length \
                 {} >>\nstream\n",
                self.trailer_extra,
                rows.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&rows);
        out.extend_from_slice(
            format!("\nendstream\nendobj\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
        );
        out
    }
}

pub const HELVETICA: &str =
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>";

/// Catalog 1, pages 2, page 3 (US Letter, font /F1 = 5), content 4, font 5
pub fn single_page(content: &str) -> PdfBuilder {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
        )
        .stream(4, "", content.as_bytes())
        .object(5, HELVETICA)
}

/// One page per entry of `contents`, sharing font /F1 = 3 through the page
/// tree root. Pages are objects 10, 12, ...; their contents 11, 13, ...
pub fn multi_page(contents: &[&str]) -> PdfBuilder {
    let kids: Vec<String> = (0..contents.len())
        .map(|i| format!("{} 0 R", 10 + 2 * i))
        .collect();
    let mut builder = PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] /Resources << \
                 /Font << /F1 3 0 R >> >> >>",
                kids.join(" "),
                contents.len()
            ),
        )
        .object(3, HELVETICA);
    for (i, content) in contents.iter().enumerate() {
        let page = 10 + 2 * i as u32;
        builder = builder
            .object(page, &format!("<< /Type /Page /Parent 2 0 R /Contents {} 0 R >>", page + 1))
            .stream(page + 1, "", content.as_bytes());
    }
    builder
}

/// Content showing `text` with /F1 at 12pt, baseline at (x, y) in PDF space
pub fn show(text: &str, x: f64, y: f64) -> String {
    format!("BT /F1 12 Tf {x} {y} Td ({text}) Tj ET")
}

#[cfg(feature = "compression")]
pub fn deflate(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory write");
    encoder.finish().expect("in-memory finish")
}
