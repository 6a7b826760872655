//! PDF Stream Filters
//!
//! Handles decompression of PDF streams according to ISO 32000-1 Section 7.4.
//! Only `FlateDecode` (with PNG predictors) is decoded. A filter chain is
//! applied up to the first filter this module cannot decode; the remaining
//! filters are reported back so callers know how the returned bytes are
//! still encoded (for example an image's `DCTDecode` payload).

use super::objects::{PdfDictionary, PdfObject};
use super::{ParseError, ParseResult};

#[cfg(feature = "compression")]
use flate2::read::{DeflateDecoder, ZlibDecoder};
#[cfg(feature = "compression")]
use std::io::Read;

/// Pending filter name for a `/Filter` entry that is not a name
pub const UNRESOLVED_FILTER: &str = "Unresolved";

/// Largest `/Colors` value accepted for predictors
const MAX_PREDICTOR_COLORS: usize = 32;

/// Stream bytes after decoding plus the filters left undecoded
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedStream {
    pub data: Vec<u8>,
    /// Filter names still applying to `data`, in order
    pub pending_filters: Vec<String>,
}

/// Expand the abbreviated filter names allowed in inline images and by
/// careless writers.
pub fn normalize_filter_name(name: &str) -> &str {
    match name {
        "Fl" => "FlateDecode",
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "LZW" => "LZWDecode",
        "RL" => "RunLengthDecode",
        "CCF" => "CCITTFaxDecode",
        "DCT" => "DCTDecode",
        other => other,
    }
}

/// Decode stream data according to the `/Filter` and `/DecodeParms` entries
/// of its dictionary.
///
/// Both entries must already be direct values. A filter or parameter entry
/// that is still a reference stops decoding there, leaving the rest pending.
pub fn decode_stream(data: &[u8], dict: &PdfDictionary) -> DecodedStream {
    let filters: Vec<String> = match dict.get("Filter") {
        None | Some(PdfObject::Null) => Vec::new(),
        Some(PdfObject::Array(array)) => array.iter().map(filter_name).collect(),
        Some(other) => vec![filter_name(other)],
    };

    let params: Vec<&PdfObject> = match dict.get("DecodeParms") {
        Some(PdfObject::Array(array)) => array.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    };

    let mut result = data.to_vec();
    for (index, filter) in filters.iter().enumerate() {
        let decoded = match params.get(index) {
            None | Some(PdfObject::Null) => apply_filter(&result, filter, None),
            Some(PdfObject::Dictionary(d)) => apply_filter(&result, filter, Some(d)),
            Some(_) => Err(ParseError::StreamDecodeError(format!(
                "Unusable /DecodeParms for {filter}"
            ))),
        };
        match decoded {
            Ok(decoded) => result = decoded,
            Err(e) => {
                tracing::debug!("Leaving stream encoded at {filter}: {e}");
                return DecodedStream {
                    data: result,
                    pending_filters: filters[index..].to_vec(),
                };
            }
        }
    }

    DecodedStream {
        data: result,
        pending_filters: Vec::new(),
    }
}

/// Filter name of one `/Filter` entry; anything but a name is reported as
/// `Unresolved`, which no filter decodes.
fn filter_name(value: &PdfObject) -> String {
    match value {
        PdfObject::Name(name) => normalize_filter_name(name.as_str()).to_string(),
        _ => UNRESOLVED_FILTER.to_string(),
    }
}

/// Apply a single filter to data
fn apply_filter(
    data: &[u8],
    filter: &str,
    params: Option<&PdfDictionary>,
) -> ParseResult<Vec<u8>> {
    match filter {
        "FlateDecode" => {
            let inflated = decode_flate(data)?;
            match params.map(PredictorParams::from_dict) {
                None => Ok(inflated),
                Some(Some(predictor)) => Ok(apply_predictor(inflated, &predictor)),
                Some(None) => {
                    tracing::warn!("Ignoring predictor with unsupported /DecodeParms");
                    Ok(inflated)
                }
            }
        }
        other => Err(ParseError::StreamDecodeError(format!(
            "Filter {other} not supported"
        ))),
    }
}

/// Decode FlateDecode (zlib/deflate) compressed data.
///
/// Truncated or partly corrupt input yields whatever inflated before the
/// damage. A stream missing its zlib header is retried as raw deflate.
#[cfg(feature = "compression")]
pub fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let (zlib, zlib_err) = inflate_lenient(ZlibDecoder::new(data));
    if zlib_err.is_none() || !zlib.is_empty() {
        if let Some(e) = zlib_err {
            tracing::debug!("Flate stream damaged, kept {} bytes: {e}", zlib.len());
        }
        return Ok(zlib);
    }

    let (raw, raw_err) = inflate_lenient(DeflateDecoder::new(data));
    match raw_err {
        Some(e) if raw.is_empty() => Err(ParseError::StreamDecodeError(format!(
            "Flate decode error: {e}"
        ))),
        _ => Ok(raw),
    }
}

#[cfg(not(feature = "compression"))]
pub fn decode_flate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::StreamDecodeError(
        "FlateDecode requires 'compression' feature".to_string(),
    ))
}

#[cfg(feature = "compression")]
fn inflate_lenient<R: Read>(mut reader: R) -> (Vec<u8>, Option<std::io::Error>) {
    let mut out = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return (out, None),
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return (out, Some(e)),
        }
    }
}

/// `/DecodeParms` entries relevant to predictors
#[derive(Debug, Clone, Copy, PartialEq)]
struct PredictorParams {
    predictor: i64,
    colors: usize,
    bits_per_component: usize,
    columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    /// None when the sample layout is not one a PNG predictor can describe
    fn from_dict(dict: &PdfDictionary) -> Option<Self> {
        let default = Self::default();
        let colors = match dict.get_integer("Colors") {
            None => default.colors,
            Some(c) => usize::try_from(c)
                .ok()
                .filter(|c| (1..=MAX_PREDICTOR_COLORS).contains(c))?,
        };
        let bits_per_component = match dict.get_integer("BitsPerComponent") {
            None => default.bits_per_component,
            Some(b @ (1 | 2 | 4 | 8 | 16)) => b as usize,
            Some(_) => return None,
        };
        let columns = match dict.get_integer("Columns") {
            None => default.columns,
            Some(c) => usize::try_from(c).ok().filter(|c| (1..=1 << 16).contains(c))?,
        };
        Some(Self {
            predictor: dict.get_integer("Predictor").unwrap_or(default.predictor),
            colors,
            bits_per_component,
            columns,
        })
    }

    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }

    fn row_length_in_bytes(&self) -> usize {
        (self.colors * self.bits_per_component * self.columns).div_ceil(8)
    }
}

/// Undo PNG row prediction. Predictors below 10 pass through unchanged.
fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Vec<u8> {
    if params.predictor < 10 {
        return data;
    }

    let row_len = params.row_length_in_bytes();
    if row_len == 0 {
        return data;
    }
    if row_len > data.len() {
        tracing::warn!(
            "Predictor row of {row_len} bytes exceeds {} inflated bytes, leaving data as is",
            data.len()
        );
        return data;
    }
    let bpp = params.bytes_per_pixel();

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_len];
    let mut row = vec![0u8; row_len];

    // Each encoded row is one filter-type byte followed by row_len bytes;
    // a short final row is decoded as far as it goes.
    for encoded in data.chunks(row_len + 1) {
        let (&filter_type, cur) = match encoded.split_first() {
            Some(split) => split,
            None => break,
        };

        for i in 0..cur.len() {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev_row[i];
            let up_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
            row[i] = match filter_type {
                1 => cur[i].wrapping_add(left),
                2 => cur[i].wrapping_add(up),
                3 => cur[i].wrapping_add(((u16::from(left) + u16::from(up)) / 2) as u8),
                4 => cur[i].wrapping_add(paeth(left, up, up_left)),
                _ => cur[i],
            };
        }

        out.extend_from_slice(&row[..cur.len()]);
        std::mem::swap(&mut prev_row, &mut row);
    }

    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict_from(input: &[u8]) -> PdfDictionary {
        PdfObject::from_bytes(input)
            .and_then(|o| o.as_dict().cloned())
            .unwrap()
    }

    #[cfg(feature = "compression")]
    fn compress(data: &[u8]) -> Vec<u8> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_stream_no_filter() {
        let decoded = decode_stream(b"raw bytes", &PdfDictionary::new());
        assert_eq!(decoded.data, b"raw bytes");
        assert!(decoded.pending_filters.is_empty());
    }

    #[test]
    fn test_unsupported_filter_stays_pending() {
        let dict = dict_from(b"<< /Filter /DCTDecode >>");
        let decoded = decode_stream(b"\xFF\xD8jpeg", &dict);
        assert_eq!(decoded.data, b"\xFF\xD8jpeg");
        assert_eq!(decoded.pending_filters, vec!["DCTDecode".to_string()]);
    }

    #[test]
    fn test_abbreviated_filter_names() {
        assert_eq!(normalize_filter_name("Fl"), "FlateDecode");
        assert_eq!(normalize_filter_name("DCT"), "DCTDecode");
        assert_eq!(normalize_filter_name("JPXDecode"), "JPXDecode");
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode() {
        let original = b"Hello, compressed world!";
        let result = decode_flate(&compress(original)).unwrap();
        assert_eq!(result, original);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode_truncated_keeps_prefix() {
        let original: Vec<u8> = (0..4000u32).map(|i| (i % 251) as u8).collect();
        let compressed = compress(&original);
        let truncated = &compressed[..compressed.len() / 2];

        let result = decode_flate(truncated).unwrap_or_default();
        assert!(result.len() <= original.len());
        assert_eq!(&original[..result.len()], &result[..]);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_then_dct_chain() {
        let dict = dict_from(b"<< /Filter [/FlateDecode /DCTDecode] >>");
        let decoded = decode_stream(&compress(b"\xFF\xD8jpeg"), &dict);
        assert_eq!(decoded.data, b"\xFF\xD8jpeg");
        assert_eq!(decoded.pending_filters, vec!["DCTDecode".to_string()]);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_garbage_flate_stays_pending() {
        let dict = dict_from(b"<< /Filter /FlateDecode >>");
        let decoded = decode_stream(b"\x06\x00not zlib", &dict);
        assert_eq!(decoded.pending_filters, vec!["FlateDecode".to_string()]);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_with_png_up_predictor() {
        // Two rows of three bytes, both using the Up filter
        let encoded = [2u8, 1, 2, 3, 2, 1, 1, 1];
        let dict = dict_from(
            b"<< /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 3 >> >>",
        );
        let decoded = decode_stream(&compress(&encoded), &dict);
        assert_eq!(decoded.data, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_png_predictors() {
        let params = PredictorParams {
            predictor: 15,
            colors: 1,
            bits_per_component: 8,
            columns: 3,
        };
        // Sub, then Average, then Paeth
        let encoded = vec![1, 5, 1, 1, 3, 4, 4, 4, 4, 1, 1, 1];
        let decoded = apply_predictor(encoded, &params);
        assert_eq!(decoded[..3], [5, 6, 7]);
        // Average: left is previous output byte, up is previous row
        assert_eq!(decoded[3], 4 + (5 / 2));
        assert_eq!(decoded.len(), 9);
    }

    #[test]
    fn test_predictor_below_ten_passes_through() {
        let params = PredictorParams {
            predictor: 2,
            ..Default::default()
        };
        assert_eq!(apply_predictor(vec![9, 8, 7], &params), vec![9, 8, 7]);
    }

    #[test]
    fn test_paeth() {
        assert_eq!(paeth(10, 20, 10), 20);
        assert_eq!(paeth(20, 10, 10), 20);
        assert_eq!(paeth(0, 0, 0), 0);
    }

    #[test]
    fn test_predictor_params_reject_impossible_layouts() {
        let params = |body: &[u8]| PredictorParams::from_dict(&dict_from(body));

        assert!(params(b"<< /Predictor 12 /Columns 4 /Colors 3 /BitsPerComponent 16 >>").is_some());
        assert!(params(b"<< /Predictor 12 /BitsPerComponent 65536 >>").is_none());
        assert!(params(b"<< /Predictor 12 /BitsPerComponent 3 >>").is_none());
        assert!(params(b"<< /Predictor 12 /Colors 65536 >>").is_none());
        assert!(params(b"<< /Predictor 12 /Columns 0 >>").is_none());
    }

    #[test]
    fn test_predictor_row_longer_than_data_passes_through() {
        let params = PredictorParams {
            predictor: 12,
            colors: 32,
            bits_per_component: 16,
            columns: 1 << 16,
        };
        assert_eq!(apply_predictor(vec![2, 1, 1], &params), vec![2, 1, 1]);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_oversized_decode_parms_keep_inflated_bytes() {
        let dict = dict_from(
            b"<< /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 65536 /Colors 65536 \
              /BitsPerComponent 65536 >> >>",
        );
        let decoded = decode_stream(&compress(b"BT ET"), &dict);
        assert_eq!(decoded.data, b"BT ET");
        assert!(decoded.pending_filters.is_empty());
    }

    #[test]
    fn test_unresolved_filter_entries_stay_pending() {
        let decoded = decode_stream(b"data", &dict_from(b"<< /Filter 7 0 R >>"));
        assert_eq!(decoded.data, b"data");
        assert_eq!(decoded.pending_filters, vec![UNRESOLVED_FILTER.to_string()]);

        let decoded = decode_stream(
            b"data",
            &dict_from(b"<< /Filter [/FlateDecode] /DecodeParms 8 0 R >>"),
        );
        assert_eq!(decoded.data, b"data");
        assert_eq!(decoded.pending_filters, vec!["FlateDecode".to_string()]);
    }
}
