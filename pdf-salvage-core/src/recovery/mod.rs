//! PDF recovery
//!
//! Rebuilds the object table of a document whose cross-reference index is
//! missing, truncated or wrong, by scanning the whole buffer for object
//! headers (see [`scanner`]). This is a regular load strategy, used whenever
//! the indexed load fails its sanity check.
//!
//! The trailer is chosen in order of preference from: the last `trailer`
//! dictionary naming a usable `/Root`, the last cross-reference stream
//! naming one, and finally the last object typed `/Catalog`.

use crate::parser::object_stream::ObjectStream;
use crate::parser::objects::{PdfDictionary, PdfObject};
use crate::parser::store::{materialize_all, LoadStrategy, LoadedTable, ObjectTable, RawObject};
use crate::parser::{Diagnostics, ParseError, ParseResult};

pub mod scanner;

pub use scanner::{ObjectScanner, ScanResult, ScanStats, ScannedObject};

/// Build an object table by scanning `input`
pub(crate) fn recover(input: &[u8], diag: &mut Diagnostics) -> ParseResult<LoadedTable> {
    let scan = ObjectScanner::new().scan(input);
    if scan.spans.is_empty() {
        return Err(ParseError::MissingRoot(
            "recovery scan found no objects".to_string(),
        ));
    }
    tracing::debug!(
        "Recovery scan: {} objects, {} rejected candidates",
        scan.spans.len(),
        scan.stats.candidates_rejected
    );

    let mut objects = materialize_all(input, &scan.spans);
    let unpacked = unpack_object_streams(&objects, diag);
    for raw in unpacked {
        // Directly stored objects take precedence
        objects.entry(raw.object_number).or_insert(raw);
    }

    let trailer = select_trailer(&scan, &objects).ok_or_else(|| {
        ParseError::MissingRoot("no trailer /Root and no /Catalog object found".to_string())
    })?;

    diag.warn(format!(
        "Rebuilt object table by scanning: {} objects",
        objects.len()
    ));

    Ok(LoadedTable {
        objects,
        trailer,
        strategy: LoadStrategy::Recovered,
        mismatches: 0,
    })
}

/// Objects held in every `/Type /ObjStm` stream of the table
fn unpack_object_streams(objects: &ObjectTable, diag: &mut Diagnostics) -> Vec<RawObject> {
    let mut containers: Vec<&RawObject> = objects
        .values()
        .filter(|o| o.object_type() == Some("ObjStm"))
        .collect();
    containers.sort_by_key(|o| o.object_number);

    let mut unpacked = Vec::new();
    for container in containers {
        match ObjectStream::parse(container) {
            Ok(stream) => unpacked.extend(stream.objects()),
            Err(e) => diag.warn(format!(
                "Skipping object stream {}: {e}",
                container.object_number
            )),
        }
    }
    unpacked
}

fn usable_root(dict: &PdfDictionary, objects: &ObjectTable) -> bool {
    dict.get_reference("Root")
        .and_then(|(num, _)| objects.get(&num))
        .is_some_and(|o| o.dict().is_some())
}

fn select_trailer(scan: &ScanResult, objects: &ObjectTable) -> Option<PdfDictionary> {
    if let Some(trailer) = scan
        .trailers
        .iter()
        .rev()
        .find(|t| usable_root(t, objects))
    {
        return Some(trailer.clone());
    }

    // Cross-reference streams carry the trailer keys in their dictionary
    let xref_stream_trailer = scan
        .objects
        .iter()
        .rev()
        .filter_map(|header| objects.get(&header.id))
        .filter(|o| o.object_type() == Some("XRef"))
        .filter_map(RawObject::dict)
        .find(|d| usable_root(d, objects));
    if let Some(dict) = xref_stream_trailer {
        return Some(dict.clone());
    }

    let catalog = last_catalog(scan, objects)?;
    tracing::debug!("Using catalog object {} as document root", catalog.object_number);

    // Keep whatever else a damaged trailer still offers (/Info, /ID)
    let mut trailer = scan.trailers.last().cloned().unwrap_or_default();
    trailer.insert(
        "Root",
        PdfObject::Reference(catalog.object_number, catalog.generation),
    );
    Some(trailer)
}

/// The catalog stored last in the file, falling back to compressed ones
fn last_catalog<'a>(scan: &ScanResult, objects: &'a ObjectTable) -> Option<&'a RawObject> {
    let direct = scan
        .objects
        .iter()
        .rev()
        .filter_map(|header| objects.get(&header.id))
        .find(|o| o.object_type() == Some("Catalog"));

    direct.or_else(|| {
        objects
            .values()
            .filter(|o| o.object_type() == Some("Catalog"))
            .max_by_key(|o| o.object_number)
    })
}
