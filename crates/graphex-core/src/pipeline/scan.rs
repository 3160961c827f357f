//! Pattern-based discovery of image XObjects in a PDF byte buffer.
//!
//! This is deliberately not a PDF parser: there is no xref table, no indirect
//! object resolution and no tokenizer. Objects are found by their
//! `N G obj ... endobj` delimiters and attributes are read with anchored
//! patterns over the object dictionary.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::collections::BTreeMap;

use crate::error::DocumentError;
use crate::types::{ColorSpace, ImageObject, StreamFilter};

static OBJECT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)\b(\d+)\s+\d+\s+obj\b").unwrap());
static STREAM_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)stream\r?\n").unwrap());
static SUBTYPE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Subtype\s*/Image\b").unwrap());
static WIDTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Width\s+(\d+)").unwrap());
static HEIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Height\s+(\d+)").unwrap());
static BITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/BitsPerComponent\s+(\d+)").unwrap());
static LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/Length\s+(\d+)(\s+\d+\s+R\b)?").unwrap());
static COLOR_SPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)/ColorSpace\s*(?:(/[^\s/\[\]<>()]+)|\[([^\]]*)\])").unwrap()
});
static FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/Filter\s*(?:(/[^\s/\[\]<>()]+)|\[([^\]]*)\])").unwrap());
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/[^\s/\[\]<>()]+").unwrap());

/// Lazily scan `bytes` for image objects.
///
/// Non-image objects are skipped. The iterator yields at most one `Err`, after
/// which it is exhausted: a missing dimension or stream means the container is
/// too damaged to trust anything that follows.
pub fn scan(bytes: &[u8]) -> ImageObjects<'_> {
    ImageObjects {
        bytes,
        pos: 0,
        done: false,
    }
}

/// Scan the whole buffer eagerly, stopping at the first fatal error.
///
/// The result is ordered by object number. When an object number is defined
/// more than once (incremental updates), the last definition wins.
pub fn scan_document(bytes: &[u8]) -> Result<Vec<ImageObject>, DocumentError> {
    let mut objects = BTreeMap::new();
    for image in scan(bytes) {
        let image = image?;
        if let Some(previous) = objects.insert(image.object_number, image) {
            tracing::warn!(
                "obj{} is defined more than once; keeping the last definition",
                previous.object_number
            );
        }
    }
    Ok(objects.into_values().collect())
}

/// Iterator returned by [`scan`].
pub struct ImageObjects<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl Iterator for ImageObjects<'_> {
    type Item = Result<ImageObject, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(object) = next_object(self.bytes, self.pos) else {
                self.done = true;
                break;
            };
            self.pos = object.end;

            if !SUBTYPE_IMAGE.is_match(object.dict) {
                continue;
            }

            let result = build_image(self.bytes, &object);
            if result.is_err() {
                self.done = true;
            }
            return Some(result);
        }
        None
    }
}

/// Byte ranges of one `obj ... endobj` span.
struct RawObject<'a> {
    number: u32,
    dict: &'a [u8],
    /// Offset of the first byte after the `stream` line break
    data_start: Option<usize>,
    /// Offset just past `endobj` (or the end of the buffer)
    end: usize,
}

fn next_object(bytes: &[u8], from: usize) -> Option<RawObject<'_>> {
    let rest = bytes.get(from..)?;
    let header = OBJECT_HEADER.captures(rest)?;
    let number = parse_u32(header.get(1)?.as_bytes());
    let body_start = from + header.get(0)?.end();

    // The stream keyword always precedes any `endobj` lookalike in its data,
    // so the first `endobj` bounds the keyword search.
    let endobj = find(bytes, b"endobj", body_start);
    let search_end = endobj.unwrap_or(bytes.len());
    let stream = STREAM_START
        .find(&bytes[body_start..search_end])
        .map(|m| (body_start + m.start(), body_start + m.end()));

    let (dict_end, data_start) = match (stream, endobj) {
        (Some((keyword, data)), _) => (keyword, Some(data)),
        (None, Some(end)) => (end, None),
        (None, None) => return None,
    };
    let dict = &bytes[body_start..dict_end];

    let end = match data_start {
        Some(data) => {
            let (_, data_end) = stream_extent(bytes, dict, data);
            find(bytes, b"endobj", data_end).map_or(bytes.len(), |e| e + b"endobj".len())
        }
        None => endobj.map_or(bytes.len(), |e| e + b"endobj".len()),
    };

    Some(RawObject {
        number,
        dict,
        data_start,
        end,
    })
}

/// Locate stream data starting at `data_start`.
///
/// A direct `/Length` wins over any terminator search, since compressed data
/// can contain `endstream` by accident. Returns `(data range end, resume
/// offset for the endobj search)`.
fn stream_extent(bytes: &[u8], dict: &[u8], data_start: usize) -> (usize, usize) {
    if let Some(length) = direct_length(dict) {
        let end = data_start.saturating_add(length).min(bytes.len());
        return (end, end);
    }

    let terminator = find(bytes, b"endstream", data_start)
        .or_else(|| find(bytes, b"endobj", data_start))
        .unwrap_or(bytes.len());
    let mut end = terminator;
    while end > data_start && matches!(bytes[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    (end, terminator)
}

fn build_image(bytes: &[u8], object: &RawObject<'_>) -> Result<ImageObject, DocumentError> {
    let number = object.number;
    let dict = object.dict;

    let (Some(width), Some(height), Some(bits_per_component)) = (
        capture_u32(&WIDTH, dict),
        capture_u32(&HEIGHT, dict),
        capture_u32(&BITS, dict),
    ) else {
        return Err(DocumentError::MissingDimensionMetadata {
            object_number: number,
        });
    };

    let data_start = object.data_start.ok_or(DocumentError::MissingStream {
        object_number: number,
    })?;
    let (data_end, _) = stream_extent(bytes, dict, data_start);

    let color_space = match name_value(&COLOR_SPACE, dict) {
        Some(NameValue::Single(name)) => ColorSpace::from_name(&name),
        Some(NameValue::Array(items)) => ColorSpace::Other(format!("[{}]", items.trim())),
        None => ColorSpace::DeviceRgb,
    };
    let filter = match name_value(&FILTER, dict) {
        Some(NameValue::Single(name)) => StreamFilter::from_name(&name),
        Some(NameValue::Array(items)) => array_filter(&items),
        None => StreamFilter::Unsupported(String::new()),
    };

    tracing::trace!(
        "Found image obj{} ({}x{}, {}, {}, {} stream bytes)",
        number,
        width,
        height,
        color_space,
        filter,
        data_end - data_start
    );

    Ok(ImageObject {
        object_number: number,
        width,
        height,
        color_space,
        bits_per_component,
        filter,
        raw_stream: bytes[data_start..data_end].to_vec(),
    })
}

enum NameValue {
    Single(String),
    Array(String),
}

fn name_value(pattern: &Regex, dict: &[u8]) -> Option<NameValue> {
    let caps = pattern.captures(dict)?;
    if let Some(name) = caps.get(1) {
        return Some(NameValue::Single(
            String::from_utf8_lossy(name.as_bytes()).into_owned(),
        ));
    }
    caps.get(2)
        .map(|items| NameValue::Array(String::from_utf8_lossy(items.as_bytes()).into_owned()))
}

/// `[/FlateDecode]` is the same as `/FlateDecode`; chains are not supported.
fn array_filter(items: &str) -> StreamFilter {
    let names: Vec<&[u8]> = NAME
        .find_iter(items.as_bytes())
        .map(|m| m.as_bytes())
        .collect();
    match names.as_slice() {
        [single] if items.trim().len() == single.len() => {
            StreamFilter::from_name(&String::from_utf8_lossy(single))
        }
        _ => StreamFilter::Unsupported(format!("[{}]", items.trim())),
    }
}

/// `/Length N`, unless it is an indirect reference (`/Length N G R`).
fn direct_length(dict: &[u8]) -> Option<usize> {
    let caps = LENGTH.captures(dict)?;
    if caps.get(2).is_some() {
        return None;
    }
    let digits = caps.get(1)?.as_bytes();
    Some(
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(usize::MAX),
    )
}

fn capture_u32(pattern: &Regex, dict: &[u8]) -> Option<u32> {
    let caps = pattern.captures(dict)?;
    Some(parse_u32(caps.get(1)?.as_bytes()))
}

/// Parse ASCII digits, saturating on overflow.
fn parse_u32(digits: &[u8]) -> u32 {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(u32::MAX)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}
