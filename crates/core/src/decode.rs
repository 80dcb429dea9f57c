//! Byte-level decoding of subtitle files.
//! Fansub releases ship as UTF-8 or UTF-16 (with or without a BOM), so this
//! module picks one of those and always returns text.

use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8};
use tracing::{debug, warn};

/// Number of leading bytes inspected when guessing BOM-less UTF-16LE.
const SNIFF_LEN: usize = 1000;

/// Minimum count of `ascii, 0x00` pairs before the bytes are treated as UTF-16LE.
const UTF16LE_SCORE_THRESHOLD: usize = 10;

/// Encoding chosen for a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf16LeBom,
    Utf16BeBom,
    Utf16Le,
    Utf8,
}

/// Decide how `bytes` should be decoded.
pub fn detect(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return TextEncoding::Utf16LeBom;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return TextEncoding::Utf16BeBom;
    }
    if utf16le_score(bytes) > UTF16LE_SCORE_THRESHOLD {
        return TextEncoding::Utf16Le;
    }
    TextEncoding::Utf8
}

/// Count byte pairs in the sniff window that look like an ASCII char in UTF-16LE.
fn utf16le_score(bytes: &[u8]) -> usize {
    let window = &bytes[..bytes.len().min(SNIFF_LEN)];
    window
        .chunks_exact(2)
        .filter(|pair| (0x01..=0x7E).contains(&pair[0]) && pair[1] == 0x00)
        .count()
}

/// Decode raw subtitle bytes into text. Never fails: malformed sequences
/// become U+FFFD and anything unrecognised is read as UTF-8.
pub fn decode(bytes: &[u8]) -> String {
    let encoding = detect(bytes);
    debug!(?encoding, len = bytes.len(), "decoding subtitle bytes");
    let (text, had_errors) = match encoding {
        TextEncoding::Utf16LeBom => UTF_16LE.decode_without_bom_handling(&bytes[2..]),
        TextEncoding::Utf16BeBom => UTF_16BE.decode_without_bom_handling(&bytes[2..]),
        TextEncoding::Utf16Le => UTF_16LE.decode_without_bom_handling(bytes),
        TextEncoding::Utf8 => UTF_8.decode_with_bom_removal(bytes),
    };
    if had_errors {
        warn!(?encoding, "subtitle bytes contained malformed sequences");
    }
    text.into_owned()
}
