//! String decoding policy (spec §4.10, design notes: "the codepage-1200 UTF-8/UTF-16
//! heuristic is intentional and behavior-defining").

use crate::collab::UnicodeConverter;
use crate::error::{PffError, PffResult};
use crate::value_type::{STRING_ASCII, STRING_UNICODE};
use std::cmp::Ordering;

const CODEPAGE_UTF7: u32 = 65000;
const CODEPAGE_UTF8: u32 = 65001;
const CODEPAGE_UNICODE: u32 = 1200;

/// `true` if `bytes` contains a zero byte immediately followed by a non-zero byte,
/// anywhere. Preserved byte-for-byte per the design notes: this is the heuristic
/// libpff itself uses to tell UTF-16 apart from UTF-8 for an "ASCII" string column
/// whose file-level codepage claims Unicode.
pub fn looks_like_utf16(bytes: &[u8]) -> bool {
    bytes.windows(2).any(|w| w[0] == 0 && w[1] != 0)
}

fn decode_utf16le(bytes: &[u8]) -> PffResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(PffError::conversion_failed(
            "UTF-16LE byte stream has odd length",
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| PffError::conversion_failed(e.to_string()))
}

/// Decodes a record entry's string bytes to UTF-8, per spec §4.10's decoding
/// policy table.
pub fn decode_string(
    value_type: u16,
    codepage: u32,
    bytes: &[u8],
    converter: &dyn UnicodeConverter,
) -> PffResult<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }

    match value_type {
        STRING_UNICODE => decode_utf16le(bytes),
        STRING_ASCII => {
            if codepage == CODEPAGE_UNICODE {
                if looks_like_utf16(bytes) {
                    decode_utf16le(bytes)
                } else {
                    std::str::from_utf8(bytes)
                        .map(|s| s.to_string())
                        .map_err(|e| PffError::conversion_failed(e.to_string()))
                }
            } else if codepage == CODEPAGE_UTF7 {
                converter.decode_utf7(bytes)
            } else if codepage == CODEPAGE_UTF8 {
                std::str::from_utf8(bytes)
                    .map(|s| s.to_string())
                    .map_err(|e| PffError::conversion_failed(e.to_string()))
            } else {
                converter.decode_codepage(codepage, bytes)
            }
        }
        other => Err(PffError::value_mismatch(format!(
            "decode_string called with non-string value_type {other:#06x}"
        ))),
    }
}

/// Three-way comparison per spec `compare_with_utf8`/`compare_with_utf16`: decodes
/// using the same routing as [`decode_string`] and compares the resulting strings.
pub fn compare_string(
    value_type: u16,
    codepage: u32,
    bytes: &[u8],
    other: &str,
    converter: &dyn UnicodeConverter,
) -> PffResult<Ordering> {
    let decoded = decode_string(value_type, codepage, bytes, converter)?;
    Ok(decoded.as_str().cmp(other))
}
