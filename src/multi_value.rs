//! Multi-value decomposition (spec §3 "Multi-value", §4.10, §6 "Multi-value variable
//! header").

use crate::error::{PffError, PffResult};
use crate::value_type::{self, *};

/// A decoded multi-value property: an ordered sequence of items sharing one base
/// value type, each addressable by byte range into the raw value bytes.
#[derive(Debug, Clone)]
pub struct MultiValue {
    value_type: u16,
    raw_bytes: Vec<u8>,
    offsets: Vec<u32>,
    sizes: Vec<usize>,
    codepage: u32,
}

fn fixed_element_size(base_type: u16) -> Option<usize> {
    match base_type {
        INTEGER_16 => Some(2),
        INTEGER_32 | FLOATING_32 | ERROR => Some(4),
        INTEGER_64 | FLOATING_64 | CURRENCY | FLOATINGTIME | FILETIME => Some(8),
        GUID => Some(16),
        _ => None,
    }
}

impl MultiValue {
    pub fn parse(value_type: u16, raw_bytes: Vec<u8>, codepage: u32) -> PffResult<Self> {
        if !value_type::is_multi_value(value_type) {
            return Err(PffError::invalid_argument(
                "MultiValue::parse called with a non-multi-value type",
            ));
        }
        let base = value_type::base_type(value_type);

        if let Some(element_size) = fixed_element_size(base) {
            if element_size != 0 && raw_bytes.len() % element_size != 0 {
                return Err(PffError::invalid_format(
                    "fixed-width multi-value length is not a multiple of the element size",
                ));
            }
            let count = if element_size == 0 { 0 } else { raw_bytes.len() / element_size };
            let offsets = (0..count).map(|i| (i * element_size) as u32).collect();
            let sizes = vec![element_size; count];

            return Ok(MultiValue {
                value_type,
                raw_bytes,
                offsets,
                sizes,
                codepage,
            });
        }

        match base {
            STRING_ASCII | STRING_UNICODE | BINARY => {
                if raw_bytes.len() < 4 {
                    return Err(PffError::invalid_format(
                        "variable-width multi-value shorter than its count header",
                    ));
                }
                let count = u32::from_le_bytes(raw_bytes[0..4].try_into().unwrap()) as usize;
                let header_len = 4 + count * 4;
                if raw_bytes.len() < header_len {
                    return Err(PffError::invalid_format(
                        "variable-width multi-value offset table truncated",
                    ));
                }

                let mut offsets = Vec::with_capacity(count);
                for i in 0..count {
                    let b = &raw_bytes[4 + i * 4..4 + i * 4 + 4];
                    offsets.push(u32::from_le_bytes(b.try_into().unwrap()));
                }

                let mut sizes = Vec::with_capacity(count);
                for i in 0..count {
                    let start = offsets[i] as usize;
                    let end = if i + 1 < count {
                        offsets[i + 1] as usize
                    } else {
                        raw_bytes.len()
                    };
                    if start > end || end > raw_bytes.len() {
                        return Err(PffError::out_of_bounds(
                            "multi-value item offset/size out of range",
                        ));
                    }
                    sizes.push(end - start);
                }

                Ok(MultiValue {
                    value_type,
                    raw_bytes,
                    offsets,
                    sizes,
                    codepage,
                })
            }
            other => Err(PffError::unsupported_value(format!(
                "unsupported multi-value base type {other:#06x}"
            ))),
        }
    }

    pub fn value_type(&self) -> u16 {
        self.value_type
    }

    pub fn codepage(&self) -> u32 {
        self.codepage
    }

    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// The raw bytes for item `index` (called `get_value` in the spec's test
    /// vectors).
    pub fn get_value(&self, index: usize) -> PffResult<&[u8]> {
        let start = *self
            .offsets
            .get(index)
            .ok_or_else(|| PffError::out_of_bounds("multi-value item index out of range"))? as usize;
        let size = self.sizes[index];
        Ok(&self.raw_bytes[start..start + size])
    }
}
