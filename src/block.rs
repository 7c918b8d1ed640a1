//! Physical data blocks and their block-local allocation map (spec §4.2, §4.3).
//!
//! A [`PhysicalBlock`] is a collaborator-supplied, already-decrypted and
//! already-decompressed buffer for one physical block of a descriptor's data. The
//! block's own allocation map (the "heap" header inside it) is parsed here into an
//! ordered list of `(offset, size)` slots.

use crate::error::{PffError, PffResult};
use nom::number::complete as number;

/// One physical block of a descriptor's data, as delivered by the data-block reader
/// collaborator (spec component A). Ownership of `data` is up to the caller; the
/// table core only ever borrows it for the duration of a parse, or clones the bytes
/// it needs out of it (spec §5: "heap reader copies bytes when exposing a slot
/// across any operation that may trigger further cache fetches").
#[derive(Debug, Clone)]
pub struct PhysicalBlock {
    data: Vec<u8>,
}

impl PhysicalBlock {
    pub fn new(data: Vec<u8>) -> Self {
        PhysicalBlock { data }
    }

    pub fn uncompressed_data_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Parses this block's allocation map (spec §4.3) into slots. Block 0 having
    /// fewer than 4 bytes is fatal per spec §4.2.
    pub fn allocation_map(&self) -> PffResult<AllocationMap> {
        if self.data.len() < 4 {
            return Err(PffError::invalid_format(
                "block too small to contain a heap allocation map",
            ));
        }

        let (rest, index_offset) = number::le_u16::<_, nom::error::Error<&[u8]>>(&self.data)
            .map_err(|e| PffError::invalid_format(format!("{e}")))?;
        let index_offset = index_offset as usize;

        if index_offset + 4 > self.data.len() {
            return Err(PffError::out_of_bounds(
                "allocation map index_offset past end of block",
            ));
        }
        let _ = rest;

        let map_bytes = &self.data[index_offset..];
        let (map_bytes, number_of_offsets) =
            number::le_u16::<_, nom::error::Error<&[u8]>>(map_bytes)
                .map_err(|e| PffError::invalid_format(format!("{e}")))?;
        let (mut map_bytes, number_of_unused_offsets) =
            number::le_u16::<_, nom::error::Error<&[u8]>>(map_bytes)
                .map_err(|e| PffError::invalid_format(format!("{e}")))?;

        let count = number_of_offsets as usize + 1;
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let (rest, off) = number::le_u16::<_, nom::error::Error<&[u8]>>(map_bytes)
                .map_err(|e| PffError::invalid_format(format!("{e}")))?;
            offsets.push(off);
            map_bytes = rest;
        }

        for w in offsets.windows(2) {
            if w[1] < w[0] {
                return Err(PffError::invalid_format(
                    "allocation map offsets are not non-decreasing",
                ));
            }
        }
        if *offsets.last().unwrap() as usize > index_offset {
            return Err(PffError::invalid_format(
                "allocation map last offset exceeds index_offset",
            ));
        }

        Ok(AllocationMap {
            index_offset,
            number_of_unused_offsets,
            offsets,
        })
    }
}

/// A parsed block-local allocation map: `number_of_offsets + 1` monotonically
/// non-decreasing offsets, defining `number_of_offsets` slots.
#[derive(Debug, Clone)]
pub struct AllocationMap {
    pub index_offset: usize,
    pub number_of_unused_offsets: u16,
    pub offsets: Vec<u16>,
}

impl AllocationMap {
    pub fn slot_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Span `[start, end)` of slot `i`, or `None` if out of range.
    pub fn slot_span(&self, i: usize) -> Option<(u16, u16)> {
        if i + 1 >= self.offsets.len() {
            return None;
        }
        Some((self.offsets[i], self.offsets[i + 1]))
    }
}
