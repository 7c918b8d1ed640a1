//! Values-array reader (spec §4.7, component H): per-row raw bytes for Table
//! Context flavors, either heap-local or backed by a sub-node descriptor stream.

use crate::collab::DescriptorDataSource;
use crate::error::PffResult;

/// Yields the raw bytes for row `n` of a values array.
pub enum ValuesArray {
    /// `values_array_reference` was a heap HNID; `data` is the whole cloned heap
    /// slot, sliced per row.
    Local { data: Vec<u8>, entry_size: usize },
    /// `values_array_reference` was a sub-node reference; rows live across the
    /// blocks of that sub-node's descriptor data stream.
    External {
        stream: Box<dyn DescriptorDataSource>,
        entry_size: usize,
        rows_per_block: usize,
    },
}

impl ValuesArray {
    pub fn new_local(data: Vec<u8>, entry_size: usize) -> Self {
        ValuesArray::Local { data, entry_size }
    }

    /// Builds the external backend: `rows_per_block` is derived from the stream's
    /// first block size, per spec §4.7.
    pub fn new_external(stream: Box<dyn DescriptorDataSource>, entry_size: usize) -> PffResult<Self> {
        let block_size = if stream.block_count() > 0 {
            stream.block(0)?.uncompressed_data_size()
        } else {
            0
        };
        let rows_per_block = if entry_size == 0 { 0 } else { block_size / entry_size };

        Ok(ValuesArray::External {
            stream,
            entry_size,
            rows_per_block,
        })
    }

    pub fn entry_size(&self) -> usize {
        match self {
            ValuesArray::Local { entry_size, .. } => *entry_size,
            ValuesArray::External { entry_size, .. } => *entry_size,
        }
    }

    /// Returns the raw bytes for row `n`, or `Ok(None)` for a well-defined "absent"
    /// result on an out-of-range external row (spec §4.7: not fatal, caller flags
    /// the table `MissingRecordEntryData`).
    pub fn row(&self, n: usize) -> PffResult<Option<Vec<u8>>> {
        match self {
            ValuesArray::Local { data, entry_size } => {
                let start = n * entry_size;
                let end = start + entry_size;
                if end > data.len() {
                    return Ok(None);
                }
                Ok(Some(data[start..end].to_vec()))
            }
            ValuesArray::External {
                stream,
                entry_size,
                rows_per_block,
            } => {
                if *rows_per_block == 0 {
                    return Ok(None);
                }
                let block_index = n / rows_per_block;
                if block_index >= stream.block_count() {
                    return Ok(None);
                }
                let offset_in_block = (n % rows_per_block) * entry_size;
                let block = stream.block(block_index)?;
                if offset_in_block + entry_size > block.uncompressed_data_size() {
                    return Ok(None);
                }
                Ok(Some(
                    block.data()[offset_in_block..offset_in_block + entry_size].to_vec(),
                ))
            }
        }
    }
}
