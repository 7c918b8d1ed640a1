//! Table index: the aggregate, per-block slot index used to resolve heap HNIDs
//! (spec components B and C).

use crate::block::PhysicalBlock;
use crate::collab::DescriptorDataSource;
use crate::error::{PffError, PffResult};
use crate::hnid::{FileType, Hnid};

/// One heap slot: `{block_index, offset, size}` (spec §3 "Block slot").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableIndexValue {
    pub block_index: u32,
    pub offset: u16,
    pub size: u16,
}

/// The ordered list of slots for a single physical block (spec component B).
#[derive(Debug, Clone, Default)]
pub struct TableBlockIndex {
    pub slots: Vec<TableIndexValue>,
}

impl TableBlockIndex {
    fn from_block(block_index: u32, block: &PhysicalBlock) -> PffResult<Self> {
        let map = block.allocation_map()?;
        let mut slots = Vec::with_capacity(map.slot_count());
        for i in 0..map.slot_count() {
            let (start, end) = map.slot_span(i).expect("i < slot_count");
            slots.push(TableIndexValue {
                block_index,
                offset: start,
                size: end - start,
            });
        }
        Ok(TableBlockIndex { slots })
    }
}

/// The full per-block index array for a descriptor (spec component C), built by
/// scanning every physical block of the descriptor stream.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    blocks: Vec<TableBlockIndex>,
}

impl TableIndex {
    pub fn build(source: &dyn DescriptorDataSource) -> PffResult<Self> {
        let mut blocks = Vec::with_capacity(source.block_count());
        for i in 0..source.block_count() {
            let block = source.block(i)?;
            blocks.push(TableBlockIndex::from_block(i as u32, &block)?);
        }
        Ok(TableIndex { blocks })
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_slots(&self, block_index: usize) -> Option<&[TableIndexValue]> {
        self.blocks.get(block_index).map(|b| b.slots.as_slice())
    }

    /// Resolves a heap-referencing HNID to its slot, per spec §4.1.
    pub fn resolve(&self, hnid: Hnid, file_type: FileType) -> PffResult<TableIndexValue> {
        let (block_index, slot_index) = hnid.split(file_type).ok_or_else(|| {
            PffError::invalid_argument("hnid is not a heap reference or has zero slot number")
        })?;

        let block = self
            .blocks
            .get(block_index as usize)
            .ok_or_else(|| PffError::out_of_bounds("hnid block selector out of range"))?;

        let slot = block
            .slots
            .get(slot_index as usize)
            .ok_or_else(|| PffError::out_of_bounds("hnid slot selector out of range"))?;

        Ok(*slot)
    }
}
