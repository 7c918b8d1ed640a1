//! Heap reader: resolves a heap-referencing HNID to its raw byte slice (spec §4.1,
//! component D).

use crate::collab::DescriptorDataSource;
use crate::error::{PffError, PffResult};
use crate::hnid::{FileType, Hnid};
use crate::table_index::TableIndex;

/// Resolves heap HNIDs against a descriptor's blocks and table index.
pub struct HeapReader<'a> {
    source: &'a dyn DescriptorDataSource,
    index: &'a TableIndex,
    file_type: FileType,
}

impl<'a> HeapReader<'a> {
    pub fn new(
        source: &'a dyn DescriptorDataSource,
        index: &'a TableIndex,
        file_type: FileType,
    ) -> Self {
        HeapReader {
            source,
            index,
            file_type,
        }
    }

    /// Clones the bytes addressed by `hnid` so the caller can hold them independent
    /// of any block cache (spec: "Clone by reference").
    pub fn clone_by_ref(&self, hnid: Hnid) -> PffResult<Vec<u8>> {
        if !hnid.is_heap_reference() {
            return Err(PffError::invalid_argument(
                "hnid's low 5 bits are non-zero; not a heap reference",
            ));
        }

        let slot = self.index.resolve(hnid, self.file_type)?;
        let block = self.source.block(slot.block_index as usize)?;

        let start = slot.offset as usize;
        let end = start + slot.size as usize;
        if end > block.uncompressed_data_size() {
            return Err(PffError::out_of_bounds(
                "heap slot span exceeds block's uncompressed size",
            ));
        }

        Ok(block.data()[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::VecBlockSource;

    fn block_bytes(payload: &[u8], slot_offsets: &[u16]) -> Vec<u8> {
        let index_offset = 2 + payload.len() as u16;
        let mut data = index_offset.to_le_bytes().to_vec();
        data.extend_from_slice(payload);
        data.extend_from_slice(&((slot_offsets.len() as u16 - 1).to_le_bytes()));
        data.extend_from_slice(&0u16.to_le_bytes());
        for o in slot_offsets {
            data.extend_from_slice(&(o + 2).to_le_bytes());
        }
        data
    }

    #[test]
    fn resolves_and_clones_slot() {
        let b0 = block_bytes(b"ABCDEF", &[0, 3, 6]);
        let source = VecBlockSource::new(vec![b0]);
        let index = TableIndex::build(&source).unwrap();
        let reader = HeapReader::new(&source, &index, FileType::Ansi32);

        let hnid = Hnid((0u32 << 16) | (2u32 << 5));
        let bytes = reader.clone_by_ref(hnid).unwrap();
        assert_eq!(bytes, b"DEF");
    }

    #[test]
    fn rejects_sub_node_reference() {
        let b0 = block_bytes(b"ABC", &[0, 3]);
        let source = VecBlockSource::new(vec![b0]);
        let index = TableIndex::build(&source).unwrap();
        let reader = HeapReader::new(&source, &index, FileType::Ansi32);

        let hnid = Hnid(0x05);
        assert!(reader.clone_by_ref(hnid).is_err());
    }
}
