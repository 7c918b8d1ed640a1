//! `0xa5` pass-through table: a header-less per-block slot pool, used standalone as
//! a table flavor and as the nested side-storage pool for `0xac` columns (spec
//! §4.9).

use crate::collab::DescriptorDataSource;
use crate::error::PffResult;
use std::collections::HashMap;

/// Every slot across every block, keyed by `(block_index, slot_index)` ("row set
/// R = block index; row column C = slot index within that block"). Block 0's slot 0
/// holds the table signature header and is never a row.
#[derive(Debug, Clone, Default)]
pub struct PassThroughTable {
    rows: HashMap<(u32, u32), Vec<u8>>,
}

impl PassThroughTable {
    pub fn build(source: &dyn DescriptorDataSource) -> PffResult<Self> {
        let mut rows = HashMap::new();

        for block_index in 0..source.block_count() {
            let block = source.block(block_index)?;
            let map = block.allocation_map()?;

            for slot_index in 0..map.slot_count() {
                if block_index == 0 && slot_index == 0 {
                    continue;
                }
                let (start, end) = map.slot_span(slot_index).expect("slot_index < slot_count");
                rows.insert(
                    (block_index as u32, slot_index as u32),
                    block.data()[start as usize..end as usize].to_vec(),
                );
            }
        }

        Ok(PassThroughTable { rows })
    }

    pub fn get(&self, set_index: u32, entry_index: u32) -> Option<&[u8]> {
        self.rows.get(&(set_index, entry_index)).map(Vec::as_slice)
    }
}
