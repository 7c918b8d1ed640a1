//! BTH (B-Tree on Heap) sub-header and traversal (spec §3, §4.5, component F).

use crate::error::{Diagnostics, PffError, PffResult};
use crate::heap::HeapReader;
use crate::hnid::Hnid;
use nom::number::complete as number;

const SIGNATURE: u8 = 0xb5;

/// The `0xb5` sub-header shared by every non-`0xa5` table flavor.
#[derive(Debug, Clone, Copy)]
pub struct BthHeader {
    pub key_size: u8,
    pub value_size: u8,
    pub depth: u8,
    pub root_ref: Hnid,
}

impl BthHeader {
    pub fn parse(data: &[u8]) -> PffResult<Self> {
        if data.len() < 8 {
            return Err(PffError::invalid_format("0xb5 header shorter than 8 bytes"));
        }
        if data[0] != SIGNATURE {
            return Err(PffError::invalid_format(
                "expected 0xb5 signature on BTH sub-header",
            ));
        }
        let key_size = data[1];
        let value_size = data[2];
        let depth = data[3];
        let (_, root_ref) = number::le_u32::<_, nom::error::Error<&[u8]>>(&data[4..8])
            .map_err(|e| PffError::invalid_format(format!("{e}")))?;

        Ok(BthHeader {
            key_size,
            value_size,
            depth,
            root_ref: Hnid(root_ref),
        })
    }
}

/// Maximum recursion depth for the BTH walk (spec design notes: "table depth is
/// bounded in practice <= 8"); guards against a corrupt or cyclic tree.
const MAX_DEPTH: u8 = 32;

/// Flattens a BTH of the given `depth` rooted at `root_ref` into the ordered list of
/// leaf HNIDs (spec §4.5).
pub fn collect_leaf_hnids(
    heap: &HeapReader,
    root_ref: Hnid,
    depth: u8,
    key_size: u8,
    diagnostics: &dyn Diagnostics,
) -> PffResult<Vec<Hnid>> {
    let entry_size = match key_size {
        2 | 4 | 8 | 16 => key_size as usize + 4,
        _ => {
            return Err(PffError::unsupported_value(format!(
                "unsupported BTH key_size {key_size}"
            )))
        }
    };

    let mut out = Vec::new();
    collect_inner(heap, root_ref, depth, key_size, entry_size, 0, &mut out, diagnostics)?;
    Ok(out)
}

fn collect_inner(
    heap: &HeapReader,
    root_ref: Hnid,
    depth: u8,
    key_size: u8,
    entry_size: usize,
    recursion: u8,
    out: &mut Vec<Hnid>,
    diagnostics: &dyn Diagnostics,
) -> PffResult<()> {
    if recursion > MAX_DEPTH {
        return Err(PffError::invalid_format(
            "BTH recursion exceeded sanity limit; tree is likely cyclic or corrupt",
        ));
    }

    if depth == 0 {
        out.push(root_ref);
        return Ok(());
    }

    let page = heap.clone_by_ref(root_ref)?;
    if page.len() % entry_size != 0 {
        return Err(PffError::invalid_format(
            "BTH page size is not a multiple of (key_size + value_size)",
        ));
    }

    for chunk in page.chunks(entry_size) {
        let key = &chunk[..key_size as usize];
        crate::diag!(diagnostics, "bth entry key: {:02x?}", key);

        let value_bytes = &chunk[key_size as usize..];
        let child = u32::from_le_bytes(value_bytes[..4].try_into().unwrap());

        collect_inner(
            heap,
            Hnid(child),
            depth - 1,
            key_size,
            entry_size,
            recursion + 1,
            out,
            diagnostics,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::VecBlockSource;
    use crate::error::NullDiagnostics;
    use crate::hnid::FileType;
    use crate::table_index::TableIndex;

    #[test]
    fn parses_0xb5_header() {
        let data = [0xb5, 0x10, 0x02, 0x00, 0x40, 0x00, 0x00, 0x00];
        let h = BthHeader::parse(&data).unwrap();
        assert_eq!(h.key_size, 0x10);
        assert_eq!(h.value_size, 0x02);
        assert_eq!(h.depth, 0);
        assert_eq!(h.root_ref.raw(), 0x40);
    }

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
    fn depth_zero_returns_root_itself() {
        let source = VecBlockSource::new(vec![block_bytes(&[0u8; 4], &[0, 4])]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);

        let root = Hnid(0x20);
        let leaves = collect_leaf_hnids(&heap, root, 0, 4, &NullDiagnostics).unwrap();
        assert_eq!(leaves, vec![root]);
    }

    #[test]
    fn depth_one_flattens_page_of_children() {
        // one heap slot holding two (key=4 bytes, value=u32) entries -> children 0x40, 0x60
        let mut page = Vec::new();
        page.extend_from_slice(&0u32.to_le_bytes()); // key0
        page.extend_from_slice(&0x40u32.to_le_bytes());
        page.extend_from_slice(&1u32.to_le_bytes()); // key1
        page.extend_from_slice(&0x60u32.to_le_bytes());

        let len = page.len() as u16;
        let source = VecBlockSource::new(vec![block_bytes(&page, &[0, len])]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);

        let root = Hnid(0x20); // block 0, slot 0
        let leaves = collect_leaf_hnids(&heap, root, 1, 4, &NullDiagnostics).unwrap();
        assert_eq!(leaves, vec![Hnid(0x40), Hnid(0x60)]);
    }
}
