//! Collaborator traits (spec §1 "External collaborators").
//!
//! None of these are implemented by this crate beyond minimal test fixtures: a real
//! PST/OST reader supplies them. The table subsystem only ever calls through these
//! interfaces, never reimplements page/B-tree/offset-index logic, full codepage
//! tables, or block decryption/decompression.

use crate::block::PhysicalBlock;
use crate::error::PffResult;

/// A descriptor's data: the lazy concatenation of physical blocks described in
/// spec §3 "Descriptor data stream", already decrypted and decompressed by the
/// collaborator. The table core never materializes the whole stream; it reads
/// individual blocks (for scanning allocation maps) or byte ranges (for external
/// value arrays and sub-node value bytes).
pub trait DescriptorDataSource {
    /// Number of physical blocks backing this descriptor.
    fn block_count(&self) -> usize;

    /// The `index`-th physical block, already decoded.
    fn block(&self, index: usize) -> PffResult<PhysicalBlock>;

    /// Total logical size, per spec `uncompressed_data_size`.
    fn uncompressed_data_size(&self) -> u64;

    /// Reads up to `buf.len()` bytes starting at logical `offset`, returning the
    /// number of bytes actually read (short reads are not an error).
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> PffResult<usize>;
}

/// Resolves a 32-bit local-descriptor identifier (the sub-node reference carried by
/// an [`crate::hnid::Hnid`] whose low 5 bits are non-zero) to the pair of 64-bit
/// identifiers needed to open that sub-node's own descriptor data stream and,
/// recursively, its own local-descriptors tree.
pub trait LocalDescriptorResolver {
    /// Returns `(data_identifier, local_descriptors_identifier)`.
    fn get(&self, local_descriptor_identifier: u32) -> Option<(u64, u64)>;
}

/// Opens descriptor data streams and local-descriptor trees by identifier. This
/// bundles the "file-IO handle" and "offsets index" collaborators from spec §1: this
/// crate only ever asks for streams/trees by id, never touches raw file offsets.
pub trait DescriptorProvider {
    fn open_data(&self, data_identifier: u64) -> PffResult<Box<dyn DescriptorDataSource>>;

    fn open_local_descriptors(
        &self,
        local_descriptors_identifier: u64,
    ) -> PffResult<Box<dyn LocalDescriptorResolver>>;
}

/// A named property's canonical identifier, the result of a name-to-id map lookup
/// for an entry type in `[0x8000, 0xFFFE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameToIdEntry {
    pub name_identifier: u32,
    pub is_string_named: bool,
    pub guid: uuid::Uuid,
}

/// Resolves named MAPI properties (spec §4.6, §GLOSSARY "Named property").
pub trait NameToIdMap {
    fn resolve(&self, entry_type: u16) -> Option<NameToIdEntry>;
}

/// Codepage/UTF-7 stream to UTF-8/UTF-16 conversion (spec §1, §4.10). UTF-8 and
/// UTF-16LE decoding is handled directly by this crate (stdlib suffices); this trait
/// covers the remaining "other codepage" and UTF-7 cases, which require a real
/// codepage table this crate deliberately does not bundle (spec §1: ASCII-codepage
/// helpers are out of scope).
pub trait UnicodeConverter {
    fn decode_codepage(&self, codepage: u32, bytes: &[u8]) -> PffResult<String>;
    fn decode_utf7(&self, bytes: &[u8]) -> PffResult<String>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// An in-memory [`DescriptorDataSource`] over a single pre-split list of blocks.
    pub struct VecBlockSource {
        pub blocks: Vec<Vec<u8>>,
    }

    impl VecBlockSource {
        pub fn new(blocks: Vec<Vec<u8>>) -> Self {
            VecBlockSource { blocks }
        }
    }

    impl DescriptorDataSource for VecBlockSource {
        fn block_count(&self) -> usize {
            self.blocks.len()
        }

        fn block(&self, index: usize) -> PffResult<PhysicalBlock> {
            self.blocks
                .get(index)
                .cloned()
                .map(PhysicalBlock::new)
                .ok_or_else(|| crate::error::PffError::out_of_bounds("block index out of range"))
        }

        fn uncompressed_data_size(&self) -> u64 {
            self.blocks.iter().map(|b| b.len() as u64).sum()
        }

        fn read_at(&self, offset: u64, buf: &mut [u8]) -> PffResult<usize> {
            let mut pos = offset;
            let mut written = 0;
            for block in &self.blocks {
                let len = block.len() as u64;
                if pos >= len {
                    pos -= len;
                    continue;
                }
                let start = pos as usize;
                let avail = &block[start..];
                let n = avail.len().min(buf.len() - written);
                buf[written..written + n].copy_from_slice(&avail[..n]);
                written += n;
                pos = 0;
                if written == buf.len() {
                    break;
                }
            }
            Ok(written)
        }
    }

    /// An in-memory [`LocalDescriptorResolver`].
    #[derive(Default)]
    pub struct MapLocalDescriptorResolver {
        pub entries: HashMap<u32, (u64, u64)>,
    }

    impl LocalDescriptorResolver for MapLocalDescriptorResolver {
        fn get(&self, local_descriptor_identifier: u32) -> Option<(u64, u64)> {
            self.entries.get(&local_descriptor_identifier).copied()
        }
    }

    /// An in-memory [`DescriptorProvider`] wiring together a map of data sources and
    /// local-descriptor resolvers, with a hit counter for tests that want to assert
    /// caching behavior of the caller.
    #[derive(Default)]
    pub struct MapDescriptorProvider {
        pub data: RefCell<HashMap<u64, Vec<Vec<u8>>>>,
        pub local_descriptors: RefCell<HashMap<u64, HashMap<u32, (u64, u64)>>>,
    }

    impl DescriptorProvider for MapDescriptorProvider {
        fn open_data(&self, data_identifier: u64) -> PffResult<Box<dyn DescriptorDataSource>> {
            self.data
                .borrow()
                .get(&data_identifier)
                .cloned()
                .map(|blocks| Box::new(VecBlockSource::new(blocks)) as Box<dyn DescriptorDataSource>)
                .ok_or_else(|| crate::error::PffError::missing_data("no such data identifier"))
        }

        fn open_local_descriptors(
            &self,
            local_descriptors_identifier: u64,
        ) -> PffResult<Box<dyn LocalDescriptorResolver>> {
            self.local_descriptors
                .borrow()
                .get(&local_descriptors_identifier)
                .cloned()
                .map(|entries| {
                    Box::new(MapLocalDescriptorResolver { entries })
                        as Box<dyn LocalDescriptorResolver>
                })
                .ok_or_else(|| {
                    crate::error::PffError::missing_data("no such local-descriptors identifier")
                })
        }
    }

    /// A [`UnicodeConverter`] that treats every codepage as Latin-1/ASCII and UTF-7
    /// as raw ASCII; sufficient for tests that don't exercise real codepage tables.
    #[derive(Default)]
    pub struct AsciiConverter;

    impl UnicodeConverter for AsciiConverter {
        fn decode_codepage(&self, _codepage: u32, bytes: &[u8]) -> PffResult<String> {
            Ok(bytes.iter().map(|&b| b as char).collect())
        }

        fn decode_utf7(&self, bytes: &[u8]) -> PffResult<String> {
            std::str::from_utf8(bytes)
                .map(|s| s.to_string())
                .map_err(|e| crate::error::PffError::conversion_failed(e.to_string()))
        }
    }
}
