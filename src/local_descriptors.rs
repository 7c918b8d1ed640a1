//! Local-descriptors tree: on-disk node format (spec §6) plus a
//! [`crate::collab::LocalDescriptorResolver`] built by walking it.
//!
//! This is provided because spec §6 lists the local-descriptor node's byte layout
//! among the "on-disk byte layouts the core must interpret exactly"; the abstract
//! resolver in [`crate::collab`] remains the interface the table core actually
//! depends on, but a real collaborator can be built from raw node bytes using this
//! module instead of reimplementing the format.

use crate::collab::{DescriptorProvider, LocalDescriptorResolver};
use crate::error::{PffError, PffResult};
use crate::hnid::FileType;
use nom::number::complete as number;

const SIGNATURE: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeLevel {
    Leaf,
    Branch(u8),
}

#[derive(Debug, Clone, Copy)]
struct LeafEntry {
    identifier: u64,
    data_identifier: u64,
    local_descriptors_identifier: u64,
}

#[derive(Debug, Clone, Copy)]
struct BranchEntry {
    identifier: u64,
    sub_node_identifier: u64,
}

enum NodeEntries {
    Leaf(Vec<LeafEntry>),
    Branch(Vec<BranchEntry>),
}

struct LocalDescriptorNode {
    entries: NodeEntries,
}

impl LocalDescriptorNode {
    fn parse(data: &[u8], file_type: FileType) -> PffResult<Self> {
        if data.len() < 4 {
            return Err(PffError::invalid_format(
                "local-descriptor node shorter than the fixed prefix",
            ));
        }
        if data[0] != SIGNATURE {
            return Err(PffError::invalid_format(
                "local-descriptor node signature mismatch, expected 0x02",
            ));
        }
        let level_byte = data[1];
        let (rest, number_of_entries) =
            number::le_u16::<_, nom::error::Error<&[u8]>>(&data[2..])
                .map_err(|e| PffError::invalid_format(format!("{e}")))?;

        let is_64bit = !matches!(file_type, FileType::Ansi32);
        let rest = if is_64bit {
            if rest.len() < 4 {
                return Err(PffError::invalid_format(
                    "local-descriptor node missing 64-bit padding",
                ));
            }
            &rest[4..]
        } else {
            rest
        };

        if number_of_entries == 0 {
            // spec §4.12: fatal (TODO: tolerate)
            return Err(PffError::invalid_format(
                "local-descriptor node has zero entries",
            ));
        }

        let level = if level_byte == 0 {
            NodeLevel::Leaf
        } else {
            NodeLevel::Branch(level_byte)
        };

        let entries = match level {
            NodeLevel::Leaf => {
                let entry_size = if is_64bit { 24 } else { 12 };
                NodeEntries::Leaf(Self::parse_leaf_entries(
                    rest,
                    number_of_entries as usize,
                    entry_size,
                    is_64bit,
                )?)
            }
            NodeLevel::Branch(_) => {
                let entry_size = if is_64bit { 16 } else { 8 };
                NodeEntries::Branch(Self::parse_branch_entries(
                    rest,
                    number_of_entries as usize,
                    entry_size,
                    is_64bit,
                )?)
            }
        };

        Ok(LocalDescriptorNode { entries })
    }

    fn parse_leaf_entries(
        data: &[u8],
        count: usize,
        entry_size: usize,
        is_64bit: bool,
    ) -> PffResult<Vec<LeafEntry>> {
        if data.len() < count * entry_size {
            return Err(PffError::invalid_format(
                "local-descriptor leaf node truncated",
            ));
        }
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let e = &data[i * entry_size..(i + 1) * entry_size];
            let (identifier, data_identifier, local_descriptors_identifier) = if is_64bit {
                (
                    u64::from_le_bytes(e[0..8].try_into().unwrap()),
                    u64::from_le_bytes(e[8..16].try_into().unwrap()),
                    u64::from_le_bytes(e[16..24].try_into().unwrap()),
                )
            } else {
                (
                    u32::from_le_bytes(e[0..4].try_into().unwrap()) as u64,
                    u32::from_le_bytes(e[4..8].try_into().unwrap()) as u64,
                    u32::from_le_bytes(e[8..12].try_into().unwrap()) as u64,
                )
            };
            out.push(LeafEntry {
                identifier,
                data_identifier,
                local_descriptors_identifier,
            });
        }
        Ok(out)
    }

    fn parse_branch_entries(
        data: &[u8],
        count: usize,
        entry_size: usize,
        is_64bit: bool,
    ) -> PffResult<Vec<BranchEntry>> {
        if data.len() < count * entry_size {
            return Err(PffError::invalid_format(
                "local-descriptor branch node truncated",
            ));
        }
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let e = &data[i * entry_size..(i + 1) * entry_size];
            let (identifier, sub_node_identifier) = if is_64bit {
                (
                    u64::from_le_bytes(e[0..8].try_into().unwrap()),
                    u64::from_le_bytes(e[8..16].try_into().unwrap()),
                )
            } else {
                (
                    u32::from_le_bytes(e[0..4].try_into().unwrap()) as u64,
                    u32::from_le_bytes(e[4..8].try_into().unwrap()) as u64,
                )
            };
            out.push(BranchEntry {
                identifier,
                sub_node_identifier,
            });
        }
        Ok(out)
    }
}

/// Walks a local-descriptors tree rooted at `root_data_identifier`, resolving
/// identifiers to `(data_identifier, local_descriptors_identifier)` pairs via
/// in-order binary search (entries are stored in ascending identifier order on
/// disk) and fetching child nodes through a [`DescriptorProvider`].
pub struct NodeLocalDescriptorResolver<'a> {
    provider: &'a dyn DescriptorProvider,
    root_data_identifier: u64,
    file_type: FileType,
}

impl<'a> NodeLocalDescriptorResolver<'a> {
    pub fn new(
        provider: &'a dyn DescriptorProvider,
        root_data_identifier: u64,
        file_type: FileType,
    ) -> Self {
        NodeLocalDescriptorResolver {
            provider,
            root_data_identifier,
            file_type,
        }
    }

    fn read_node_bytes(&self, data_identifier: u64) -> PffResult<Vec<u8>> {
        let source = self.provider.open_data(data_identifier)?;
        let size = source.uncompressed_data_size();
        let mut buf = vec![0u8; size as usize];
        source.read_at(0, &mut buf)?;
        Ok(buf)
    }

    fn lookup(&self, data_identifier: u64, target: u32) -> PffResult<Option<(u64, u64)>> {
        let bytes = self.read_node_bytes(data_identifier)?;
        let node = LocalDescriptorNode::parse(&bytes, self.file_type)?;

        match node.entries {
            NodeEntries::Leaf(entries) => Ok(entries
                .iter()
                .find(|e| e.identifier == target as u64)
                .map(|e| (e.data_identifier, e.local_descriptors_identifier))),
            NodeEntries::Branch(entries) => {
                // Descend into the first branch whose identifier is >= target, matching
                // the B-tree convention used throughout the format (entries are upper
                // bounds for their subtree).
                let child = entries
                    .iter()
                    .find(|e| target as u64 <= e.identifier)
                    .or_else(|| entries.last());

                match child {
                    Some(e) => self.lookup(e.sub_node_identifier, target),
                    None => Ok(None),
                }
            }
        }
    }
}

impl<'a> LocalDescriptorResolver for NodeLocalDescriptorResolver<'a> {
    fn get(&self, local_descriptor_identifier: u32) -> Option<(u64, u64)> {
        self.lookup(self.root_data_identifier, local_descriptor_identifier)
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::MapDescriptorProvider;

    fn leaf_node_32(entries: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut data = vec![SIGNATURE, 0];
        data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (id, data_id, local_id) in entries {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&data_id.to_le_bytes());
            data.extend_from_slice(&local_id.to_le_bytes());
        }
        data
    }

    #[test]
    fn resolves_leaf_entry_32bit() {
        let provider = MapDescriptorProvider::default();
        provider
            .data
            .borrow_mut()
            .insert(1, vec![leaf_node_32(&[(10, 100, 0), (20, 200, 0)])]);

        let resolver = NodeLocalDescriptorResolver::new(&provider, 1, FileType::Ansi32);
        assert_eq!(resolver.get(20), Some((200, 0)));
        assert_eq!(resolver.get(99), None);
    }

    #[test]
    fn rejects_bad_signature() {
        let bytes = vec![0xff, 0, 0, 0];
        assert!(LocalDescriptorNode::parse(&bytes, FileType::Ansi32).is_err());
    }

    #[test]
    fn rejects_zero_entries() {
        let bytes = vec![SIGNATURE, 0, 0, 0];
        assert!(LocalDescriptorNode::parse(&bytes, FileType::Ansi32).is_err());
    }
}
