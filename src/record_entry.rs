//! Record entries and their materialization from a table cell (spec §3 "Record
//! entry", §4.8, component I).

use crate::collab::{DescriptorProvider, LocalDescriptorResolver, NameToIdEntry};
use crate::column::ColumnDefinition;
use crate::error::{Diagnostics, PffError, PffResult};
use crate::heap::HeapReader;
use crate::hnid::{FileType, Hnid};
use crate::pass_through::PassThroughTable;
use crate::value_type::{self, *};
use getset::{CopyGetters, Getters};

/// Tagged identifier for a record entry (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEntryId {
    MapiProperty { entry_type: u32, value_type: u32 },
    Guid(uuid::Uuid),
    Secure4(u64),
}

/// Per-entry tolerance flags (spec §4.12).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordEntryFlags {
    pub missing_data_descriptor: bool,
}

/// A single materialized property value (spec §3 "Record entry"). Owns its value
/// bytes; cloning deep-copies them, matching the spec's lifecycle rule.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct RecordEntry {
    #[get_copy = "pub"]
    identifier: RecordEntryId,
    #[get = "pub"]
    value_data: Vec<u8>,
    #[get_copy = "pub"]
    name_to_id_entry: Option<NameToIdEntry>,
    #[get_copy = "pub"]
    flags: RecordEntryFlags,
    #[get_copy = "pub"]
    ascii_codepage: u32,
}

impl RecordEntry {
    /// A byte cursor over the stored value bytes (spec §4.11 "streamed value
    /// reads"); `std::io::Cursor` already implements the clamped-read,
    /// short-read-past-end semantics the spec calls for.
    pub fn reader(&self) -> std::io::Cursor<&[u8]> {
        std::io::Cursor::new(&self.value_data)
    }

    pub fn value_type(&self) -> u16 {
        match self.identifier {
            RecordEntryId::MapiProperty { value_type, .. } => value_type as u16,
            _ => 0,
        }
    }
}

/// Bundles the collaborators needed to resolve a raw table cell into a
/// [`RecordEntry`] (spec §4.8).
pub struct CellResolver<'a> {
    pub heap: &'a HeapReader<'a>,
    pub local_descriptors: Option<&'a dyn LocalDescriptorResolver>,
    pub descriptor_provider: Option<&'a dyn DescriptorProvider>,
    pub file_type: FileType,
    pub ascii_codepage: u32,
    pub diagnostics: &'a dyn Diagnostics,
}

fn read_le_uint(bytes: &[u8]) -> PffResult<u64> {
    match bytes.len() {
        1 => Ok(bytes[0] as u64),
        2 => Ok(u16::from_le_bytes(bytes.try_into().unwrap()) as u64),
        4 => Ok(u32::from_le_bytes(bytes.try_into().unwrap()) as u64),
        8 => Ok(u64::from_le_bytes(bytes.try_into().unwrap())),
        other => Err(PffError::invalid_format(format!(
            "cell value has unsupported width {other}"
        ))),
    }
}

impl<'a> CellResolver<'a> {
    /// Opens the sub-node addressed by `hnid` (low 5 bits non-zero) and reads its
    /// full value bytes, returning `Ok(None)` for the tolerated "missing data"
    /// case (spec §4.8 step 5, §4.12).
    fn read_sub_node_value(&self, hnid: Hnid) -> PffResult<Option<Vec<u8>>> {
        let local_descriptors = match self.local_descriptors {
            Some(ld) => ld,
            None => return Ok(None),
        };
        let provider = match self.descriptor_provider {
            Some(p) => p,
            None => return Ok(None),
        };

        let Some((data_identifier, _local_descriptors_identifier)) =
            local_descriptors.get(hnid.raw())
        else {
            crate::diag!(self.diagnostics, "sub-node {:#x} not found", hnid.raw());
            return Ok(None);
        };

        let stream = match provider.open_data(data_identifier) {
            Ok(s) => s,
            Err(_) => return Ok(None),
        };

        let size = stream.uncompressed_data_size();
        let mut buf = vec![0u8; size as usize];
        match stream.read_at(0, &mut buf) {
            Ok(_) => Ok(Some(buf)),
            Err(_) => Ok(None),
        }
    }

    fn resolve_side_table_entry(
        &self,
        side_table: &PassThroughTable,
        entry_value: u32,
    ) -> PffResult<(Option<Vec<u8>>, bool)> {
        let hnid = Hnid(entry_value);
        if hnid.is_sub_node_reference() {
            let value = self.read_sub_node_value(hnid)?;
            let missing = value.is_none();
            return Ok((value, missing));
        }

        match hnid.split(self.file_type) {
            Some((set_index, entry_index)) => match side_table.get(set_index, entry_index) {
                Some(bytes) => Ok((Some(bytes.to_vec()), false)),
                None => Ok((None, true)),
            },
            None => Ok((None, true)),
        }
    }

    /// Materializes one cell (spec §4.8 steps 1-6).
    pub fn resolve_cell(
        &self,
        column: &ColumnDefinition,
        raw_cell_bytes: &[u8],
        side_table: Option<&PassThroughTable>,
        name_to_id_entry: Option<NameToIdEntry>,
    ) -> PffResult<RecordEntry> {
        let identifier = RecordEntryId::MapiProperty {
            entry_type: column.entry_type as u32,
            value_type: column.value_type as u32,
        };

        let mut flags = RecordEntryFlags::default();

        // Step 4: fixed-width types that are always stored inline.
        let value_type = column.value_type;
        let inline_fixed = matches!(value_type, BOOLEAN | INTEGER_16 | INTEGER_32 | FLOATING_32 | ERROR)
            || (raw_cell_bytes.len() == 8
                && matches!(
                    value_type,
                    INTEGER_64 | FLOATING_64 | CURRENCY | FLOATINGTIME | FILETIME
                ));

        if inline_fixed {
            if let Some(expected) = value_type::fixed_width(value_type) {
                if raw_cell_bytes.len() != expected && expected != 8 {
                    return Err(PffError::invalid_format(format!(
                        "value_type {value_type:#06x} expects {expected} inline bytes, got {}",
                        raw_cell_bytes.len()
                    )));
                }
            }
            return Ok(RecordEntry {
                identifier,
                value_data: raw_cell_bytes.to_vec(),
                name_to_id_entry,
                flags,
                ascii_codepage: self.ascii_codepage,
            });
        }

        // Steps 3 & 5: indirect storage via entry_value.
        let entry_value = read_le_uint(raw_cell_bytes)?;

        let value_data = if let (Some(side_table), Some(descriptor)) =
            (side_table, column.side_table_descriptor)
        {
            let _ = descriptor;
            let (value, missing) = self.resolve_side_table_entry(side_table, entry_value as u32)?;
            flags.missing_data_descriptor = missing;
            value.unwrap_or_default()
        } else if entry_value == 0 {
            Vec::new()
        } else {
            let hnid = Hnid(entry_value as u32);
            if hnid.is_sub_node_reference() {
                match self.read_sub_node_value(hnid)? {
                    Some(bytes) => bytes,
                    None => {
                        flags.missing_data_descriptor = true;
                        Vec::new()
                    }
                }
            } else {
                self.heap.clone_by_ref(hnid)?
            }
        };

        Ok(RecordEntry {
            identifier,
            value_data,
            name_to_id_entry,
            flags,
            ascii_codepage: self.ascii_codepage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::VecBlockSource;
    use crate::error::NullDiagnostics;
    use crate::table_index::TableIndex;

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

    fn sample_column(value_type: u16) -> ColumnDefinition {
        ColumnDefinition {
            entry_type: 0x3001,
            value_type,
            values_array_offset: 0,
            values_array_size: 0,
            values_array_number: 0,
            name_to_id_entry: None,
            side_table_descriptor: None,
        }
    }

    #[test]
    fn inline_int32_is_stored_verbatim() {
        let source = VecBlockSource::new(vec![block_bytes(&[0u8; 4], &[0, 4])]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);
        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: None,
            descriptor_provider: None,
            file_type: FileType::Ansi32,
            ascii_codepage: 1252,
            diagnostics: &NullDiagnostics,
        };

        let column = sample_column(INTEGER_32);
        let entry = resolver
            .resolve_cell(&column, &42i32.to_le_bytes(), None, None)
            .unwrap();
        assert_eq!(entry.value_data(), &42i32.to_le_bytes());
        assert!(!entry.flags().missing_data_descriptor);
    }

    #[test]
    fn zero_entry_value_is_null() {
        let source = VecBlockSource::new(vec![block_bytes(&[0u8; 4], &[0, 4])]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);
        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: None,
            descriptor_provider: None,
            file_type: FileType::Ansi32,
            ascii_codepage: 1252,
            diagnostics: &NullDiagnostics,
        };

        let column = sample_column(STRING_UNICODE);
        let entry = resolver.resolve_cell(&column, &0u32.to_le_bytes(), None, None).unwrap();
        assert!(entry.value_data().is_empty());
        assert!(!entry.flags().missing_data_descriptor);
    }

    #[test]
    fn heap_referenced_string_resolves() {
        let b0 = block_bytes(b"ABhi", &[0, 2, 4]);
        let source = VecBlockSource::new(vec![b0]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);
        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: None,
            descriptor_provider: None,
            file_type: FileType::Ansi32,
            ascii_codepage: 1252,
            diagnostics: &NullDiagnostics,
        };

        // block_index=0, slot_number=2 (0-based slot 1)
        let hnid = Hnid(2u32 << 5);
        let column = sample_column(STRING_ASCII);
        let entry = resolver
            .resolve_cell(&column, &hnid.raw().to_le_bytes(), None, None)
            .unwrap();
        assert_eq!(entry.value_data(), b"hi");
    }

    #[test]
    fn missing_sub_node_flags_entry_not_fatal() {
        let source = VecBlockSource::new(vec![block_bytes(&[0u8; 4], &[0, 4])]);
        let index = TableIndex::build(&source).unwrap();
        let heap = HeapReader::new(&source, &index, FileType::Ansi32);
        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: Some(&crate::collab::test_support::MapLocalDescriptorResolver::default()),
            descriptor_provider: None,
            file_type: FileType::Ansi32,
            ascii_codepage: 1252,
            diagnostics: &NullDiagnostics,
        };

        let column = sample_column(BINARY);
        let entry = resolver.resolve_cell(&column, &1u32.to_le_bytes(), None, None).unwrap();
        assert!(entry.flags().missing_data_descriptor);
        assert!(entry.value_data().is_empty());
    }
}
