//! Column definitions for Table Context flavors `0x7c` (inline) and `0xac`
//! (external), spec §4.6, component G.

use crate::collab::{NameToIdEntry, NameToIdMap};
use crate::error::{PffError, PffResult};
use std::collections::HashSet;

/// Named properties occupy this entry-type range (spec §GLOSSARY).
const NAMED_PROPERTY_RANGE: std::ops::RangeInclusive<u16> = 0x8000..=0xfffe;

/// One column's definition, in the unified in-memory shape described by spec §3
/// ("in-memory the two are identical").
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub entry_type: u16,
    pub value_type: u16,
    pub values_array_offset: u16,
    pub values_array_size: u16,
    pub values_array_number: u16,
    pub name_to_id_entry: Option<NameToIdEntry>,
    /// Present only for `0xac` columns whose `record_entry_values_table_descriptor`
    /// is non-zero: the local-descriptor identifier of the nested `0xa5` side table.
    pub side_table_descriptor: Option<u32>,
}

impl ColumnDefinition {
    pub(crate) fn resolve_name(entry_type: u16, name_to_id_map: Option<&dyn NameToIdMap>) -> Option<NameToIdEntry> {
        if !NAMED_PROPERTY_RANGE.contains(&entry_type) {
            return None;
        }
        name_to_id_map.and_then(|map| map.resolve(entry_type))
    }
}

/// Parses `0x7c` inline column definitions: `n_columns` fixed 8-byte records, all
/// sharing one `values_array_entry_size` the caller already knows from the header.
pub fn parse_inline_columns(
    data: &[u8],
    n_columns: u8,
    name_to_id_map: Option<&dyn NameToIdMap>,
) -> PffResult<Vec<ColumnDefinition>> {
    const ENTRY_SIZE: usize = 8;
    let n = n_columns as usize;
    if data.len() < n * ENTRY_SIZE {
        return Err(PffError::invalid_format(
            "0x7c column definitions data shorter than n_columns * 8",
        ));
    }

    let mut columns: Vec<Option<ColumnDefinition>> = (0..n).map(|_| None).collect();
    let mut seen_slots = HashSet::new();

    for i in 0..n {
        let e = &data[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE];
        let value_type = u16::from_le_bytes([e[0], e[1]]);
        let entry_type = u16::from_le_bytes([e[2], e[3]]);
        let values_array_offset = u16::from_le_bytes([e[4], e[5]]);
        let values_array_size = e[6] as u16;
        let values_array_number = e[7] as u16;

        if !seen_slots.insert(values_array_number) {
            return Err(PffError::invalid_format(format!(
                "duplicate values_array_number {values_array_number} in 0x7c columns"
            )));
        }

        let name_to_id_entry = ColumnDefinition::resolve_name(entry_type, name_to_id_map);

        let column = ColumnDefinition {
            entry_type,
            value_type,
            values_array_offset,
            values_array_size,
            values_array_number,
            name_to_id_entry,
            side_table_descriptor: None,
        };

        let slot = values_array_number as usize;
        if slot >= n {
            return Err(PffError::out_of_bounds(
                "0x7c column values_array_number out of range",
            ));
        }
        columns[slot] = Some(column);
    }

    columns
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.ok_or_else(|| PffError::invalid_format(format!("0x7c column slot {i} unfilled"))))
        .collect()
}

/// Parses `0xac` external column definitions: `n_columns` fixed 16-byte records.
pub fn parse_external_columns(
    data: &[u8],
    n_columns: u16,
    name_to_id_map: Option<&dyn NameToIdMap>,
) -> PffResult<Vec<ColumnDefinition>> {
    const ENTRY_SIZE: usize = 16;
    let n = n_columns as usize;
    if data.len() < n * ENTRY_SIZE {
        return Err(PffError::invalid_format(
            "0xac column definitions data shorter than n_columns * 16",
        ));
    }

    let mut columns: Vec<Option<ColumnDefinition>> = (0..n).map(|_| None).collect();
    let mut seen_slots = HashSet::new();

    for i in 0..n {
        let e = &data[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE];
        let value_type = u16::from_le_bytes([e[0], e[1]]);
        let entry_type = u16::from_le_bytes([e[2], e[3]]);
        let values_array_offset = u16::from_le_bytes([e[4], e[5]]);
        let values_array_size = u16::from_le_bytes([e[6], e[7]]);
        let values_array_number = u16::from_le_bytes([e[8], e[9]]);
        // e[10..12] is padding.
        let side_table_descriptor = u32::from_le_bytes([e[12], e[13], e[14], e[15]]);

        if !seen_slots.insert(values_array_number) {
            return Err(PffError::invalid_format(format!(
                "duplicate values_array_number {values_array_number} in 0xac columns"
            )));
        }

        let name_to_id_entry = ColumnDefinition::resolve_name(entry_type, name_to_id_map);

        let column = ColumnDefinition {
            entry_type,
            value_type,
            values_array_offset,
            values_array_size,
            values_array_number,
            name_to_id_entry,
            side_table_descriptor: if side_table_descriptor != 0 {
                Some(side_table_descriptor)
            } else {
                None
            },
        };

        let slot = values_array_number as usize;
        if slot >= n {
            return Err(PffError::out_of_bounds(
                "0xac column values_array_number out of range",
            ));
        }
        columns[slot] = Some(column);
    }

    columns
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.ok_or_else(|| PffError::invalid_format(format!("0xac column slot {i} unfilled"))))
        .collect()
}
