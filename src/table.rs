//! The top-level [`Table`] type: dispatches on [`TableType`] and assembles the
//! other components into [`RecordSet`]s (spec §3 "Table" lifecycle, §4, §5).

use crate::bth::{collect_leaf_hnids, BthHeader};
use crate::collab::{
    DescriptorDataSource, DescriptorProvider, LocalDescriptorResolver, NameToIdMap,
};
use crate::column::{parse_external_columns, parse_inline_columns, ColumnDefinition};
use crate::error::{Diagnostics, NullDiagnostics, PffError, PffResult};
use crate::heap::HeapReader;
use crate::hnid::{FileType, Hnid};
use crate::pass_through::PassThroughTable;
use crate::record_entry::{CellResolver, RecordEntry};
use crate::table_header::{TableHeader, TableType};
use crate::value_array::ValuesArray;
use crate::value_type;

/// Per-table and per-record tolerance bits (spec §4.12, §7): a `MissingData`
/// condition on a cell is recorded here instead of aborting the whole parse.
#[derive(Debug, Clone, Default)]
pub struct MissingDataFlags {
    pub table_level: bool,
    pub per_record: Vec<bool>,
}

/// One materialized row: its entries in column order.
#[derive(Debug, Clone)]
pub struct Record {
    pub entries: Vec<RecordEntry>,
}

/// The rows of a `0x7c`/`0xac`/`0xbc` table (spec §3 "Record set").
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<Record>,
}

/// A `0x6c` entry: maps a property-set GUID to a values-array slot.
#[derive(Debug, Clone, Copy)]
pub struct GuidToValueEntry {
    pub guid: uuid::Uuid,
    pub values_array_number: u16,
}

/// A `0x8c` entry: maps an identifier to a descriptor identifier.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorIndexEntry {
    pub identifier: u64,
    pub descriptor_identifier: u32,
}

/// A `0x9c` entry: maps a GUID to a descriptor identifier.
#[derive(Debug, Clone, Copy)]
pub struct GuidDescriptorIndexEntry {
    pub guid: uuid::Uuid,
    pub descriptor_identifier: u32,
}

fn resolve_hnid_bytes(
    hnid: Hnid,
    heap: &HeapReader,
    local_descriptors: Option<&dyn LocalDescriptorResolver>,
    descriptor_provider: Option<&dyn DescriptorProvider>,
) -> PffResult<Vec<u8>> {
    if hnid.is_heap_reference() {
        return heap.clone_by_ref(hnid);
    }

    let local_descriptors = local_descriptors.ok_or_else(|| {
        PffError::invalid_argument("sub-node reference requires a local-descriptors resolver")
    })?;
    let descriptor_provider = descriptor_provider
        .ok_or_else(|| PffError::invalid_argument("sub-node reference requires a descriptor provider"))?;

    let (data_identifier, _) = local_descriptors
        .get(hnid.raw())
        .ok_or_else(|| PffError::missing_data(format!("sub-node {:#x} not found", hnid.raw())))?;

    let stream = descriptor_provider.open_data(data_identifier)?;
    let size = stream.uncompressed_data_size();
    let mut buf = vec![0u8; size as usize];
    stream.read_at(0, &mut buf)?;
    Ok(buf)
}

/// Everything a [`Table`] needs from the surrounding file to resolve cross-node
/// references (spec §1 external collaborators).
pub struct TableContext<'a> {
    pub local_descriptors: Option<&'a dyn LocalDescriptorResolver>,
    pub descriptor_provider: Option<&'a dyn DescriptorProvider>,
    pub name_to_id_map: Option<&'a dyn NameToIdMap>,
    pub ascii_codepage: u32,
    pub diagnostics: &'a dyn Diagnostics,
}

impl<'a> Default for TableContext<'a> {
    fn default() -> Self {
        TableContext {
            local_descriptors: None,
            descriptor_provider: None,
            name_to_id_map: None,
            ascii_codepage: 1252,
            diagnostics: &NullDiagnostics,
        }
    }
}

/// A parsed table: signature block plus type-specific header and columns, ready
/// to yield rows (spec §3 "Table").
pub struct Table {
    pub table_type: TableType,
    file_type: FileType,
    columns: Vec<ColumnDefinition>,
    bth: Option<BthHeader>,
    side_table: Option<PassThroughTable>,
    flags: MissingDataFlags,
}

fn last_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl Table {
    /// Opens a table rooted at `source`'s block 0 (spec §3 lifecycle: "open,
    /// validate signature, dispatch").
    pub fn open(source: &dyn DescriptorDataSource, file_type: FileType, ctx: &TableContext) -> PffResult<Self> {
        let block0 = source.block(0)?;
        let header = TableHeader::parse(block0.data())?;

        let index = crate::table_index::TableIndex::build(source)?;
        let heap = HeapReader::new(source, &index, file_type);

        let mut flags = MissingDataFlags::default();

        let (columns, bth, side_table) = match header.table_type {
            TableType::TcInline => {
                let table_header_bytes = heap.clone_by_ref(header.table_value_ref)?;
                if table_header_bytes.len() < 22 {
                    return Err(PffError::invalid_format("0x7c header shorter than 22 bytes"));
                }
                let n_columns = table_header_bytes[1];
                let values_array_entry_size = last_u16(&table_header_bytes, 8);
                let b5_ref = Hnid(u32::from_le_bytes(
                    table_header_bytes[10..14].try_into().unwrap(),
                ));
                let values_array_ref = Hnid(u32::from_le_bytes(
                    table_header_bytes[14..18].try_into().unwrap(),
                ));

                let column_bytes = &table_header_bytes[22..];
                let columns = parse_inline_columns(column_bytes, n_columns, ctx.name_to_id_map)?;

                let bth_bytes = resolve_hnid_bytes(
                    b5_ref,
                    &heap,
                    ctx.local_descriptors,
                    ctx.descriptor_provider,
                )?;
                let bth = BthHeader::parse(&bth_bytes)?;

                let values_array = build_values_array(
                    values_array_ref,
                    values_array_entry_size as usize,
                    source,
                    &heap,
                    ctx,
                )?;

                (columns, Some((bth, values_array)), None)
            }
            TableType::TcExternal => {
                let table_header_bytes = heap.clone_by_ref(header.table_value_ref)?;
                if table_header_bytes.len() < 40 {
                    return Err(PffError::invalid_format("0xac header shorter than 40 bytes"));
                }
                let values_array_entry_size = last_u16(&table_header_bytes, 8);
                let b5_ref = Hnid(u32::from_le_bytes(
                    table_header_bytes[10..14].try_into().unwrap(),
                ));
                let values_array_ref = Hnid(u32::from_le_bytes(
                    table_header_bytes[14..18].try_into().unwrap(),
                ));
                let n_columns = last_u16(&table_header_bytes, 22);
                let column_definitions_ref = Hnid(u32::from_le_bytes(
                    table_header_bytes[24..28].try_into().unwrap(),
                ));

                let column_bytes = resolve_hnid_bytes(
                    column_definitions_ref,
                    &heap,
                    ctx.local_descriptors,
                    ctx.descriptor_provider,
                )?;
                let columns = parse_external_columns(&column_bytes, n_columns, ctx.name_to_id_map)?;

                let bth_bytes = resolve_hnid_bytes(
                    b5_ref,
                    &heap,
                    ctx.local_descriptors,
                    ctx.descriptor_provider,
                )?;
                let bth = BthHeader::parse(&bth_bytes)?;

                let values_array = build_values_array(
                    values_array_ref,
                    values_array_entry_size as usize,
                    source,
                    &heap,
                    ctx,
                )?;

                let side_table = build_side_table(&columns, source, ctx, &heap)?;

                (columns, Some((bth, values_array)), side_table)
            }
            TableType::PropertyContext => {
                let bth_bytes = resolve_hnid_bytes(
                    header.table_value_ref,
                    &heap,
                    ctx.local_descriptors,
                    ctx.descriptor_provider,
                )?;
                let bth = BthHeader::parse(&bth_bytes)?;
                (Vec::new(), Some((bth, None)), None)
            }
            TableType::PassThrough => {
                let pass_through = PassThroughTable::build(source)?;
                return Ok(Table {
                    table_type: header.table_type,
                    file_type,
                    columns: Vec::new(),
                    bth: None,
                    side_table: Some(pass_through),
                    flags,
                });
            }
            TableType::GuidToValue | TableType::DescriptorIndex | TableType::GuidDescriptorIndex => {
                let bth_bytes = resolve_hnid_bytes(
                    header.table_value_ref,
                    &heap,
                    ctx.local_descriptors,
                    ctx.descriptor_provider,
                )?;
                let bth = BthHeader::parse(&bth_bytes)?;
                (Vec::new(), Some((bth, None)), None)
            }
        };

        let (bth, values_array) = match bth {
            Some((b, va)) => (Some(b), va),
            None => (None, None),
        };

        if values_array.is_none() && !columns.is_empty() && header.table_type == TableType::PropertyContext {
            // handled via BTH leaf bytes directly, not a values array.
        }
        let _ = &values_array;

        flags.table_level = false;

        Ok(Table {
            table_type: header.table_type,
            file_type,
            columns,
            bth,
            side_table,
            flags,
        })
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn flags(&self) -> &MissingDataFlags {
        &self.flags
    }

    /// Materializes every row of a `0xbc` Property Context table (spec §4.8).
    pub fn property_context_records(
        &mut self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
    ) -> PffResult<RecordSet> {
        if self.table_type != TableType::PropertyContext {
            return Err(PffError::invalid_argument(
                "property_context_records called on a non-0xbc table",
            ));
        }
        let bth = self.bth.ok_or_else(|| PffError::invalid_format("0xbc table missing its BTH header"))?;

        let index = crate::table_index::TableIndex::build(source)?;
        let heap = HeapReader::new(source, &index, self.file_type);

        let leaves = collect_leaf_hnids(&heap, bth.root_ref, bth.depth, bth.key_size, ctx.diagnostics)?;

        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: ctx.local_descriptors,
            descriptor_provider: ctx.descriptor_provider,
            file_type: self.file_type,
            ascii_codepage: ctx.ascii_codepage,
            diagnostics: ctx.diagnostics,
        };

        let entry_size = bth.key_size as usize + 6;
        let mut records = Vec::new();
        let mut per_record_missing = Vec::new();

        for leaf in leaves {
            let page = resolve_hnid_bytes(leaf, &heap, ctx.local_descriptors, ctx.descriptor_provider)?;
            if page.len() % entry_size != 0 {
                return Err(PffError::invalid_format(
                    "0xbc leaf page size is not a multiple of the record-entry width",
                ));
            }

            let mut entries = Vec::new();
            let mut record_missing = false;
            for chunk in page.chunks(entry_size) {
                let entry_type = u16::from_le_bytes(chunk[0..2].try_into().unwrap());
                let value_type = u16::from_le_bytes(chunk[2..4].try_into().unwrap());
                let raw_value = &chunk[4..8];
                let raw = match value_type::fixed_width(value_type) {
                    Some(width) if width < raw_value.len() => &raw_value[..width],
                    _ => raw_value,
                };

                let column = ColumnDefinition {
                    entry_type,
                    value_type,
                    values_array_offset: 0,
                    values_array_size: 0,
                    values_array_number: 0,
                    name_to_id_entry: ColumnDefinition::resolve_name(entry_type, ctx.name_to_id_map),
                    side_table_descriptor: None,
                };

                let entry = resolver.resolve_cell(&column, raw, None, column.name_to_id_entry)?;
                record_missing |= entry.flags().missing_data_descriptor;
                entries.push(entry);
            }

            per_record_missing.push(record_missing);
            records.push(Record { entries });
        }

        self.flags.per_record = per_record_missing;
        Ok(RecordSet { records })
    }

    /// Materializes every row of a `0x7c`/`0xac` Table Context table (spec §4.7,
    /// §4.8).
    pub fn table_context_records(
        &mut self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
    ) -> PffResult<RecordSet> {
        if self.table_type != TableType::TcInline && self.table_type != TableType::TcExternal {
            return Err(PffError::invalid_argument(
                "table_context_records called on a non-TC table",
            ));
        }
        let bth = self
            .bth
            .ok_or_else(|| PffError::invalid_format("TC table missing its BTH header"))?;

        let index = crate::table_index::TableIndex::build(source)?;
        let heap = HeapReader::new(source, &index, self.file_type);

        let table_header_bytes = heap.clone_by_ref(
            // re-derive the header so we can reach values_array_ref for a second pass
            // without storing a borrowed ValuesArray on self (spec §5: tables do not
            // hold borrowed collaborator handles across calls).
            TableHeader::parse(source.block(0)?.data())?.table_value_ref,
        )?;

        // Both 0x7c and 0xac headers carry these two fields at the same offsets.
        let values_array_entry_size = last_u16(&table_header_bytes, 8) as usize;
        let values_array_ref = Hnid(u32::from_le_bytes(
            table_header_bytes[14..18].try_into().unwrap(),
        ));

        let values_array = build_values_array(
            values_array_ref,
            values_array_entry_size,
            source,
            &heap,
            ctx,
        )?;

        let leaves = collect_leaf_hnids(&heap, bth.root_ref, bth.depth, bth.key_size, ctx.diagnostics)?;

        let resolver = CellResolver {
            heap: &heap,
            local_descriptors: ctx.local_descriptors,
            descriptor_provider: ctx.descriptor_provider,
            file_type: self.file_type,
            ascii_codepage: ctx.ascii_codepage,
            diagnostics: ctx.diagnostics,
        };

        let row_entry_size = bth.key_size as usize + 4;
        let mut records = Vec::new();
        let mut per_record_missing = Vec::new();
        let mut table_missing = false;

        for leaf in leaves {
            let page = resolve_hnid_bytes(leaf, &heap, ctx.local_descriptors, ctx.descriptor_provider)?;
            if page.len() % row_entry_size != 0 {
                return Err(PffError::invalid_format(
                    "TC leaf page size is not a multiple of (key_size + 4)",
                ));
            }

            for chunk in page.chunks(row_entry_size) {
                let row_value = u32::from_le_bytes(chunk[bth.key_size as usize..].try_into().unwrap());
                let row_index = row_value as usize;

                let row_bytes = match &values_array {
                    Some(va) => va.row(row_index)?,
                    None => None,
                };

                let mut record_missing = false;
                let entries = match row_bytes {
                    Some(row_bytes) => {
                        let mut entries = Vec::with_capacity(self.columns.len());
                        for column in &self.columns {
                            let start = column.values_array_offset as usize;
                            let end = start + column.values_array_size as usize;
                            if end > row_bytes.len() {
                                record_missing = true;
                                continue;
                            }
                            let raw = &row_bytes[start..end];
                            let entry = resolver.resolve_cell(
                                column,
                                raw,
                                self.side_table.as_ref(),
                                column.name_to_id_entry,
                            )?;
                            record_missing |= entry.flags().missing_data_descriptor;
                            entries.push(entry);
                        }
                        entries
                    }
                    None => {
                        table_missing = true;
                        record_missing = true;
                        Vec::new()
                    }
                };

                per_record_missing.push(record_missing);
                records.push(Record { entries });
            }
        }

        self.flags.table_level = table_missing;
        self.flags.per_record = per_record_missing;
        Ok(RecordSet { records })
    }

    fn leaf_pages(
        &self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
        expected: TableType,
    ) -> PffResult<Vec<u8>> {
        if self.table_type != expected {
            return Err(PffError::invalid_argument(
                "record method called on a mismatched table type",
            ));
        }
        let bth = self
            .bth
            .ok_or_else(|| PffError::invalid_format("table missing its BTH header"))?;

        let index = crate::table_index::TableIndex::build(source)?;
        let heap = HeapReader::new(source, &index, self.file_type);
        let leaves = collect_leaf_hnids(&heap, bth.root_ref, bth.depth, bth.key_size, ctx.diagnostics)?;

        let mut bytes = Vec::new();
        for leaf in leaves {
            bytes.extend(resolve_hnid_bytes(
                leaf,
                &heap,
                ctx.local_descriptors,
                ctx.descriptor_provider,
            )?);
        }
        Ok(bytes)
    }

    /// Materializes every row of a `0x6c` GUID-to-value map (spec §4.5).
    pub fn guid_to_value_records(
        &self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
    ) -> PffResult<Vec<GuidToValueEntry>> {
        let bytes = self.leaf_pages(source, ctx, TableType::GuidToValue)?;
        const ENTRY_SIZE: usize = 18;
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(PffError::invalid_format(
                "0x6c leaf page size is not a multiple of 18",
            ));
        }
        Ok(bytes
            .chunks(ENTRY_SIZE)
            .map(|chunk| GuidToValueEntry {
                guid: uuid::Uuid::from_bytes_le(chunk[0..16].try_into().unwrap()),
                values_array_number: u16::from_le_bytes(chunk[16..18].try_into().unwrap()),
            })
            .collect())
    }

    /// Materializes every row of a `0x8c` descriptor-identifier index (spec §4.5).
    pub fn descriptor_index_records(
        &self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
    ) -> PffResult<Vec<DescriptorIndexEntry>> {
        let bytes = self.leaf_pages(source, ctx, TableType::DescriptorIndex)?;
        const ENTRY_SIZE: usize = 12;
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(PffError::invalid_format(
                "0x8c leaf page size is not a multiple of 12",
            ));
        }
        Ok(bytes
            .chunks(ENTRY_SIZE)
            .map(|chunk| DescriptorIndexEntry {
                identifier: u64::from_le_bytes(chunk[0..8].try_into().unwrap()),
                descriptor_identifier: u32::from_le_bytes(chunk[8..12].try_into().unwrap()),
            })
            .collect())
    }

    /// Materializes every row of a `0x9c` GUID-to-descriptor-identifier index
    /// (spec §4.5).
    pub fn guid_descriptor_index_records(
        &self,
        source: &dyn DescriptorDataSource,
        ctx: &TableContext,
    ) -> PffResult<Vec<GuidDescriptorIndexEntry>> {
        let bytes = self.leaf_pages(source, ctx, TableType::GuidDescriptorIndex)?;
        const ENTRY_SIZE: usize = 20;
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(PffError::invalid_format(
                "0x9c leaf page size is not a multiple of 20",
            ));
        }
        Ok(bytes
            .chunks(ENTRY_SIZE)
            .map(|chunk| GuidDescriptorIndexEntry {
                guid: uuid::Uuid::from_bytes_le(chunk[0..16].try_into().unwrap()),
                descriptor_identifier: u32::from_le_bytes(chunk[16..20].try_into().unwrap()),
            })
            .collect())
    }
}

fn build_values_array(
    values_array_ref: Hnid,
    entry_size: usize,
    source: &dyn DescriptorDataSource,
    heap: &HeapReader,
    ctx: &TableContext,
) -> PffResult<Option<ValuesArray>> {
    if values_array_ref.raw() == 0 {
        return Ok(None);
    }

    if values_array_ref.is_heap_reference() {
        let data = heap.clone_by_ref(values_array_ref)?;
        return Ok(Some(ValuesArray::new_local(data, entry_size)));
    }

    let local_descriptors = ctx
        .local_descriptors
        .ok_or_else(|| PffError::invalid_argument("external values array requires a local-descriptors resolver"))?;
    let descriptor_provider = ctx
        .descriptor_provider
        .ok_or_else(|| PffError::invalid_argument("external values array requires a descriptor provider"))?;

    let (data_identifier, _) = local_descriptors
        .get(values_array_ref.raw())
        .ok_or_else(|| PffError::missing_data("values array sub-node not found"))?;
    let stream = descriptor_provider.open_data(data_identifier)?;
    let _ = source;

    Ok(Some(ValuesArray::new_external(stream, entry_size)?))
}

fn build_side_table(
    columns: &[ColumnDefinition],
    source: &dyn DescriptorDataSource,
    ctx: &TableContext,
    heap: &HeapReader,
) -> PffResult<Option<PassThroughTable>> {
    let _ = (source, heap);
    let descriptor = columns.iter().find_map(|c| c.side_table_descriptor);
    let Some(descriptor) = descriptor else {
        return Ok(None);
    };

    let local_descriptors = ctx
        .local_descriptors
        .ok_or_else(|| PffError::invalid_argument("0xac side table requires a local-descriptors resolver"))?;
    let descriptor_provider = ctx
        .descriptor_provider
        .ok_or_else(|| PffError::invalid_argument("0xac side table requires a descriptor provider"))?;

    let (data_identifier, _) = local_descriptors
        .get(descriptor)
        .ok_or_else(|| PffError::missing_data("0xac side table sub-node not found"))?;
    let stream = descriptor_provider.open_data(data_identifier)?;
    Ok(Some(PassThroughTable::build(stream.as_ref())?))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::test_support::VecBlockSource;
    use crate::value_type::{BOOLEAN, INTEGER_32};

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

    /// Builds a minimal single-block `0xbc` Property Context with one depth-0 BTH
    /// and one INTEGER_32 record entry, end to end.
    #[test]
    fn opens_and_reads_simple_property_context() {
        // Record entries page: one 8-byte record_entry_bc (type=0x3001, vt=INTEGER_32, value=42).
        let mut record_page = Vec::new();
        record_page.extend_from_slice(&0x3001u16.to_le_bytes());
        record_page.extend_from_slice(&INTEGER_32.to_le_bytes());
        record_page.extend_from_slice(&42i32.to_le_bytes());

        // b5 header: depth 0, root_ref points at the record page's heap slot.
        // Slots: [0] table signature header, [1] b5 header, [2] record page. The
        // block's own leading index_offset (added by `block_bytes`) doubles as the
        // signature block's `index_offset` field, so the signature bytes here start
        // directly with the signature byte.
        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0xbc);
        b0.extend_from_slice(&(2u32 << 5).to_le_bytes()); // table_value_ref -> slot 1 (b5 header)
        b0.extend_from_slice(&0u32.to_le_bytes()); // padding

        let sig_len = b0.len() as u16;

        let mut b5 = Vec::new();
        b5.push(0xb5);
        b5.push(2); // key_size
        b5.push(6); // value_size
        b5.push(0); // depth 0
        b5.extend_from_slice(&(3u32 << 5).to_le_bytes()); // root_ref -> slot 2 (record page)

        let mut payload = Vec::new();
        payload.extend_from_slice(&b0);
        payload.extend_from_slice(&b5);
        let record_start = payload.len() as u16;
        payload.extend_from_slice(&record_page);
        let record_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, record_start, record_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let mut table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        assert_eq!(table.table_type, TableType::PropertyContext);

        let record_set = table.property_context_records(&source, &ctx).unwrap();
        assert_eq!(record_set.records.len(), 1);
        assert_eq!(record_set.records[0].entries.len(), 1);
        assert_eq!(record_set.records[0].entries[0].as_u32().unwrap(), 42);
    }

    #[test]
    fn pass_through_table_opens_directly() {
        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0xa5);
        b0.extend_from_slice(&0u32.to_le_bytes());
        b0.extend_from_slice(&0u32.to_le_bytes());
        let sig_len = b0.len() as u16;
        let mut payload = b0;
        payload.extend_from_slice(b"ROW1");
        let row_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, row_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        assert_eq!(table.table_type, TableType::PassThrough);
        assert_eq!(table.side_table.as_ref().unwrap().get(0, 1), Some(&b"ROW1"[..]));
    }

    #[test]
    fn boolean_inline_cell_round_trips_through_property_context() {
        let mut record_page = Vec::new();
        record_page.extend_from_slice(&0x0e1bu16.to_le_bytes());
        record_page.extend_from_slice(&BOOLEAN.to_le_bytes());
        record_page.extend_from_slice(&[1u8, 0, 0, 0]);

        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0xbc);
        b0.extend_from_slice(&(2u32 << 5).to_le_bytes());
        b0.extend_from_slice(&0u32.to_le_bytes());
        let sig_len = b0.len() as u16;

        let mut b5 = Vec::new();
        b5.push(0xb5);
        b5.push(2);
        b5.push(6);
        b5.push(0);
        b5.extend_from_slice(&(3u32 << 5).to_le_bytes());

        let mut payload = b0;
        payload.extend_from_slice(&b5);
        let record_start = payload.len() as u16;
        payload.extend_from_slice(&record_page);
        let record_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, record_start, record_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let mut table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        let record_set = table.property_context_records(&source, &ctx).unwrap();
        assert!(record_set.records[0].entries[0].as_bool().unwrap());
    }

    #[test]
    fn opens_and_reads_guid_to_value_map() {
        let guid = uuid::Uuid::from_u128(0x0102_0304_0506_0708_090a_0b0c0d0e0f10);
        let mut record_page = Vec::new();
        record_page.extend_from_slice(&guid.to_bytes_le());
        record_page.extend_from_slice(&7u16.to_le_bytes());

        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0x6c);
        b0.extend_from_slice(&(2u32 << 5).to_le_bytes());
        b0.extend_from_slice(&0u32.to_le_bytes());
        let sig_len = b0.len() as u16;

        let mut b5 = Vec::new();
        b5.push(0xb5);
        b5.push(16); // key_size (GUID)
        b5.push(2); // value_size
        b5.push(0); // depth 0
        b5.extend_from_slice(&(3u32 << 5).to_le_bytes());

        let mut payload = b0;
        payload.extend_from_slice(&b5);
        let record_start = payload.len() as u16;
        payload.extend_from_slice(&record_page);
        let record_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, record_start, record_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        assert_eq!(table.table_type, TableType::GuidToValue);

        let entries = table.guid_to_value_records(&source, &ctx).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].guid, guid);
        assert_eq!(entries[0].values_array_number, 7);
    }

    #[test]
    fn opens_and_reads_descriptor_index() {
        let mut record_page = Vec::new();
        record_page.extend_from_slice(&0x1234_5678_9abc_def0u64.to_le_bytes());
        record_page.extend_from_slice(&0x2222_3333u32.to_le_bytes());

        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0x8c);
        b0.extend_from_slice(&(2u32 << 5).to_le_bytes());
        b0.extend_from_slice(&0u32.to_le_bytes());
        let sig_len = b0.len() as u16;

        let mut b5 = Vec::new();
        b5.push(0xb5);
        b5.push(8); // key_size
        b5.push(4); // value_size
        b5.push(0); // depth 0
        b5.extend_from_slice(&(3u32 << 5).to_le_bytes());

        let mut payload = b0;
        payload.extend_from_slice(&b5);
        let record_start = payload.len() as u16;
        payload.extend_from_slice(&record_page);
        let record_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, record_start, record_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        assert_eq!(table.table_type, TableType::DescriptorIndex);

        let entries = table.descriptor_index_records(&source, &ctx).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, 0x1234_5678_9abc_def0);
        assert_eq!(entries[0].descriptor_identifier, 0x2222_3333);
    }

    #[test]
    fn opens_and_reads_guid_descriptor_index() {
        let guid = uuid::Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888);
        let mut record_page = Vec::new();
        record_page.extend_from_slice(&guid.to_bytes_le());
        record_page.extend_from_slice(&0x9999_aaaau32.to_le_bytes());

        let mut b0 = Vec::new();
        b0.push(0xec);
        b0.push(0x9c);
        b0.extend_from_slice(&(2u32 << 5).to_le_bytes());
        b0.extend_from_slice(&0u32.to_le_bytes());
        let sig_len = b0.len() as u16;

        let mut b5 = Vec::new();
        b5.push(0xb5);
        b5.push(16); // key_size (GUID)
        b5.push(4); // value_size
        b5.push(0); // depth 0
        b5.extend_from_slice(&(3u32 << 5).to_le_bytes());

        let mut payload = b0;
        payload.extend_from_slice(&b5);
        let record_start = payload.len() as u16;
        payload.extend_from_slice(&record_page);
        let record_end = payload.len() as u16;

        let block = block_bytes(&payload, &[0, sig_len, record_start, record_end]);
        let source = VecBlockSource::new(vec![block]);
        let ctx = TableContext::default();
        let table = Table::open(&source, FileType::Ansi32, &ctx).unwrap();
        assert_eq!(table.table_type, TableType::GuidDescriptorIndex);

        let entries = table.guid_descriptor_index_records(&source, &ctx).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].guid, guid);
        assert_eq!(entries[0].descriptor_identifier, 0x9999_aaaa);
    }
}
