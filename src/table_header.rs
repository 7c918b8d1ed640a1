//! Table signature block parsing and type dispatch (spec §3 "Table header", §4.4,
//! component E).

use crate::error::{PffError, PffResult};
use crate::hnid::Hnid;
use nom::number::complete as number;
use strum::EnumIter;

const SIGNATURE: u8 = 0xec;

/// The table flavor selected by the signature block's `type` byte.
// No data in the variants, so EnumIter lets callers enumerate every table type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TableType {
    /// `0x6c`: GUID to value map.
    GuidToValue,
    /// `0x7c`: Table Context with inline column definitions.
    TcInline,
    /// `0x8c`: descriptor-identifier index.
    DescriptorIndex,
    /// `0x9c`: GUID-to-descriptor-identifier index.
    GuidDescriptorIndex,
    /// `0xa5`: per-block pass-through value collection.
    PassThrough,
    /// `0xac`: Table Context with external column definitions.
    TcExternal,
    /// `0xbc`: Property Context.
    PropertyContext,
}

impl TableType {
    fn from_byte(b: u8) -> PffResult<Self> {
        Ok(match b {
            0x6c => TableType::GuidToValue,
            0x7c => TableType::TcInline,
            0x8c => TableType::DescriptorIndex,
            0x9c => TableType::GuidDescriptorIndex,
            0xa5 => TableType::PassThrough,
            0xac => TableType::TcExternal,
            0xbc => TableType::PropertyContext,
            other => {
                return Err(PffError::unsupported_value(format!(
                    "unsupported table type byte {other:#04x}"
                )))
            }
        })
    }
}

/// The leading 12-byte signature block of block 0 (spec §4.4, §6).
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    pub table_type: TableType,
    pub table_value_ref: Hnid,
}

impl TableHeader {
    pub fn parse(data: &[u8]) -> PffResult<Self> {
        if data.len() < 12 {
            return Err(PffError::invalid_format(
                "table signature block shorter than 12 bytes",
            ));
        }

        let (rest, _index_offset) = number::le_u16::<_, nom::error::Error<&[u8]>>(data)
            .map_err(|e| PffError::invalid_format(format!("{e}")))?;

        let signature = rest[0];
        if signature != SIGNATURE {
            return Err(PffError::invalid_format(format!(
                "expected table signature 0xec, got {signature:#04x}"
            )));
        }

        let table_type = TableType::from_byte(rest[1])?;

        let (_, table_value_ref) = number::le_u32::<_, nom::error::Error<&[u8]>>(&rest[2..6])
            .map_err(|e| PffError::invalid_format(format!("{e}")))?;

        Ok(TableHeader {
            table_type,
            table_value_ref: Hnid(table_value_ref),
        })
    }
}
