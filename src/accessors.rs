//! Typed property accessors over a materialized [`RecordEntry`] (spec §4.10,
//! §4.11, component J).

use crate::collab::UnicodeConverter;
use crate::error::{PffError, PffResult};
use crate::multi_value::MultiValue;
use crate::record_entry::RecordEntry;
use crate::unicode;
use crate::value_type::{self, *};
use std::cmp::Ordering;

fn expect_type(entry: &RecordEntry, expected: u16) -> PffResult<()> {
    if entry.value_type() != expected {
        return Err(PffError::value_mismatch(format!(
            "expected value_type {expected:#06x}, entry has {:#06x}",
            entry.value_type()
        )));
    }
    Ok(())
}

fn fixed_bytes(entry: &RecordEntry, width: usize) -> PffResult<&[u8]> {
    let data = entry.value_data();
    if data.len() < width {
        return Err(PffError::value_mismatch(format!(
            "entry has {} bytes, need {width}",
            data.len()
        )));
    }
    Ok(&data[..width])
}

impl RecordEntry {
    pub fn as_bool(&self) -> PffResult<bool> {
        expect_type(self, BOOLEAN)?;
        Ok(fixed_bytes(self, 1)?[0] != 0)
    }

    pub fn as_u16(&self) -> PffResult<u16> {
        expect_type(self, INTEGER_16)?;
        Ok(u16::from_le_bytes(fixed_bytes(self, 2)?.try_into().unwrap()))
    }

    pub fn as_u32(&self) -> PffResult<u32> {
        expect_type(self, INTEGER_32)?;
        Ok(u32::from_le_bytes(fixed_bytes(self, 4)?.try_into().unwrap()))
    }

    pub fn as_u64(&self) -> PffResult<u64> {
        expect_type(self, INTEGER_64)?;
        Ok(u64::from_le_bytes(fixed_bytes(self, 8)?.try_into().unwrap()))
    }

    /// FILETIME ticks: 100ns units since 1601-01-01, left undecoded per spec §4.10
    /// (timezone/epoch conversion is caller business).
    pub fn as_filetime(&self) -> PffResult<u64> {
        expect_type(self, FILETIME)?;
        Ok(u64::from_le_bytes(fixed_bytes(self, 8)?.try_into().unwrap()))
    }

    /// APPTIME: days since 1899-12-30 as a float, left undecoded.
    pub fn as_floatingtime(&self) -> PffResult<f64> {
        expect_type(self, FLOATINGTIME)?;
        Ok(f64::from_le_bytes(fixed_bytes(self, 8)?.try_into().unwrap()))
    }

    pub fn as_floating_point(&self) -> PffResult<f64> {
        match self.value_type() {
            FLOATING_32 => Ok(f32::from_le_bytes(fixed_bytes(self, 4)?.try_into().unwrap()) as f64),
            FLOATING_64 => Ok(f64::from_le_bytes(fixed_bytes(self, 8)?.try_into().unwrap())),
            other => Err(PffError::value_mismatch(format!(
                "value_type {other:#06x} is not a floating-point type"
            ))),
        }
    }

    /// Decodes a stored INTEGER_32/INTEGER_64 value as a size.
    pub fn as_size(&self) -> PffResult<u64> {
        let data = self.value_data().as_slice();
        match (self.value_type(), data.len()) {
            (INTEGER_32, 4) => Ok(u32::from_le_bytes(data.try_into().unwrap()) as u64),
            (INTEGER_64, 8) => Ok(u64::from_le_bytes(data.try_into().unwrap())),
            (vt, len) => Err(PffError::value_mismatch(format!(
                "as_size requires INTEGER_32 (4 bytes) or INTEGER_64 (8 bytes), got value_type {vt:#06x} with {len} bytes"
            ))),
        }
    }

    pub fn as_guid(&self) -> PffResult<uuid::Uuid> {
        expect_type(self, GUID)?;
        let bytes: [u8; 16] = fixed_bytes(self, 16)?.try_into().unwrap();
        Ok(uuid::Uuid::from_bytes_le(bytes))
    }

    /// Resolves to the identifier of the object this entry's value references
    /// (spec §GLOSSARY "OBJECT value type"). An OBJECT entry's value data is 8
    /// bytes, of which only the first 4 (little-endian) are the identifier; the
    /// remaining 4 bytes are reserved.
    pub fn as_object_identifier(&self) -> PffResult<u32> {
        expect_type(self, OBJECT)?;
        let data = self.value_data().as_slice();
        if data.len() != 8 {
            return Err(PffError::value_mismatch(format!(
                "OBJECT entry has unexpected size {}, expected 8",
                data.len()
            )));
        }
        Ok(u32::from_le_bytes(data[..4].try_into().unwrap()))
    }

    pub fn as_utf8_string(&self, converter: &dyn UnicodeConverter) -> PffResult<String> {
        self.as_utf8_string_with_codepage(self.ascii_codepage(), converter)
    }

    pub fn as_utf8_string_with_codepage(
        &self,
        codepage: u32,
        converter: &dyn UnicodeConverter,
    ) -> PffResult<String> {
        let vt = self.value_type();
        if vt != STRING_ASCII && vt != STRING_UNICODE {
            return Err(PffError::value_mismatch(format!(
                "value_type {vt:#06x} is not a string type"
            )));
        }
        unicode::decode_string(vt, codepage, self.value_data(), converter)
    }

    /// Decodes the stored bytes as UTF-16LE regardless of `value_type`, for callers
    /// that already know (from context) that the bytes are UTF-16.
    pub fn as_utf16_string(&self) -> PffResult<String> {
        let data = self.value_data();
        if data.len() % 2 != 0 {
            return Err(PffError::conversion_failed("odd-length UTF-16LE bytes"));
        }
        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        char::decode_utf16(units)
            .collect::<Result<String, _>>()
            .map_err(|e| PffError::conversion_failed(e.to_string()))
    }

    pub fn compare_with_utf8(
        &self,
        other: &str,
        converter: &dyn UnicodeConverter,
    ) -> PffResult<Ordering> {
        let vt = self.value_type();
        unicode::compare_string(vt, self.ascii_codepage(), self.value_data(), other, converter)
    }

    pub fn compare_with_utf16(&self, other: &str) -> PffResult<Ordering> {
        Ok(self.as_utf16_string()?.as_str().cmp(other))
    }

    /// Decomposes this entry's raw bytes into a [`MultiValue`], failing if
    /// `value_type` does not carry the multi-value flag.
    pub fn as_multi_value(&self) -> PffResult<MultiValue> {
        MultiValue::parse(self.value_type(), self.value_data().to_vec(), self.ascii_codepage())
    }

    pub fn multi_value_count(&self) -> PffResult<usize> {
        Ok(self.as_multi_value()?.count())
    }

    pub fn is_multi_value(&self) -> bool {
        value_type::is_multi_value(self.value_type())
    }
}
