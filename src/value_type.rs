//! MAPI value-type tags (per MS-OXCDATA, as referenced by spec §4.8, §4.10).

pub const UNSPECIFIED: u16 = 0x0000;
pub const NULL: u16 = 0x0001;
pub const INTEGER_16: u16 = 0x0002;
pub const INTEGER_32: u16 = 0x0003;
pub const FLOATING_32: u16 = 0x0004;
pub const FLOATING_64: u16 = 0x0005;
pub const CURRENCY: u16 = 0x0006;
pub const FLOATINGTIME: u16 = 0x0007;
pub const ERROR: u16 = 0x000a;
pub const BOOLEAN: u16 = 0x000b;
pub const OBJECT: u16 = 0x000d;
pub const INTEGER_64: u16 = 0x0014;
pub const STRING_ASCII: u16 = 0x001e;
pub const STRING_UNICODE: u16 = 0x001f;
pub const FILETIME: u16 = 0x0040;
pub const GUID: u16 = 0x0048;
pub const SERVER_ID: u16 = 0x00fb;
pub const RESTRICTION: u16 = 0x00fd;
pub const RULE_ACTION: u16 = 0x00fe;
pub const BINARY: u16 = 0x0102;

/// Multi-value types are the base type with this bit set.
pub const MULTI_VALUE_FLAG: u16 = 0x1000;

pub fn is_multi_value(value_type: u16) -> bool {
    value_type & MULTI_VALUE_FLAG != 0
}

pub fn base_type(value_type: u16) -> u16 {
    value_type & !MULTI_VALUE_FLAG
}

/// Whether a (non-multi-value) type's bytes are a fixed width, and if so which.
pub fn fixed_width(value_type: u16) -> Option<usize> {
    match value_type {
        BOOLEAN => Some(1),
        INTEGER_16 => Some(2),
        INTEGER_32 | FLOATING_32 | ERROR => Some(4),
        FLOATING_64 | CURRENCY | FLOATINGTIME | INTEGER_64 | FILETIME => Some(8),
        GUID => Some(16),
        _ => None,
    }
}

/// Types whose values are never stored inline in a TC/PC cell; the cell always
/// carries either a heap HNID, a sub-node HNID, or zero (spec §4.8 step 5).
pub fn is_variable_or_large(value_type: u16) -> bool {
    if is_multi_value(value_type) {
        return true;
    }
    matches!(
        value_type,
        FLOATING_64
            | CURRENCY
            | FLOATINGTIME
            | INTEGER_64
            | STRING_ASCII
            | STRING_UNICODE
            | FILETIME
            | GUID
            | SERVER_ID
            | RESTRICTION
            | RULE_ACTION
            | BINARY
    )
}
