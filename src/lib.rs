//! Parses the heap-on-node, BTree-on-heap, Table Context, and Property Context
//! subsystem of Microsoft Outlook PST/OST files.
//!
//! This crate does not open `.pst`/`.ost` files, walk the file's own B-tree of
//! descriptors, or decrypt/decompress blocks: callers supply those pieces through
//! the traits in [`collab`] and hand this crate already-decoded block bytes. What
//! this crate does is interpret the heap/BTH/table byte layouts on top of that:
//! resolving [`hnid::Hnid`]s, walking [`bth`] pages, parsing the seven table
//! header flavors, and materializing [`record_entry::RecordEntry`] values with
//! their typed [`accessors`].
//!
//! ```
//! use pff_table::hnid::{FileType, Hnid};
//!
//! let hnid = Hnid(0x0001_0020);
//! assert!(hnid.is_heap_reference());
//! assert_eq!(hnid.split(FileType::Ansi32), Some((1, 0)));
//! ```

pub mod accessors;
pub mod block;
pub mod bth;
pub mod collab;
pub mod column;
pub mod error;
pub mod heap;
pub mod hnid;
pub mod local_descriptors;
pub mod multi_value;
pub mod pass_through;
pub mod record_entry;
pub mod table;
pub mod table_header;
pub mod table_index;
pub mod unicode;
pub mod value_array;
pub mod value_type;

pub use collab::{DescriptorDataSource, DescriptorProvider, LocalDescriptorResolver, NameToIdMap, UnicodeConverter};
pub use error::{Diagnostics, NullDiagnostics, PffError, PffResult};
pub use hnid::{FileType, Hnid};
pub use record_entry::{RecordEntry, RecordEntryId};
pub use table::{Record, RecordSet, Table, TableContext};
pub use table_header::TableType;

/// Allows iterating over every variant of an enum that derives `EnumIter`
/// (e.g. [`TableType`]), without callers needing to depend on `strum` directly.
pub trait EnumIterable: Sized {
    type Iterator: Iterator<Item = Self>;

    fn iter() -> Self::Iterator;
}

impl<T: strum::IntoEnumIterator> EnumIterable for T {
    type Iterator = T::Iterator;

    fn iter() -> Self::Iterator {
        T::iter()
    }
}
