//! Error taxonomy for the table subsystem.
//!
//! The on-disk parsers in this crate never panic on malformed input; every fallible
//! operation returns a [`PffError`]. A handful of error kinds are *tolerated* by the
//! table core itself (see [`crate::table::Table`]) rather than propagated: those are
//! converted into a [`crate::table::MissingDataFlags`] bit and parsing continues.

use std::fmt;

pub type PffResult<T> = Result<T, PffError>;

/// A single error kind, mirroring the taxonomy used throughout the crate's docs.
#[derive(thiserror::Error, Debug)]
pub enum PffError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("I/O error reading collaborator data: {0}")]
    Io(String),

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("string conversion failed: {0}")]
    ConversionFailed(String),

    #[error("value type/length mismatch: {0}")]
    ValueMismatch(String),
}

impl PffError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        PffError::InvalidArgument(msg.into())
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        PffError::InvalidFormat(msg.into())
    }

    pub fn unsupported_value(msg: impl Into<String>) -> Self {
        PffError::UnsupportedValue(msg.into())
    }

    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        PffError::OutOfBounds(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        PffError::Io(msg.into())
    }

    pub fn missing_data(msg: impl Into<String>) -> Self {
        PffError::MissingData(msg.into())
    }

    pub fn conversion_failed(msg: impl Into<String>) -> Self {
        PffError::ConversionFailed(msg.into())
    }

    pub fn value_mismatch(msg: impl Into<String>) -> Self {
        PffError::ValueMismatch(msg.into())
    }

    /// Whether the table core's tolerance policy (see module docs) applies to this
    /// error: a missing sub-node or external value is recoverable, everything else is
    /// fatal to the surrounding parse.
    pub fn is_tolerated_missing_data(&self) -> bool {
        matches!(self, PffError::MissingData(_))
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for PffError {
    fn from(e: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        PffError::InvalidFormat(format!("{e}"))
    }
}

/// Caller-supplied diagnostics sink, replacing the source library's global verbosity
/// flag (see design notes: no process-global mutable state for debug output).
pub trait Diagnostics {
    fn log(&self, message: fmt::Arguments);
}

/// A [`Diagnostics`] implementation that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn log(&self, _message: fmt::Arguments) {}
}

#[macro_export]
macro_rules! diag {
    ($sink:expr, $($arg:tt)*) => {
        $sink.log(format_args!($($arg)*))
    };
}
