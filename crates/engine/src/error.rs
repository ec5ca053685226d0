//! Error types for the Firkin engine.

use record::RecordError;
use std::io;
use thiserror::Error;
use uuid::Uuid;

/// The result type used throughout the engine crate.
pub type Result<T> = std::result::Result<T, KvsError>;

/// Errors surfaced by the public engine operations.
#[derive(Debug, Error)]
pub enum KvsError {
    /// The key is absent from the index (read or delete of a missing key).
    #[error("entry not found")]
    EntryNotFound,

    /// A decode ran past the end of a segment. Should not happen on a serving
    /// read as long as the index only points at well-formed records.
    #[error("short read at offset {offset}: needed {needed} bytes")]
    ShortRead {
        /// Absolute file offset the decode started at.
        offset: u64,
        /// Number of bytes the decode required.
        needed: usize,
    },

    /// The index referenced a segment that is not registered in the segment
    /// set, an internal invariant breach surfaced as an error.
    #[error("segment {0} is not registered")]
    UnknownSegment(Uuid),

    /// A key or value is too large for the 31-bit size fields of the record
    /// format.
    #[error("field of {0} bytes exceeds the maximum encodable size")]
    FieldTooLarge(usize),

    /// An underlying file-system failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<RecordError> for KvsError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::ShortRead { offset, needed } => KvsError::ShortRead { offset, needed },
            RecordError::Io(e) => KvsError::Io(e),
        }
    }
}
