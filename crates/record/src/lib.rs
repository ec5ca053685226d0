//! # Record - Log Record Codec
//!
//! The on-disk unit of the Firkin storage engine. Every segment file is a
//! plain concatenation of records; there is no per-segment header, checksum,
//! or terminator; end of file is end of data.
//!
//! ## Binary Record Format
//!
//! ```text
//! offset 0 : 1 byte  tombstone flag (0x00 live | 0x01 tombstone)
//! offset 1 : 8 bytes timestamp, little-endian signed seconds since epoch
//! offset 9 : 4 bytes key_size, big-endian unsigned
//! offset 13: key_size bytes key
//! offset 13+key_size:   4 bytes value_size, big-endian unsigned
//! offset 13+key_size+4: value_size bytes value (empty for tombstones)
//! ```
//!
//! The mixed endianness (little-endian timestamp, big-endian sizes) is a
//! format-compatibility requirement; changing either side would need a format
//! version bump.
//!
//! Decoding is positional: every helper takes a `&File` and an absolute byte
//! offset and never touches the file cursor, so concurrent readers can decode
//! from the same handle. A read that runs past end-of-file fails with
//! [`RecordError::ShortRead`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use thiserror::Error;

/// Size of the metadata block: 1 tombstone byte + 8 timestamp bytes.
pub const METADATA_LEN: usize = 9;

/// Size of a key-size or value-size field.
pub const SIZE_LEN: usize = 4;

/// Errors produced while decoding records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Fewer bytes were available at the given offset than the decode needed.
    /// During an open-time scan this marks end-of-data; during a serving read
    /// it is a real failure.
    #[error("short read at offset {offset}: needed {needed} bytes")]
    ShortRead {
        /// Absolute file offset the decode started at.
        offset: u64,
        /// Number of bytes the decode required.
        needed: usize,
    },

    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The fixed-size prefix of every record: liveness flag plus timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// `true` marks a deletion record.
    pub tombstone: bool,
    /// Seconds since the Unix epoch at write time.
    pub timestamp: i64,
}

impl Metadata {
    /// Metadata for a live record.
    pub fn live(timestamp: i64) -> Self {
        Self {
            tombstone: false,
            timestamp,
        }
    }

    /// Metadata for a deletion record.
    pub fn tombstone(timestamp: i64) -> Self {
        Self {
            tombstone: true,
            timestamp,
        }
    }

    /// Encodes into the 9-byte wire form.
    pub fn encode(&self) -> [u8; METADATA_LEN] {
        let mut buf = [0u8; METADATA_LEN];
        buf[0] = self.tombstone as u8;
        LittleEndian::write_i64(&mut buf[1..], self.timestamp);
        buf
    }

    /// Decodes the 9-byte wire form. Any flag byte other than exactly `0x01`
    /// is treated as live.
    pub fn decode(buf: &[u8; METADATA_LEN]) -> Self {
        Self {
            tombstone: buf[0] == 0x01,
            timestamp: LittleEndian::read_i64(&buf[1..]),
        }
    }
}

/// Encodes a size field into its big-endian wire form.
pub fn encode_size(size: u32) -> [u8; SIZE_LEN] {
    let mut buf = [0u8; SIZE_LEN];
    BigEndian::write_u32(&mut buf, size);
    buf
}

/// Decodes a big-endian size field.
pub fn decode_size(buf: &[u8; SIZE_LEN]) -> u32 {
    BigEndian::read_u32(buf)
}

/// One fully materialized log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Liveness flag and write timestamp.
    pub metadata: Metadata,
    /// The lookup key.
    pub key: Vec<u8>,
    /// The payload; always empty for tombstones.
    pub value: Vec<u8>,
}

impl Record {
    /// A live record carrying `value`.
    pub fn put(key: &[u8], value: &[u8], timestamp: i64) -> Self {
        Self {
            metadata: Metadata::live(timestamp),
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    /// A deletion record with a zero-length value.
    pub fn tombstone(key: &[u8], timestamp: i64) -> Self {
        Self {
            metadata: Metadata::tombstone(timestamp),
            key: key.to_vec(),
            value: Vec::new(),
        }
    }

    /// Total encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        METADATA_LEN + SIZE_LEN + self.key.len() + SIZE_LEN + self.value.len()
    }

    /// Serializes the record into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.metadata.encode());
        buf.extend_from_slice(&encode_size(self.key.len() as u32));
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&encode_size(self.value.len() as u32));
        buf.extend_from_slice(&self.value);
        buf
    }

    /// Decodes one full record starting at `offset`, returning it together
    /// with the number of bytes consumed.
    pub fn read_at(file: &File, offset: u64) -> Result<(Record, u64), RecordError> {
        let mut cursor = offset;

        let metadata = read_metadata_at(file, cursor)?;
        cursor += METADATA_LEN as u64;

        let key_size = read_size_at(file, cursor)?;
        cursor += SIZE_LEN as u64;
        let key = read_bytes_at(file, cursor, key_size as usize)?;
        cursor += u64::from(key_size);

        let value_size = read_size_at(file, cursor)?;
        cursor += SIZE_LEN as u64;
        let value = read_bytes_at(file, cursor, value_size as usize)?;
        cursor += u64::from(value_size);

        let record = Record {
            metadata,
            key,
            value,
        };
        Ok((record, cursor - offset))
    }
}

/// Positionally reads and decodes a 9-byte metadata block.
pub fn read_metadata_at(file: &File, offset: u64) -> Result<Metadata, RecordError> {
    let mut buf = [0u8; METADATA_LEN];
    read_exact_at(file, &mut buf, offset)?;
    Ok(Metadata::decode(&buf))
}

/// Positionally reads and decodes a 4-byte size field.
pub fn read_size_at(file: &File, offset: u64) -> Result<u32, RecordError> {
    let mut buf = [0u8; SIZE_LEN];
    read_exact_at(file, &mut buf, offset)?;
    Ok(decode_size(&buf))
}

/// Positionally reads `len` raw bytes.
pub fn read_bytes_at(file: &File, offset: u64, len: usize) -> Result<Vec<u8>, RecordError> {
    let mut buf = vec![0u8; len];
    read_exact_at(file, &mut buf, offset)?;
    Ok(buf)
}

fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> Result<(), RecordError> {
    match file.read_exact_at(buf, offset) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(RecordError::ShortRead {
            offset,
            needed: buf.len(),
        }),
        Err(e) => Err(RecordError::Io(e)),
    }
}
