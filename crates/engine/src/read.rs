//! Read path: `read()`.
//!
//! A point lookup resolves the key through the index and then performs three
//! positional reads against the owning segment: the key size (to skip the key
//! bytes), the value size, and the value itself. The on-disk key is trusted
//! to match the index key; the write path guarantees it.

use crate::{Engine, KvsError, Result};
use record::{self, METADATA_LEN, SIZE_LEN};

impl Engine {
    /// Returns the value stored for `key`, failing with
    /// [`KvsError::EntryNotFound`] if the key is absent or deleted.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        let state = self.inner.state.read();

        let entry = state.index.get(key).ok_or(KvsError::EntryNotFound)?;
        let segment = state
            .segments
            .get(entry.segment_id)
            .ok_or(KvsError::UnknownSegment(entry.segment_id))?;
        let file = segment.file();

        let mut offset = entry.offset + METADATA_LEN as u64;
        let key_size = record::read_size_at(file, offset)?;
        offset += (SIZE_LEN + key_size as usize) as u64;

        let value_size = record::read_size_at(file, offset)?;
        offset += SIZE_LEN as u64;

        let value = record::read_bytes_at(file, offset, value_size as usize)?;
        Ok(value)
    }
}
