//! Write path: `write()`, `delete()`, and head rollover.
//!
//! Both mutations run under the exclusive lock. The index is updated before
//! the record hits the disk; a crash between the two loses only the volatile
//! index, and the open-time scan drops the partially written trailing record.

use crate::{Engine, KvsError, Result, State, MAX_FIELD_LEN};
use index::IndexEntry;
use record::Record;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

impl Engine {
    /// Inserts or replaces the value stored for `key`.
    ///
    /// Appends one live record to the head segment, points the index at it,
    /// and rolls the head over if the size threshold was crossed.
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        ensure_encodable(key)?;
        ensure_encodable(value)?;

        let mut state = self.inner.state.write();
        let state = &mut *state;

        let head_id = state.segments.head_id();
        let offset = state
            .segments
            .head_mut()
            .ok_or(KvsError::UnknownSegment(head_id))?
            .len()?;

        let timestamp = unix_timestamp();
        state.index.set(
            key.to_vec(),
            IndexEntry {
                segment_id: head_id,
                offset,
                timestamp,
            },
        );

        let record = Record::put(key, value, timestamp);
        state
            .segments
            .head_mut()
            .ok_or(KvsError::UnknownSegment(head_id))?
            .append(&record.encode())?;
        state.head_size += record.encoded_len() as u64;

        self.roll_head_if_needed(state)
    }

    /// Removes `key`, failing with [`KvsError::EntryNotFound`] if it was
    /// never written. The deletion is durable: a tombstone record with a
    /// zero-length value is appended to the head segment.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        ensure_encodable(key)?;

        let mut state = self.inner.state.write();
        let state = &mut *state;

        if state.index.get(key).is_none() {
            return Err(KvsError::EntryNotFound);
        }
        state.index.delete(key);

        let record = Record::tombstone(key, unix_timestamp());
        let head_id = state.segments.head_id();
        state
            .segments
            .head_mut()
            .ok_or(KvsError::UnknownSegment(head_id))?
            .append(&record.encode())?;
        state.head_size += record.encoded_len() as u64;

        self.roll_head_if_needed(state)
    }

    /// Checked after every append: once the tracked head size reaches the
    /// threshold, subsequent appends go to a fresh head segment.
    fn roll_head_if_needed(&self, state: &mut State) -> Result<()> {
        if state.head_size >= self.inner.config.log_file_size_threshold {
            let new_head = state.segments.rollover()?;
            state.head_size = 0;
            debug!(segment = %new_head, "rolled over to a new head segment");
        }
        Ok(())
    }
}

fn ensure_encodable(field: &[u8]) -> Result<()> {
    if field.len() > MAX_FIELD_LEN {
        return Err(KvsError::FieldTooLarge(field.len()));
    }
    Ok(())
}

/// Seconds since the Unix epoch, negative for pre-epoch clocks.
pub(crate) fn unix_timestamp() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(err) => -(err.duration().as_secs() as i64),
    }
}
