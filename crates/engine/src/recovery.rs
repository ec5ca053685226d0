//! Open-time index rebuild.
//!
//! Every segment is scanned from offset 0, decoding records sequentially:
//! live records (re)point the index at themselves, tombstones remove the key.
//! Segments are replayed oldest-modified first so that last-write-wins across
//! rollovers matches the order the records were originally written; ties
//! break by segment id to keep the replay deterministic.
//!
//! A scan stops silently at the first short read, and a record whose value
//! bytes run past end-of-file is never indexed: a crash mid-append leaves at
//! most one ignorable partial record at the tail of a segment.

use crate::Result;
use index::{Index, IndexEntry};
use record::{RecordError, METADATA_LEN, SIZE_LEN};
use segment::{Segment, SegmentSet};
use std::time::SystemTime;
use uuid::Uuid;

pub(crate) fn rebuild_index(segments: &SegmentSet, index: &mut Index) -> Result<()> {
    let mut ordered: Vec<(SystemTime, Uuid, &Segment)> = Vec::with_capacity(segments.len());
    for segment in segments.iter() {
        ordered.push((segment.modified()?, segment.id(), segment));
    }
    ordered.sort_by_key(|&(modified, id, _)| (modified, id));

    for (_, _, segment) in ordered {
        scan_segment(segment, index)?;
    }
    Ok(())
}

fn scan_segment(segment: &Segment, index: &mut Index) -> Result<()> {
    let file = segment.file();
    let len = segment.len()?;
    let mut offset = 0u64;

    loop {
        let start = offset;

        let Some(metadata) = or_eof(record::read_metadata_at(file, offset))? else {
            break;
        };
        offset += METADATA_LEN as u64;

        let Some(key_size) = or_eof(record::read_size_at(file, offset))? else {
            break;
        };
        offset += SIZE_LEN as u64;

        let Some(key) = or_eof(record::read_bytes_at(file, offset, key_size as usize))? else {
            break;
        };
        offset += u64::from(key_size);

        let Some(value_size) = or_eof(record::read_size_at(file, offset))? else {
            break;
        };
        offset += SIZE_LEN as u64;

        let end = offset + u64::from(value_size);
        if end > len {
            // Trailing partial record: the value never fully made it to disk.
            break;
        }
        offset = end;

        if metadata.tombstone {
            index.delete(&key);
        } else {
            index.set(
                key,
                IndexEntry {
                    segment_id: segment.id(),
                    offset: start,
                    timestamp: metadata.timestamp,
                },
            );
        }
    }

    Ok(())
}

/// Maps a short read to `None` (end of scan); real I/O errors propagate.
fn or_eof<T>(result: std::result::Result<T, RecordError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RecordError::ShortRead { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
