use std::collections::HashMap;
use uuid::Uuid;

/// Where the most recent live record for a key sits on disk.
///
/// `timestamp` is the record's write time in seconds since the epoch; it is
/// carried along so compaction can rewrite entries without re-reading
/// metadata from the caller's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Identity of the segment that owns the record.
    pub segment_id: Uuid,
    /// Byte offset of the record's first byte inside that segment.
    pub offset: u64,
    /// Write timestamp of the record.
    pub timestamp: i64,
}

/// The in-memory key directory: key bytes to the location of the latest live
/// record. Tombstoned keys are absent: a delete removes the mapping.
///
/// The index exposes no ordering and owns no external resources. Callers are
/// expected to hold the engine lock around any sequence of calls that must be
/// atomic; `keys()` hands out an owned snapshot for exactly that pattern.
#[derive(Debug, Default)]
pub struct Index {
    map: HashMap<Vec<u8>, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Inserts or replaces the entry for `key`.
    pub fn set(&mut self, key: Vec<u8>, entry: IndexEntry) {
        self.map.insert(key, entry);
    }

    /// Looks up the entry for `key`.
    pub fn get(&self, key: &[u8]) -> Option<&IndexEntry> {
        self.map.get(key)
    }

    /// Removes `key`. Deleting an absent key is not an error.
    pub fn delete(&mut self, key: &[u8]) {
        self.map.remove(key);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// An owned snapshot of all current keys, in unspecified order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.map.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests;
