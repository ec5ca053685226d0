//! # Engine - Firkin Storage Engine
//!
//! A single-node, embeddable, persistent key-value store in the Bitcask
//! style: an append-only log on disk paired with an in-memory index from key
//! to the log location of the most recent value. The engine ties together the
//! [`record`], [`index`], [`segment`], and [`rwlock`] crates.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌─────────────────────────────────────────────────┐
//! │                    ENGINE                       │
//! │                                                 │
//! │ write.rs → index.set → append to HEAD segment   │
//! │               |                                 │
//! │               |  (head size >= threshold?)      │
//! │               |            yes                  │
//! │               v                                 │
//! │           rollover() → fresh HEAD               │
//! │                                                 │
//! │ read.rs → index lookup → positional value read  │
//! │                                                 │
//! │ compaction.rs (worker thread, every N ms):      │
//! │   copy live records → fresh segments,           │
//! │   rewrite index, unlink retired files           │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, open/close, accessors, `Debug`, `Drop` |
//! | [`config`]     | `Config` with threshold and worker-interval options |
//! | [`error`]      | `KvsError` taxonomy                                 |
//! | `recovery`     | Open-time index rebuild from the segment files      |
//! | `write`        | `write()`, `delete()`, head rollover                |
//! | `read`         | `read()`                                            |
//! | `compaction`   | `compact()` pass + the background worker            |
//!
//! ## Concurrency
//!
//! Every public operation goes through one readers-preferring
//! [`ReaderWriterLock`] guarding the whole mutable state (index, segment set,
//! head size counter). Reads share the lock; writes, deletes, and whole
//! compaction passes hold it exclusively, so no read ever straddles a segment
//! swap. `Engine` is `Send + Sync` and all operations take `&self`.
//!
//! ## Durability
//!
//! A write appends one record to the head segment before returning; there is
//! no write-ahead log and no fsync. On restart the index is rebuilt by
//! scanning every segment, stopping cleanly at a truncated trailing record,
//! so the store recovers to the last fully persisted write.
//!
//! ## Example
//!
//! ```rust,no_run
//! use engine::{Config, Engine};
//!
//! # fn main() -> Result<(), engine::KvsError> {
//! let engine = Engine::open(Config::new("./my-db"))?;
//! engine.write(b"key", b"value")?;
//! assert_eq!(engine.read(b"key")?, b"value");
//! engine.delete(b"key")?;
//! engine.close()?;
//! # Ok(())
//! # }
//! ```

mod compaction;
pub mod config;
pub mod error;
mod read;
mod recovery;
mod write;

use compaction::CompactorHandle;
use index::Index;
use rwlock::ReaderWriterLock;
use segment::SegmentSet;
use std::path::Path;
use std::sync::Arc;

pub use config::Config;
pub use error::{KvsError, Result};

/// Largest key or value the record format can carry (31-bit size fields).
pub const MAX_FIELD_LEN: usize = i32::MAX as usize;

/// The mutable state guarded by the engine lock.
pub(crate) struct State {
    pub(crate) index: Index,
    pub(crate) segments: SegmentSet,
    /// Bytes appended to the current head since it became head. Reset to 0 on
    /// rollover and on open; deliberately not primed from the file's existing
    /// length on reopen.
    pub(crate) head_size: u64,
}

/// Everything shared between the engine handle and the compaction worker.
pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) state: ReaderWriterLock<State>,
}

/// The Firkin storage engine.
///
/// # Write Path
///
/// 1. Take the exclusive lock.
/// 2. Point the index at the head segment's end-of-file.
/// 3. Append the encoded record to the head.
/// 4. Roll the head over once the tracked head size crosses the threshold.
///
/// # Read Path
///
/// 1. Take the shared lock.
/// 2. Look the key up in the index; miss means [`KvsError::EntryNotFound`].
/// 3. Positionally decode just the value from the owning segment.
///
/// # Recovery
///
/// On [`Engine::open`] every segment is scanned oldest-first and replayed
/// into a fresh index; tombstones remove keys. The most-recently-modified
/// segment becomes the head, and the compaction worker is started.
pub struct Engine {
    inner: Arc<Inner>,
    compactor: Option<CompactorHandle>,
}

impl Engine {
    /// Opens (or creates) the database described by `config`, rebuilding the
    /// in-memory index from the segment files and starting the compaction
    /// worker.
    pub fn open(config: Config) -> Result<Engine> {
        let segments = SegmentSet::open(&config.db_path)?;
        let mut index = Index::new();
        recovery::rebuild_index(&segments, &mut index)?;

        let inner = Arc::new(Inner {
            config,
            state: ReaderWriterLock::new(State {
                index,
                segments,
                head_size: 0,
            }),
        });

        let compactor = CompactorHandle::spawn(Arc::clone(&inner))?;
        Ok(Engine {
            inner,
            compactor: Some(compactor),
        })
    }

    /// Stops the compaction worker and closes the database. Segment handles
    /// are released when the engine is dropped; in-flight operations finish
    /// first because they hold the lock.
    pub fn close(mut self) -> Result<()> {
        self.stop_compactor();
        Ok(())
    }

    /// Number of live keys currently in the index.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.inner.state.read().index.len()
    }

    /// Number of registered segment files, including the head.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.inner.state.read().segments.len()
    }

    /// The database directory.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.inner.config.db_path
    }

    fn stop_compactor(&mut self) {
        if let Some(mut compactor) = self.compactor.take() {
            compactor.stop();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Engine")
            .field("db_path", &self.inner.config.db_path)
            .field(
                "log_file_size_threshold",
                &self.inner.config.log_file_size_threshold,
            )
            .field("compaction_interval", &self.inner.config.compaction_interval)
            .field("keys", &state.index.len())
            .field("segments", &state.segments.len())
            .field("head_segment", &state.segments.head_id())
            .field("head_size", &state.head_size)
            .finish()
    }
}

/// Best-effort shutdown on drop: the compaction worker is signalled and
/// joined so no pass runs against a database the caller believes closed.
impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_compactor();
    }
}

#[cfg(test)]
mod tests;
