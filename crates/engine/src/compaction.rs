//! Compaction: rewriting live records into fresh segments and reclaiming the
//! space held by stale and deleted data.
//!
//! A pass holds the exclusive lock from start to finish, so readers and
//! writers never observe a half-swapped segment set. For every key whose
//! entry points outside the current head, the record is copied verbatim
//! (timestamp included) into a chain of fresh compaction segments, each
//! capped near the configured threshold; the index is rewritten to the new
//! location as each record lands. Afterwards every registered non-head
//! segment is closed and unlinked, and the compaction segments are
//! registered.
//!
//! The worker is a dedicated OS thread ticking on a timer; a failed pass is
//! logged and retried from scratch on the next tick. Partial compaction
//! segments left behind by an aborted pass are ordinary segment files: the
//! next open scans them and tolerates a truncated tail.

use crate::{Engine, Inner, KvsError, Result};
use index::IndexEntry;
use record::Record;
use segment::{self, Segment};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

impl Engine {
    /// Runs one compaction pass immediately, regardless of the worker timer.
    ///
    /// A no-op when the database holds a single segment. Any I/O failure
    /// aborts the pass; the engine stays usable and the worker retries on its
    /// next tick.
    pub fn compact(&self) -> Result<()> {
        run_pass(&self.inner)
    }
}

/// Owns the worker thread; stopping sends the shutdown signal and joins.
pub(crate) struct CompactorHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl CompactorHandle {
    pub(crate) fn spawn(inner: Arc<Inner>) -> io::Result<CompactorHandle> {
        let interval = inner.config.compaction_interval;
        let (shutdown, ticks) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("firkin-compactor".into())
            .spawn(move || worker_loop(&inner, &ticks, interval))?;
        Ok(CompactorHandle {
            shutdown,
            thread: Some(thread),
        })
    }

    pub(crate) fn stop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(inner: &Inner, shutdown: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match shutdown.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if let Err(err) = run_pass(inner) {
                    error!(%err, "compaction pass failed");
                }
            }
        }
    }
}

fn run_pass(inner: &Inner) -> Result<()> {
    let mut state = inner.state.write();
    let state = &mut *state;

    if state.segments.len() <= 1 {
        return Ok(());
    }

    let head_id = state.segments.head_id();
    let threshold = inner.config.log_file_size_threshold;

    // Live records are copied into a chain of fresh segments; the last chain
    // element is the current compaction head, sealed once its write cursor
    // reaches the threshold.
    let mut chain: Vec<Segment> = Vec::new();
    let mut cursor: u64 = 0;

    for key in state.index.keys() {
        let Some(entry) = state.index.get(&key).copied() else {
            continue;
        };
        if entry.segment_id == head_id {
            // The head is live-serving; its records are not rewritten.
            continue;
        }

        if chain.is_empty() || cursor >= threshold {
            chain.push(Segment::create(state.segments.dir())?);
            cursor = 0;
        }

        let source = state
            .segments
            .get(entry.segment_id)
            .ok_or(KvsError::UnknownSegment(entry.segment_id))?;
        let (record, _) = Record::read_at(source.file(), entry.offset)?;

        let Some(destination) = chain.last_mut() else {
            continue; // a compaction head was just pushed
        };
        let offset = destination.append(&record.encode())?;
        let destination_id = destination.id();
        cursor += record.encoded_len() as u64;

        state.index.delete(&key);
        state.index.set(
            key,
            IndexEntry {
                segment_id: destination_id,
                offset,
                timestamp: record.metadata.timestamp,
            },
        );
    }

    retire_old_segments(state, head_id, &chain)?;

    for compacted in chain {
        state.segments.register(compacted);
    }

    debug!(
        segments = state.segments.len(),
        keys = state.index.len(),
        "compaction pass finished"
    );
    Ok(())
}

/// Closes and unlinks every registered non-head segment still present in the
/// directory. Files that are not registered (including the just-written
/// compaction segments) are left in place.
fn retire_old_segments(
    state: &mut crate::State,
    head_id: Uuid,
    sealed: &[Segment],
) -> Result<()> {
    let fresh: HashSet<Uuid> = sealed.iter().map(Segment::id).collect();

    let listing: Vec<PathBuf> = fs::read_dir(state.segments.dir())?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;

    for path in listing {
        let Some(id) = segment::parse_segment_id(&path) else {
            warn!(path = %path.display(), "skipping non-segment file during compaction");
            continue;
        };
        if id == head_id || fresh.contains(&id) {
            continue;
        }
        if state.segments.contains(id) {
            state.segments.remove(id)?;
        } else {
            warn!(segment = %id, "unregistered segment file left in place during compaction");
        }
    }

    Ok(())
}
