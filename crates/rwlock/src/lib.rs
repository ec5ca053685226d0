//! # ReaderWriterLock
//!
//! A classic many-reader/single-writer lock with RAII guards, used to
//! serialize every public operation of the Firkin engine against the
//! compaction worker.
//!
//! The lock is **readers-preferring**: a reader only waits while a writer
//! actually holds the lock, never for writers that are merely queued, so a
//! continuous stream of readers can delay a writer indefinitely. That bias is
//! part of the engine's contract and acceptable for its read-heavy workloads;
//! swap in a fair primitive if writer starvation ever matters.
//!
//! ## Example
//!
//! ```rust
//! use rwlock::ReaderWriterLock;
//!
//! let lock = ReaderWriterLock::new(0u32);
//! *lock.write() += 1;
//! assert_eq!(*lock.read(), 1);
//! ```

use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Default)]
struct LockState {
    readers: usize,
    writer: bool,
}

/// A readers-preferring reader/writer lock owning the protected value.
pub struct ReaderWriterLock<T> {
    state: Mutex<LockState>,
    released: Condvar,
    data: UnsafeCell<T>,
}

// Same bounds as the standard library's RwLock: the guards hand out &T to
// concurrent readers, so T must be Sync for the lock to be shared.
unsafe impl<T: Send> Send for ReaderWriterLock<T> {}
unsafe impl<T: Send + Sync> Sync for ReaderWriterLock<T> {}

impl<T> ReaderWriterLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires shared access. Blocks while a writer holds the lock; any
    /// number of readers proceed in parallel.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock();
        while state.writer {
            self.released.wait(&mut state);
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    /// Acquires exclusive access. Blocks until every reader has released and
    /// no other writer holds the lock.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock();
        while state.writer || state.readers > 0 {
            self.released.wait(&mut state);
        }
        state.writer = true;
        WriteGuard { lock: self }
    }

    /// Consumes the lock, returning the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReaderWriterLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ReaderWriterLock")
            .field("readers", &state.readers)
            .field("writer", &state.writer)
            .finish()
    }
}

/// Shared access to the value inside a [`ReaderWriterLock`].
pub struct ReadGuard<'a, T> {
    lock: &'a ReaderWriterLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Holding a ReadGuard guarantees no writer is active.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.readers -= 1;
        if state.readers == 0 {
            self.lock.released.notify_all();
        }
    }
}

/// Exclusive access to the value inside a [`ReaderWriterLock`].
pub struct WriteGuard<'a, T> {
    lock: &'a ReaderWriterLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Holding a WriteGuard guarantees exclusive access.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.writer = false;
        self.lock.released.notify_all();
    }
}
