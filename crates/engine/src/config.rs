//! Configuration for opening a Firkin database.

use std::path::PathBuf;
use std::time::Duration;

/// Default head-segment rollover threshold in bytes.
pub const DEFAULT_LOG_FILE_SIZE_THRESHOLD: u64 = 5_000;

/// Default sleep between compaction worker passes.
pub const DEFAULT_COMPACTION_INTERVAL: Duration = Duration::from_millis(10_000);

/// Options accepted by [`Engine::open`](crate::Engine::open).
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the database lives in. Created if absent.
    pub db_path: PathBuf,

    /// Once the head segment grows to this many bytes (checked after each
    /// append), it is rotated out and a fresh head is created.
    /// Default: 5000.
    pub log_file_size_threshold: u64,

    /// How long the compaction worker sleeps between passes.
    /// Default: 10 seconds.
    pub compaction_interval: Duration,
}

impl Config {
    /// Options with defaults for the database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_file_size_threshold: DEFAULT_LOG_FILE_SIZE_THRESHOLD,
            compaction_interval: DEFAULT_COMPACTION_INTERVAL,
        }
    }

    /// Sets the head-segment rollover threshold.
    pub fn log_file_size_threshold(mut self, bytes: u64) -> Self {
        self.log_file_size_threshold = bytes;
        self
    }

    /// Sets the compaction worker sleep time.
    pub fn compaction_interval(mut self, interval: Duration) -> Self {
        self.compaction_interval = interval;
        self
    }
}
