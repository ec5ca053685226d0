use crate::Config;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A config whose compaction worker stays quiet for the duration of a test,
/// so passes only run when the test calls `compact()` itself.
pub fn quiet_config(db_path: &Path) -> Config {
    Config::new(db_path).compaction_interval(Duration::from_secs(3_600))
}

pub fn count_segment_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

pub fn total_bytes_on_disk(dir: &Path) -> u64 {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().metadata().unwrap().len())
        .sum()
}
