//! # Segment - Log Files and the Segment Set
//!
//! A Firkin database is a directory whose every file is one append-only log
//! segment. A segment's identity is its filename: a fresh v4 UUID minted when
//! the segment is created. Exactly one segment is the HEAD (the current
//! append target) while the database is open; all others are read-only.
//!
//! [`SegmentSet`] owns the directory: it opens every segment read/write on
//! startup, keeps all file handles alive for the lifetime of the engine,
//! tracks the HEAD, and performs rollover, registration of compaction output,
//! and removal of retired segments.
//!
//! HEAD selection on reopen is by most-recent modification time; the engine
//! records no manifest, so mtime is the only signal for which file was last
//! appended to. Files whose names do not parse as UUIDs are skipped with a
//! warning; the engine never creates such files itself.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use uuid::Uuid;

/// Extracts a segment identity from a directory entry, or `None` if the file
/// name is not a UUID.
pub fn parse_segment_id(path: &Path) -> Option<Uuid> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| Uuid::parse_str(name).ok())
}

/// One append-only log file. The handle stays open for the lifetime of the
/// segment; dropping the segment closes it.
#[derive(Debug)]
pub struct Segment {
    id: Uuid,
    path: PathBuf,
    file: File,
}

impl Segment {
    /// Creates a brand-new empty segment with a fresh identity inside `dir`.
    pub fn create(dir: &Path) -> io::Result<Segment> {
        let id = Uuid::new_v4();
        let path = dir.join(id.to_string());
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        Ok(Segment { id, path, file })
    }

    /// Opens an existing segment file read/write under its on-disk identity.
    pub fn open(id: Uuid, path: PathBuf) -> io::Result<Segment> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Segment { id, path, file })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying handle, for positional reads.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Current on-disk length: the logical end-of-file, which is also the
    /// offset the next append lands at.
    pub fn len(&self) -> io::Result<u64> {
        self.file.metadata().map(|m| m.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Last modification time, used for HEAD selection on reopen.
    pub fn modified(&self) -> io::Result<SystemTime> {
        self.file.metadata().and_then(|m| m.modified())
    }

    /// Appends `bytes` at the end of the file, returning the offset the write
    /// started at.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(bytes)?;
        Ok(offset)
    }
}

/// The set of segments belonging to one open database.
#[derive(Debug)]
pub struct SegmentSet {
    dir: PathBuf,
    segments: HashMap<Uuid, Segment>,
    head: Uuid,
}

impl SegmentSet {
    /// Opens the database directory, creating it if absent.
    ///
    /// Every UUID-named file is opened read/write and registered. If the
    /// directory held no segments a fresh one is created and becomes HEAD;
    /// otherwise the most-recently-modified existing segment does (ties break
    /// toward the larger identity so the choice is deterministic).
    pub fn open(dir: &Path) -> io::Result<SegmentSet> {
        match fs::create_dir(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }

        let mut segments = HashMap::new();
        let mut newest: Option<(SystemTime, Uuid)> = None;

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<_>>()?;
        entries.sort();

        for path in entries {
            let Some(id) = parse_segment_id(&path) else {
                warn!(path = %path.display(), "skipping non-segment file in database directory");
                continue;
            };
            let segment = Segment::open(id, path)?;
            let modified = segment.modified()?;
            if newest.map_or(true, |(ts, latest)| (modified, id) > (ts, latest)) {
                newest = Some((modified, id));
            }
            segments.insert(id, segment);
        }

        let head = match newest {
            Some((_, id)) => id,
            None => {
                let segment = Segment::create(dir)?;
                let id = segment.id();
                segments.insert(id, segment);
                id
            }
        };

        Ok(SegmentSet {
            dir: dir.to_path_buf(),
            segments,
            head,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Identity of the current HEAD segment.
    pub fn head_id(&self) -> Uuid {
        self.head
    }

    pub fn head(&self) -> Option<&Segment> {
        self.segments.get(&self.head)
    }

    pub fn head_mut(&mut self) -> Option<&mut Segment> {
        self.segments.get_mut(&self.head)
    }

    pub fn get(&self, id: Uuid) -> Option<&Segment> {
        self.segments.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.segments.contains_key(&id)
    }

    /// Number of registered segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Identities of all registered segments, in unspecified order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.segments.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Creates a fresh segment and makes it the new HEAD. The previous head
    /// stays registered with its handle open, but no longer receives appends.
    pub fn rollover(&mut self) -> io::Result<Uuid> {
        let segment = Segment::create(&self.dir)?;
        let id = segment.id();
        self.segments.insert(id, segment);
        self.head = id;
        Ok(id)
    }

    /// Adds a pre-created segment (compaction output) to the set.
    pub fn register(&mut self, segment: Segment) {
        self.segments.insert(segment.id(), segment);
    }

    /// Closes and unlinks a non-head segment.
    pub fn remove(&mut self, id: Uuid) -> io::Result<()> {
        if id == self.head {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to remove the head segment",
            ));
        }
        let Some(segment) = self.segments.remove(&id) else {
            return Ok(());
        };
        let path = segment.path().to_path_buf();
        drop(segment);
        fs::remove_file(path)
    }
}
