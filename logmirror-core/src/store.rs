//! File-metadata store.
//!
//! Tracks, per source file, the modification time observed at the last
//! successful pass and the number of lines already mirrored. This is
//! what makes processing incremental: the scanner consults it to skip
//! unchanged files and the transformer consults it to resume mid-file.
//!
//! The store is a plain struct owned by the scan/transform loop and
//! passed around by reference; nothing else ever touches it, so there
//! is no locking. By default it lives only in memory (a restart
//! reprocesses everything), but it can optionally be snapshotted to a
//! JSON file between cycles.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Everything we remember about one tracked source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Stable identity, also the map key.
    pub path: PathBuf,

    /// Modification time observed at the last successful pass.
    pub modified: SystemTime,

    /// Lines already transformed and appended to the mirror file.
    /// Doubles as the resume offset for the next pass.
    pub lines_processed: u64,
}

/// In-memory map from source-file identity to its [`FileRecord`].
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: HashMap<PathBuf, FileRecord>,
}

impl MetadataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the record for a file, if we've seen it before.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Resume offset for a file: its stored line count, or 0 if unseen.
    pub fn lines_processed(&self, path: &Path) -> u64 {
        self.records.get(path).map_or(0, |r| r.lines_processed)
    }

    /// Records a completed pass over `path`.
    ///
    /// `lines_processed` is the new total, not a delta. The count is
    /// monotonically non-decreasing for a given file: an attempt to
    /// move it backwards is a caller bug and is ignored with a warning
    /// rather than corrupting the resume offset.
    pub fn advance(&mut self, path: &Path, modified: SystemTime, lines_processed: u64) {
        if let Some(existing) = self.records.get(path) {
            if lines_processed < existing.lines_processed {
                warn!(
                    "refusing to move {} backwards from {} to {} lines",
                    path.display(),
                    existing.lines_processed,
                    lines_processed
                );
                return;
            }
        }
        self.records.insert(
            path.to_path_buf(),
            FileRecord {
                path: path.to_path_buf(),
                modified,
                lines_processed,
            },
        );
    }

    /// Drops records for files no longer present in the watched
    /// directory, returning how many were evicted.
    ///
    /// Without this the store would grow forever as files come and go.
    pub fn retain_present(&mut self, present: &HashSet<PathBuf>) -> usize {
        let before = self.records.len();
        self.records.retain(|path, _| present.contains(path));
        let dropped = before - self.records.len();
        if dropped > 0 {
            debug!("evicted {} record(s) for vanished files", dropped);
        }
        dropped
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over all records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Loads a snapshot written by [`MetadataStore::save`].
    ///
    /// A missing snapshot file is not an error: it just means a fresh
    /// start, and an empty store is returned.
    pub fn load(path: &Path) -> io::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e),
        };
        let records: Vec<FileRecord> = serde_json::from_str(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let records = records.into_iter().map(|r| (r.path.clone(), r)).collect();
        Ok(Self { records })
    }

    /// Writes the store to `path` as a JSON snapshot.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut records: Vec<&FileRecord> = self.records.values().collect();
        // Stable order keeps successive snapshots diffable.
        records.sort_by(|a, b| a.path.cmp(&b.path));
        let raw = serde_json::to_string_pretty(&records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_unseen_file_resumes_at_zero() {
        let store = MetadataStore::new();
        assert_eq!(store.lines_processed(Path::new("never-seen.log")), 0);
        assert!(store.get(Path::new("never-seen.log")).is_none());
    }

    #[test]
    fn test_advance_updates_record() {
        let mut store = MetadataStore::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        store.advance(Path::new("a.log"), t0, 5);

        let record = store.get(Path::new("a.log")).unwrap();
        assert_eq!(record.lines_processed, 5);
        assert_eq!(record.modified, t0);

        let t1 = t0 + Duration::from_secs(10);
        store.advance(Path::new("a.log"), t1, 9);
        assert_eq!(store.lines_processed(Path::new("a.log")), 9);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut store = MetadataStore::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        store.advance(Path::new("a.log"), t0, 9);
        store.advance(Path::new("a.log"), t0 + Duration::from_secs(1), 3);
        // The bogus regression is dropped wholesale.
        let record = store.get(Path::new("a.log")).unwrap();
        assert_eq!(record.lines_processed, 9);
        assert_eq!(record.modified, t0);
    }

    #[test]
    fn test_retain_present_evicts_vanished_files() {
        let mut store = MetadataStore::new();
        let now = SystemTime::now();
        store.advance(Path::new("keep.log"), now, 1);
        store.advance(Path::new("gone.log"), now, 2);

        let present: HashSet<PathBuf> = [PathBuf::from("keep.log")].into_iter().collect();
        assert_eq!(store.retain_present(&present), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(Path::new("gone.log")).is_none());
        assert!(store.get(Path::new("keep.log")).is_some());
    }

    #[test]
    fn test_snapshot_survives_save_and_load() {
        let dir = tempdir().unwrap();
        let snapshot = dir.path().join("state.json");

        let mut store = MetadataStore::new();
        let now = SystemTime::now();
        store.advance(Path::new("/tmp/logs/a.log"), now, 12);
        store.advance(Path::new("/tmp/logs/b.log"), now, 3);
        store.save(&snapshot).unwrap();

        let restored = MetadataStore::load(&snapshot).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.lines_processed(Path::new("/tmp/logs/a.log")), 12);
        assert_eq!(restored.lines_processed(Path::new("/tmp/logs/b.log")), 3);
    }

    #[test]
    fn test_missing_snapshot_is_a_fresh_start() {
        let dir = tempdir().unwrap();
        let store = MetadataStore::load(&dir.path().join("nope.json")).unwrap();
        assert!(store.is_empty());
    }
}
