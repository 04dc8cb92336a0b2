//! Directory scanning.
//!
//! Each cycle lists the watched directory once and decides, per file,
//! whether the transformer needs to look at it.

use logmirror_core::MetadataStore;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Scans `dir` and returns the files that need processing this cycle.
///
/// A file is selected when it has never been seen before, or when its
/// modification time is strictly greater than the one stored at its
/// last successful pass. Equal timestamps mean "no observed change"
/// and the file is skipped; writes landing within one timestamp tick
/// are picked up on the write after that.
///
/// The returned order is directory-iteration order and is not stable
/// across runs; callers must not depend on it.
///
/// If the directory itself cannot be enumerated the cycle degrades to
/// an empty work list (logged) and the next cycle retries; per-entry
/// failures skip just that entry.
pub fn scan(dir: &Path, store: &MetadataStore) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot scan {}: {} (no work this cycle)", dir.display(), e);
            return Vec::new();
        }
    };

    let mut work = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("skipping {}: cannot read metadata: {}", path.display(), e);
                continue;
            }
        };

        // Scanning is defined over regular files only.
        if !metadata.is_file() {
            continue;
        }

        match store.get(&path) {
            None => {
                debug!("new file: {}", path.display());
                work.push(path);
            }
            Some(record) => {
                let modified = match metadata.modified() {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!(
                            "skipping {}: cannot read modification time: {}",
                            path.display(),
                            e
                        );
                        continue;
                    }
                };
                if modified > record.modified {
                    debug!("changed file: {}", path.display());
                    work.push(path);
                } else {
                    trace!("unchanged: {}", path.display());
                }
            }
        }
    }
    work
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_new_file_is_selected() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        fs::write(&log, "one\n").unwrap();

        let store = MetadataStore::new();
        let work = scan(dir.path(), &store);
        assert_eq!(work, vec![log]);
    }

    #[test]
    fn test_unchanged_file_is_skipped() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        fs::write(&log, "one\n").unwrap();

        let mut store = MetadataStore::new();
        store.advance(&log, mtime(&log), 1);

        assert!(scan(dir.path(), &store).is_empty());
    }

    #[test]
    fn test_changed_file_is_selected() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        fs::write(&log, "one\n").unwrap();

        // Stored timestamp predates the file's current one.
        let mut store = MetadataStore::new();
        store.advance(&log, SystemTime::UNIX_EPOCH, 1);

        assert_eq!(scan(dir.path(), &store), vec![log]);
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let store = MetadataStore::new();
        assert!(scan(dir.path(), &store).is_empty());
    }

    #[test]
    fn test_missing_directory_yields_no_work() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");

        let store = MetadataStore::new();
        assert!(scan(&missing, &store).is_empty());
    }
}
