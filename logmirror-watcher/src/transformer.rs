//! Incremental transformation of a single source file.
//!
//! The transformer never re-reads work it has already mirrored: it
//! skips forward past the lines recorded in the metadata store,
//! transforms only the unseen tail, and appends the result to the
//! mirror file. Output files are append-only once created; prior
//! output is never rewritten.

use logmirror_core::{transform_line, MetadataStore, ProcessError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Processes the unseen tail of `source`, mirroring it into
/// `output_dir`, and returns the new total line count for the file.
///
/// On success the store record for `source` is advanced to the new
/// total, paired with the source's modification time re-read after
/// processing (the file may have changed again mid-pass; re-reading
/// makes sure the next scan notices).
///
/// On any error the store is left untouched so the whole increment is
/// retried next cycle. A failure partway through writing may leave a
/// partial tail in the mirror file; it is not rolled back, so the
/// retry can duplicate those lines (at-least-once delivery).
pub fn process(source: &Path, output_dir: &Path, store: &mut MetadataStore) -> Result<u64> {
    let resume_from = store.lines_processed(source);

    let file = File::open(source).map_err(|e| ProcessError::io(source, e))?;
    let mut lines = BufReader::new(file).lines();

    // Discard exactly the lines mirrored in earlier passes. Running
    // out early means the file shrank underneath us.
    for skipped in 0..resume_from {
        match lines.next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(ProcessError::io(source, e)),
            None => {
                return Err(ProcessError::TruncatedSource {
                    path: source.to_path_buf(),
                    resume_from,
                    available: skipped,
                })
            }
        }
    }

    let file_name = source
        .file_name()
        .ok_or_else(|| ProcessError::UnnameableSource(source.to_path_buf()))?;
    let destination = output_dir.join(file_name);

    let out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&destination)
        .map_err(|e| ProcessError::io(&destination, e))?;
    let mut writer = BufWriter::new(out);

    let mut transformed = 0u64;
    for line in lines {
        let line = line.map_err(|e| ProcessError::io(source, e))?;
        writeln!(writer, "{}", transform_line(&line))
            .map_err(|e| ProcessError::io(&destination, e))?;
        transformed += 1;
    }
    writer.flush().map_err(|e| ProcessError::io(&destination, e))?;

    let new_total = resume_from + transformed;
    let modified = std::fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| ProcessError::io(source, e))?;
    store.advance(source, modified, new_total);

    debug!(
        "mirrored {} line(s) of {} (total {})",
        transformed,
        source.display(),
        new_total
    );
    Ok(new_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn output_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_fresh_file_is_processed_from_line_zero() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let source = dir.path().join("app.log");
        fs::write(&source, "alpha\nbeta\n").unwrap();

        let mut store = MetadataStore::new();
        let total = process(&source, out.path(), &mut store).unwrap();

        assert_eq!(total, 2);
        assert_eq!(store.lines_processed(&source), 2);

        let lines = output_lines(&out.path().join("app.log"));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alpha: Transformed at "));
        assert!(lines[1].starts_with("beta: Transformed at "));
    }

    #[test]
    fn test_only_the_appended_tail_is_processed() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let source = dir.path().join("app.log");
        fs::write(&source, "alpha\nbeta\n").unwrap();

        let mut store = MetadataStore::new();
        process(&source, out.path(), &mut store).unwrap();

        let mut handle = OpenOptions::new().append(true).open(&source).unwrap();
        writeln!(handle, "gamma").unwrap();
        writeln!(handle, "delta").unwrap();
        drop(handle);

        let total = process(&source, out.path(), &mut store).unwrap();
        assert_eq!(total, 4);
        assert_eq!(store.lines_processed(&source), 4);

        // The first two lines were mirrored exactly once.
        let lines = output_lines(&out.path().join("app.log"));
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("gamma: Transformed at "));
        assert!(lines[3].starts_with("delta: Transformed at "));
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.starts_with("alpha: Transformed at "))
                .count(),
            1
        );
    }

    #[test]
    fn test_truncated_source_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let source = dir.path().join("app.log");
        fs::write(&source, "alpha\nbeta\ngamma\n").unwrap();

        let mut store = MetadataStore::new();
        process(&source, out.path(), &mut store).unwrap();

        // Simulate external truncation: fewer lines than the offset.
        fs::write(&source, "alpha\n").unwrap();

        let stored_before = store.get(&source).unwrap().clone();
        let err = process(&source, out.path(), &mut store).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::TruncatedSource {
                resume_from: 3,
                available: 1,
                ..
            }
        ));

        let stored_after = store.get(&source).unwrap();
        assert_eq!(stored_after.lines_processed, stored_before.lines_processed);
        assert_eq!(stored_after.modified, stored_before.modified);

        // No extra output was emitted either.
        assert_eq!(output_lines(&out.path().join("app.log")).len(), 3);
    }

    #[test]
    fn test_missing_source_is_an_io_error() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();

        let mut store = MetadataStore::new();
        let err = process(&dir.path().join("gone.log"), out.path(), &mut store).unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_output_is_appended_never_overwritten() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let source = dir.path().join("app.log");
        fs::write(&source, "alpha\n").unwrap();

        // Pre-existing mirror content from an earlier run.
        let mirror = out.path().join("app.log");
        fs::write(&mirror, "earlier run\n").unwrap();

        let mut store = MetadataStore::new();
        process(&source, out.path(), &mut store).unwrap();

        let lines = output_lines(&mirror);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "earlier run");
        assert!(lines[1].starts_with("alpha: Transformed at "));
    }
}
