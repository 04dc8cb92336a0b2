//! The scan cycle.
//!
//! One call to [`run_cycle`] is one full pass: scan the watched
//! directory, process every selected file strictly in sequence, drop
//! store records for files that vanished, and (when configured)
//! snapshot the store to disk.

use crate::{scanner, transformer};
use logmirror_core::{Config, MetadataStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// What one scan cycle did.
pub struct CycleReport {
    /// Files the scanner selected for processing.
    pub files_selected: usize,

    /// Files processed to completion.
    pub files_processed: usize,

    /// Transformed lines appended to mirror files this cycle.
    pub lines_emitted: u64,

    /// Store records evicted for vanished files.
    pub records_evicted: usize,

    /// Time taken in milliseconds.
    pub duration_ms: u64,

    /// Files that failed this cycle; they keep their stored state and
    /// are retried next cycle.
    pub errors: Vec<(String, String)>,
}

/// Runs one scan cycle against `config.logs_dir`.
///
/// Per-file failures are collected, not propagated: a bad file never
/// takes the cycle down, it just stays eligible for the next one.
pub fn run_cycle(config: &Config, store: &mut MetadataStore) -> CycleReport {
    let start = Instant::now();
    let work = scanner::scan(&config.logs_dir, store);
    let files_selected = work.len();

    let mut files_processed = 0;
    let mut lines_emitted = 0u64;
    let mut errors = Vec::new();

    for path in &work {
        let before = store.lines_processed(path);
        match transformer::process(path, &config.output_dir, store) {
            Ok(total) => {
                files_processed += 1;
                lines_emitted += total - before;
            }
            Err(e) => {
                warn!("failed to process {}: {}", path.display(), e);
                errors.push((path.display().to_string(), e.to_string()));
            }
        }
    }

    // Reconciliation: forget files that are no longer in the
    // directory. Re-listing here rather than reusing the scan keeps
    // eviction honest about files that vanished mid-cycle.
    let records_evicted = match list_files(&config.logs_dir) {
        Some(present) => store.retain_present(&present),
        None => 0,
    };

    if let Some(state_file) = &config.state_file {
        if files_processed > 0 || records_evicted > 0 {
            if let Err(e) = store.save(state_file) {
                warn!("failed to snapshot state to {}: {}", state_file.display(), e);
            }
        }
    }

    let duration = start.elapsed();
    if files_selected > 0 {
        info!(
            "cycle: {}/{} file(s) processed, {} line(s) emitted in {:?}",
            files_processed, files_selected, lines_emitted, duration
        );
    }

    CycleReport {
        files_selected,
        files_processed,
        lines_emitted,
        records_evicted,
        duration_ms: duration.as_millis() as u64,
        errors,
    }
}

/// Lists the regular files currently in `dir`, or None when the
/// directory cannot be enumerated (reconciliation is skipped for the
/// cycle rather than evicting everything on a transient error).
fn list_files(dir: &Path) -> Option<HashSet<PathBuf>> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut present = HashSet::new();
    for entry in entries.flatten() {
        if entry.metadata().map(|m| m.is_file()).unwrap_or(false) {
            present.insert(entry.path());
        }
    }
    Some(present)
}
