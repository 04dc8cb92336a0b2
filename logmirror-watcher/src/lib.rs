//! Logmirror Watcher - directory scanning and incremental transformation
//!
//! This crate handles the file system side of things:
//! - Scanning the watched directory for new or changed log files
//! - Resuming each file at its last processed line
//! - Appending transformed lines to the mirrored output files
//!
//! One call to [`run_cycle`] is one full scan cycle.

mod pipeline;
mod scanner;
mod transformer;

pub use pipeline::{run_cycle, CycleReport};
pub use scanner::scan;
pub use transformer::process;
