//! Error types for the mirroring pipeline.
//!
//! Split by blast radius: a [`ProcessError`] costs one file one scan
//! cycle and is retried, a [`ConfigError`] stops the daemon before
//! any loop starts. Both carry the offending path or setting so the
//! operator can tell which one to fix.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for per-file processing functions.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Things that can go wrong while processing a single source file.
///
/// None of these are fatal to the daemon: the file is skipped for the
/// current cycle and retried on the next one.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Couldn't read the source file or write the mirrored output.
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file has fewer lines than we already processed.
    /// Something truncated or replaced it underneath us; we stop here
    /// and leave the stored offset untouched rather than guess.
    #[error("source '{path}' truncated: resume offset {resume_from} but only {available} lines present")]
    TruncatedSource {
        path: PathBuf,
        resume_from: u64,
        available: u64,
    },

    /// The source path has no final component to mirror into the
    /// output directory.
    #[error("cannot derive an output name for '{0}'")]
    UnnameableSource(PathBuf),
}

impl ProcessError {
    /// Creates an I/O error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration problems detected at startup, before any loop runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A path setting that must point at an existing directory doesn't.
    #[error("invalid configuration: {setting} ('{path}') doesn't point to a directory")]
    NotADirectory { setting: &'static str, path: PathBuf },

    /// A path setting that must point at an existing regular file doesn't.
    #[error("invalid configuration: {setting} ('{path}') doesn't point to a file")]
    NotAFile { setting: &'static str, path: PathBuf },

    /// An interval setting that must be a positive number of
    /// milliseconds is zero.
    #[error("invalid configuration: {setting} cannot be zero")]
    NonPositiveInterval { setting: &'static str },

    /// The state-file path points into a directory that doesn't exist.
    #[error("invalid configuration: parent directory of state file '{path}' doesn't exist")]
    MissingStateParent { path: PathBuf },
}
