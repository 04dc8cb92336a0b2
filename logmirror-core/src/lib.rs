//! Logmirror Core - shared building blocks for the log mirroring pipeline
//!
//! This crate provides the pieces the scanner, transformer and CLI are
//! built from: startup configuration with validation, the in-memory
//! file-metadata store that makes processing incremental, and the line
//! transformation itself.
//!
//! # Example
//!
//! ```
//! use logmirror_core::MetadataStore;
//! use std::path::Path;
//! use std::time::SystemTime;
//!
//! let mut store = MetadataStore::new();
//! store.advance(Path::new("app.log"), SystemTime::now(), 42);
//! assert_eq!(store.lines_processed(Path::new("app.log")), 42);
//! ```

pub mod config;
pub mod error;
pub mod store;
pub mod transform;

pub use config::Config;
pub use error::{ConfigError, ProcessError, Result};
pub use store::{FileRecord, MetadataStore};
pub use transform::transform_line;
