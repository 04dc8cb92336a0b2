//! Daemon configuration.
//!
//! Settings come from command-line flags backed by the environment
//! variables the deployment has always used (the clap layer in the CLI
//! wires flag → env var → default). This module owns the names, the
//! defaults, and the validation that runs once at startup.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the watched log directory.
pub const ENV_LOGS_DIR: &str = "PATH_TO_LOGS_DIRECTORY";
/// Environment variable naming the transformed-output directory.
pub const ENV_OUTPUT_DIR: &str = "PATH_TO_TRANSFORMED_LOGS_DIRECTORY";
/// Environment variable for the pause between directory scans.
pub const ENV_SCAN_INTERVAL_MS: &str = "TIME_BETWEEN_LOGS_DIRECTORY_SCANS_MILLIS";
/// Environment variable naming the heartbeat file.
pub const ENV_HEARTBEAT_FILE: &str = "PATH_TO_HEARTBEAT_FILE";
/// Environment variable for the pause between heartbeat checks.
pub const ENV_HEARTBEAT_INTERVAL_MS: &str = "TIME_BETWEEN_HEARTBEAT_CHECKS_MILLIS";
/// Environment variable naming the optional persisted-state file.
pub const ENV_STATE_FILE: &str = "LOGMIRROR_STATE_FILE";

pub const DEFAULT_LOGS_DIR: &str = "/tmp/logs";
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/transformed";
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_HEARTBEAT_FILE: &str = "/tmp/heartbeat";
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// Validated daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned each cycle for source log files.
    pub logs_dir: PathBuf,

    /// Directory the transformed mirror files are appended into.
    pub output_dir: PathBuf,

    /// Pause between scan cycles.
    pub scan_interval: Duration,

    /// File whose modification time the liveness monitor polls.
    pub heartbeat_file: PathBuf,

    /// Pause between heartbeat polls.
    pub heartbeat_interval: Duration,

    /// Optional JSON snapshot of the metadata store. When set, the
    /// store survives restarts and processing resumes instead of
    /// re-emitting everything.
    pub state_file: Option<PathBuf>,
}

impl Config {
    /// Checks every setting against its validation rule.
    ///
    /// Called once at startup; any error here is fatal before the
    /// loops start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.logs_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                setting: ENV_LOGS_DIR,
                path: self.logs_dir.clone(),
            });
        }
        if !self.output_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                setting: ENV_OUTPUT_DIR,
                path: self.output_dir.clone(),
            });
        }
        if !self.heartbeat_file.is_file() {
            return Err(ConfigError::NotAFile {
                setting: ENV_HEARTBEAT_FILE,
                path: self.heartbeat_file.clone(),
            });
        }
        if self.scan_interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                setting: ENV_SCAN_INTERVAL_MS,
            });
        }
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                setting: ENV_HEARTBEAT_INTERVAL_MS,
            });
        }
        if let Some(state_file) = &self.state_file {
            // The file itself may not exist yet; its directory must.
            let parent_exists = state_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.is_dir())
                .unwrap_or(true);
            if !parent_exists {
                return Err(ConfigError::MissingStateParent {
                    path: state_file.clone(),
                });
            }
        }
        Ok(())
    }
}
