//! Logmirror Monitor - heartbeat liveness monitoring
//!
//! An external producer is expected to refresh the modification time
//! of a heartbeat file. This crate polls that file on its own
//! schedule, independent of the transform loop, and decides when the
//! whole process should stop:
//!
//! - the modification time fails to advance for a threshold number of
//!   consecutive polls → controlled shutdown (exit code 0);
//! - any I/O failure reading the heartbeat file → fault (exit code 1).
//!
//! The judgement itself lives in [`HeartbeatProbe`], a pure state
//! machine with no clocks or files in it, so it can be tested without
//! touching the filesystem. [`HeartbeatMonitor::run`] wraps it in the
//! polling loop and resolves with a [`MonitorExit`] the main loop
//! observes at its next iteration boundary.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// Consecutive stale polls tolerated before the monitor gives up.
pub const STALE_POLL_THRESHOLD: u32 = 3;

/// Why the monitor stopped.
#[derive(Error, Debug)]
pub enum MonitorExit {
    /// The heartbeat went stale for the threshold number of
    /// consecutive polls. This is a controlled shutdown, not a crash.
    #[error("heartbeat stale: reached the threshold for consecutive stale polls")]
    StaleThreshold,

    /// Reading the heartbeat file's attributes failed. The monitor is
    /// deliberately fail-fast here and does not retry.
    #[error("heartbeat i/o failure: {0}")]
    Fault(#[from] std::io::Error),
}

impl MonitorExit {
    /// Process exit code this outcome maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorExit::StaleThreshold => 0,
            MonitorExit::Fault(_) => 1,
        }
    }
}

/// Observable health of the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    /// No reading taken yet.
    AwaitingBaseline,

    /// The latest poll saw the modification time advance (or recorded
    /// the baseline).
    Healthy,

    /// 1..threshold-1 consecutive polls without advancement.
    Degraded(u32),

    /// The threshold was reached. Fatal.
    Terminated,
}

/// The staleness state machine, separated from clocks and files.
///
/// Feed it one modification-time reading per poll and it answers with
/// the resulting [`HeartbeatState`]. The first reading only records a
/// baseline; no judgement is made from it.
#[derive(Debug)]
pub struct HeartbeatProbe {
    previous: Option<SystemTime>,
    consecutive_stale: u32,
    threshold: u32,
}

impl Default for HeartbeatProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatProbe {
    /// Creates a probe with the standard threshold.
    pub fn new() -> Self {
        Self::with_threshold(STALE_POLL_THRESHOLD)
    }

    /// Creates a probe with a custom threshold (mostly for tests).
    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            previous: None,
            consecutive_stale: 0,
            threshold,
        }
    }

    /// Records one poll of the heartbeat file's modification time.
    ///
    /// Advancement means strictly greater than the previous reading;
    /// an equal or earlier timestamp is a stale poll. The stale
    /// counter resets the moment advancement is observed.
    pub fn observe(&mut self, modified: SystemTime) -> HeartbeatState {
        let Some(previous) = self.previous else {
            self.previous = Some(modified);
            return HeartbeatState::Healthy;
        };
        if modified > previous {
            self.previous = Some(modified);
            self.consecutive_stale = 0;
            HeartbeatState::Healthy
        } else {
            self.consecutive_stale += 1;
            if self.consecutive_stale >= self.threshold {
                HeartbeatState::Terminated
            } else {
                HeartbeatState::Degraded(self.consecutive_stale)
            }
        }
    }

    /// State as of the last observation, without taking a reading.
    pub fn state(&self) -> HeartbeatState {
        match (self.previous, self.consecutive_stale) {
            (None, _) => HeartbeatState::AwaitingBaseline,
            (Some(_), 0) => HeartbeatState::Healthy,
            (Some(_), n) if n >= self.threshold => HeartbeatState::Terminated,
            (Some(_), n) => HeartbeatState::Degraded(n),
        }
    }
}

/// Polls a heartbeat file until it has a reason to stop the process.
pub struct HeartbeatMonitor {
    path: PathBuf,
    interval: Duration,
    probe: HeartbeatProbe,
}

impl HeartbeatMonitor {
    /// Creates a monitor over `path`, polling every `interval`.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            probe: HeartbeatProbe::new(),
        }
    }

    /// Runs the polling loop to completion.
    ///
    /// Resolves only when the process should end; the caller decides
    /// how (typically by exiting with [`MonitorExit::exit_code`]).
    pub async fn run(mut self) -> MonitorExit {
        debug!(
            "monitoring heartbeat {} every {:?}",
            self.path.display(),
            self.interval
        );
        let mut ticker = tokio::time::interval(self.interval);
        // Catch-up ticks after a stall must not poll back-to-back:
        // "consecutive stale polls" only means anything when the polls
        // stay one interval apart.
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    error!("cannot read heartbeat {}: {}", self.path.display(), e);
                    return MonitorExit::Fault(e);
                }
            };
            match self.probe.observe(modified) {
                HeartbeatState::Healthy => trace!("heartbeat healthy"),
                HeartbeatState::Degraded(stale) => warn!(
                    "heartbeat stale ({}/{} consecutive polls)",
                    stale, self.probe.threshold
                ),
                HeartbeatState::Terminated => {
                    error!("heartbeat stale for {} consecutive polls, shutting down", self.probe.threshold);
                    return MonitorExit::StaleThreshold;
                }
                // observe() never reports AwaitingBaseline.
                HeartbeatState::AwaitingBaseline => unreachable!(),
            }
        }
    }
}
