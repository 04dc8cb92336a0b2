//! CLI command implementations.

use chrono::Local;
use colored::Colorize;
use logmirror_core::{Config, MetadataStore};
use logmirror_monitor::HeartbeatMonitor;
use logmirror_watcher::run_cycle;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, trace};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Runs the mirroring daemon until the liveness monitor says stop.
///
/// Two independent periodic tasks: the scan/transform loop driven
/// here, and the heartbeat monitor spawned alongside it. They share
/// nothing; the monitor's join handle doubles as the shutdown channel,
/// observed at the top of every loop iteration. The returned value is
/// the process exit code (0 for a controlled heartbeat-threshold
/// shutdown, 1 for a heartbeat fault).
pub async fn run(config: Config) -> Result<i32> {
    config.validate()?;

    let mut store = match &config.state_file {
        Some(path) => {
            let store = MetadataStore::load(path)?;
            if !store.is_empty() {
                info!(
                    "resuming {} tracked file(s) from {}",
                    store.len(),
                    path.display()
                );
            }
            store
        }
        None => MetadataStore::new(),
    };

    println!(
        "{} Mirroring {} -> {} every {:?}",
        "✓".green(),
        config.logs_dir.display().to_string().cyan(),
        config.output_dir.display().to_string().cyan(),
        config.scan_interval
    );

    let monitor = HeartbeatMonitor::new(&config.heartbeat_file, config.heartbeat_interval);
    let mut monitor_task = tokio::spawn(monitor.run());

    let mut ticker = tokio::time::interval(config.scan_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            exit = &mut monitor_task => {
                let exit = exit?;
                eprintln!("{} {}", "shutdown:".yellow().bold(), exit);
                return Ok(exit.exit_code());
            }
            _ = ticker.tick() => {
                let report = run_cycle(&config, &mut store);
                if report.files_selected == 0 {
                    debug!("cycle: no work");
                }
            }
        }
    }
}

/// Produces synthetic log lines, one local timestamp per tick.
///
/// Lines go to stdout, to a file (appended), or both. With no sink
/// flags at all, stdout is used. A `count` bounds production;
/// otherwise it runs until killed.
pub async fn produce(
    count: Option<u64>,
    to_stdout: bool,
    file: Option<PathBuf>,
    interval: Duration,
) -> Result<()> {
    let mut sink = match &file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("cannot open log file '{}': {}", path.display(), e))?,
        ),
        None => None,
    };

    let mut ticker = tokio::time::interval(interval);
    let mut emitted = 0u64;
    loop {
        if let Some(count) = count {
            if emitted >= count {
                break;
            }
        }
        ticker.tick().await;

        let line = Local::now().naive_local().to_string();
        if to_stdout || sink.is_none() {
            println!("{line}");
        }
        if let Some(handle) = sink.as_mut() {
            writeln!(handle, "{line}")?;
            handle.flush()?;
        }
        emitted += 1;
    }

    if let Some(path) = &file {
        println!(
            "{} Produced {} line(s) to {}",
            "✓".green(),
            emitted,
            path.display()
        );
    }
    Ok(())
}

/// Keeps the heartbeat file's modification time advancing.
///
/// The file's content is irrelevant to the monitor; rewriting it with
/// the current timestamp is just a portable way to refresh the
/// modification time. Runs until killed or until an I/O error, which
/// is reported and fatal.
pub async fn beat(path: PathBuf, interval: Duration) -> Result<()> {
    if !path.exists() {
        std::fs::File::create(&path)
            .map_err(|e| format!("cannot create heartbeat file '{}': {}", path.display(), e))?;
        info!("created heartbeat file {}", path.display());
    }

    println!(
        "{} Touching {} every {:?}",
        "✓".green(),
        path.display().to_string().cyan(),
        interval
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        std::fs::write(&path, Local::now().to_rfc3339())
            .map_err(|e| format!("heartbeat touch failed on '{}': {}", path.display(), e))?;
        trace!("heartbeat touched");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_bounded_produce_emits_exactly_count_lines() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");

        produce(Some(3), false, Some(log.clone()), Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap().lines().count(), 3);
    }

    #[tokio::test]
    async fn test_produce_appends_rather_than_truncates() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");
        fs::write(&log, "earlier line\n").unwrap();

        produce(Some(2), false, Some(log.clone()), Duration::from_millis(1))
            .await
            .unwrap();

        let content = fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier line");
    }

    #[tokio::test]
    async fn test_produce_zero_count_emits_nothing() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("app.log");

        produce(Some(0), false, Some(log.clone()), Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&log).unwrap(), "");
    }

    #[tokio::test]
    async fn test_beat_creates_the_heartbeat_file() {
        let dir = tempdir().unwrap();
        let heartbeat = dir.path().join("heartbeat");

        tokio::select! {
            result = beat(heartbeat.clone(), Duration::from_millis(5)) => {
                panic!("beat stopped unexpectedly: {:?}", result.err());
            }
            _ = tokio::time::sleep(Duration::from_millis(25)) => {}
        }

        assert!(heartbeat.is_file());
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_configuration() {
        let dir = tempdir().unwrap();
        let config = Config {
            logs_dir: dir.path().join("missing"),
            output_dir: dir.path().to_path_buf(),
            scan_interval: Duration::from_millis(10),
            heartbeat_file: dir.path().join("heartbeat"),
            heartbeat_interval: Duration::from_millis(10),
            state_file: None,
        };

        let err = run(config).await.unwrap_err();
        assert!(err.to_string().contains("PATH_TO_LOGS_DIRECTORY"));
    }
}
