//! Logmirror CLI - Command-line interface for logmirror
//!
//! This is the main entry point. It provides the mirroring daemon
//! (`run`) plus the two peripheral collaborators from the lab setup:
//! a synthetic log producer (`produce`) and a heartbeat toucher
//! (`beat`).

use clap::{Parser, Subcommand};
use colored::Colorize;
use logmirror_core::config::{
    DEFAULT_HEARTBEAT_FILE, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_LOGS_DIR, DEFAULT_OUTPUT_DIR,
    DEFAULT_SCAN_INTERVAL_MS, ENV_HEARTBEAT_FILE, ENV_HEARTBEAT_INTERVAL_MS, ENV_LOGS_DIR,
    ENV_OUTPUT_DIR, ENV_SCAN_INTERVAL_MS, ENV_STATE_FILE,
};
use logmirror_core::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "logmirror")]
#[command(author = "Logmirror Contributors")]
#[command(version)]
#[command(about = "Incremental log mirroring with heartbeat liveness", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scan/transform daemon with the liveness monitor
    Run {
        /// Directory scanned for source log files
        #[arg(long, env = ENV_LOGS_DIR, default_value = DEFAULT_LOGS_DIR)]
        logs_dir: PathBuf,

        /// Directory the transformed mirrors are appended into
        #[arg(long, env = ENV_OUTPUT_DIR, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Pause between directory scans, in milliseconds
        #[arg(long, env = ENV_SCAN_INTERVAL_MS, default_value_t = DEFAULT_SCAN_INTERVAL_MS)]
        scan_interval_ms: u64,

        /// Heartbeat file whose modification time must keep advancing
        #[arg(long, env = ENV_HEARTBEAT_FILE, default_value = DEFAULT_HEARTBEAT_FILE)]
        heartbeat_file: PathBuf,

        /// Pause between heartbeat polls, in milliseconds
        #[arg(long, env = ENV_HEARTBEAT_INTERVAL_MS, default_value_t = DEFAULT_HEARTBEAT_INTERVAL_MS)]
        heartbeat_interval_ms: u64,

        /// Optional JSON state snapshot; when set, processing resumes
        /// across restarts instead of re-emitting everything
        #[arg(long, env = ENV_STATE_FILE)]
        state_file: Option<PathBuf>,
    },

    /// Produce synthetic timestamp log lines
    Produce {
        /// Number of lines to produce (runs forever when omitted)
        #[arg(short, long)]
        count: Option<u64>,

        /// Write lines to standard output (the default when no file
        /// is given)
        #[arg(long)]
        stdout: bool,

        /// Append lines to this file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pause between lines, in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Periodically refresh the heartbeat file's modification time
    Beat {
        /// Heartbeat file to touch (created if absent)
        #[arg(long, env = ENV_HEARTBEAT_FILE, default_value = DEFAULT_HEARTBEAT_FILE)]
        heartbeat_file: PathBuf,

        /// Pause between touches, in milliseconds
        #[arg(long, default_value_t = 10_000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Run {
            logs_dir,
            output_dir,
            scan_interval_ms,
            heartbeat_file,
            heartbeat_interval_ms,
            state_file,
        } => {
            let config = Config {
                logs_dir,
                output_dir,
                scan_interval: Duration::from_millis(scan_interval_ms),
                heartbeat_file,
                heartbeat_interval: Duration::from_millis(heartbeat_interval_ms),
                state_file,
            };
            commands::run(config).await
        }
        Commands::Produce {
            count,
            stdout,
            file,
            interval_ms,
        } => commands::produce(count, stdout, file, Duration::from_millis(interval_ms))
            .await
            .map(|_| 0),
        Commands::Beat {
            heartbeat_file,
            interval_ms,
        } => commands::beat(heartbeat_file, Duration::from_millis(interval_ms))
            .await
            .map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
