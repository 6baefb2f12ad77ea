//! inputlog - inspect, validate and dry-run replay input event logs
//!
//! Commands:
//! - `inspect`: summarize a log (event counts, duration, bad lines)
//! - `check`: fail if a log has a bad header, bad lines or unordered timestamps
//! - `replay`: play a log against a console host that prints each event
//! - `config`: print the effective configuration

mod config;
mod console_host;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::InputlogConfig;
use console_host::ConsoleHost;
use inputlog_recorder::{summarize, LogReader, LogSummary, Replayer, WindowId};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Window that dry-run replays target.
const REPLAY_WINDOW: WindowId = WindowId(1);

/// Input event log tool
#[derive(Parser, Debug)]
#[command(name = "inputlog")]
#[command(about = "Inspect, validate and replay input event logs")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./inputlog.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a log
    Inspect {
        /// Log file
        log: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a log and exit non-zero on any problem
    Check {
        /// Log file
        log: PathBuf,
    },

    /// Replay a log, printing events instead of injecting them
    Replay {
        /// Log file
        log: PathBuf,

        /// Playback speed multiplier (0.1 to 10.0)
        #[arg(short, long)]
        speed: Option<f64>,

        /// Window width used for touch coordinates
        #[arg(long, default_value = "800")]
        width: u32,

        /// Window height used for touch coordinates
        #[arg(long, default_value = "600")]
        height: u32,
    },

    /// Print the effective recorder and replay configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "inputlog=debug,inputlog_recorder=debug"
    } else {
        "inputlog=info,inputlog_recorder=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = InputlogConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { log, json } => cmd_inspect(&log, json),
        Command::Check { log } => cmd_check(&log),
        Command::Replay {
            log,
            speed,
            width,
            height,
        } => cmd_replay(&log, config, speed, (width, height)),
        Command::Config => {
            print!("{}", render_config(&config)?);
            Ok(())
        }
    }
}

fn read_summary(path: &Path) -> Result<LogSummary> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = LogReader::new(BufReader::new(file))
        .with_context(|| format!("{} is not an event log", path.display()))?;
    summarize(&mut reader).with_context(|| format!("Failed to read {}", path.display()))
}

fn cmd_inspect(path: &Path, json: bool) -> Result<()> {
    let summary = read_summary(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", path.display());
    println!("  events:   {}", summary.entries);
    println!("  duration: {:.3}s", summary.duration_us() as f64 / 1_000_000.0);
    for (kind, count) in &summary.by_kind {
        println!("  {:<14} {}", kind.as_str(), count);
    }
    if !summary.is_clean() {
        println!("  malformed lines:     {:?}", summary.malformed_lines);
        println!("  unknown kind lines:  {:?}", summary.unknown_kind_lines);
        println!("  ordering violations: {:?}", summary.ordering_violations);
    }
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let summary = read_summary(path)?;

    if !summary.is_clean() {
        anyhow::bail!(
            "{}: {} malformed, {} unknown kind, {} out of order",
            path.display(),
            summary.malformed_lines.len(),
            summary.unknown_kind_lines.len(),
            summary.ordering_violations.len()
        );
    }

    println!("{}: ok ({} events)", path.display(), summary.entries);
    Ok(())
}

fn cmd_replay(
    path: &Path,
    config: InputlogConfig,
    speed: Option<f64>,
    window_size: (u32, u32),
) -> Result<()> {
    let mut replay_config = config.replay;
    if let Some(speed) = speed {
        replay_config = replay_config.with_speed(speed);
    }

    let mut host = ConsoleHost::new(window_size, std::io::stdout());
    let mut replayer = Replayer::open(path, &host, REPLAY_WINDOW, replay_config)
        .with_context(|| format!("Failed to start replay of {}", path.display()))?;

    while replayer.process_step(&mut host) {}

    let stats = replayer.stats();
    tracing::info!(
        "Replay finished: {} injected, {} warnings",
        stats.injected,
        stats.warnings()
    );
    Ok(())
}

/// Effective configuration as TOML.
fn render_config(config: &InputlogConfig) -> Result<String> {
    config.to_toml()
}
