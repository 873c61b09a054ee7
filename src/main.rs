#![forbid(unsafe_code)]

//! CLI binary: replay a recorded lifecycle event stream through the aggregator.
//!
//! Usage:
//! ```text
//! testlens replay results/events.jsonl --level debug --summary-json results/summary.json
//! ```

use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use testlens::{
    AGGREGATOR_CONTEXT, LifecycleAggregator, LogCore, LogLevel, Logger, LoggerConfigPatch,
    read_events,
};

#[derive(Debug, Parser)]
#[command(name = "testlens")]
#[command(about = "Replay test lifecycle events into logs and a run summary")]
struct Cli {
    /// Emit testlens' own diagnostics at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Feed a JSON-lines event file through the aggregator.
    Replay(ReplayArgs),
    /// List accepted log level names.
    Levels,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// JSON-lines file, one lifecycle event per line.
    events: PathBuf,

    /// Logger configuration (JSON, camelCase keys) applied before the flags below.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum level to emit.
    #[arg(long)]
    level: Option<LogLevel>,

    /// Also append log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long)]
    no_color: bool,

    #[arg(long)]
    no_timestamps: bool,

    /// Write the structured run summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

impl ReplayArgs {
    fn logger_patch(&self) -> Result<LoggerConfigPatch> {
        let mut patch = match &self.config {
            Some(path) => LoggerConfigPatch::from_json_file(path)
                .with_context(|| format!("loading logger config from {}", path.display()))?,
            None => LoggerConfigPatch::default(),
        };
        if let Some(level) = self.level {
            patch.level = Some(level);
        }
        if let Some(path) = &self.log_file {
            patch.enable_file_logging = Some(true);
            patch.log_file = Some(path.clone());
        }
        if self.no_color {
            patch.enable_colors = Some(false);
        }
        if self.no_timestamps {
            patch.enable_timestamps = Some(false);
        }
        Ok(patch)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Command::Replay(args) => replay(&args),
        Command::Levels => {
            for level in LogLevel::ALL {
                println!("{level}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Exits non-zero when any test ended in the failed bucket.
fn replay(args: &ReplayArgs) -> Result<ExitCode> {
    let core = LogCore::global();
    let patch = args.logger_patch()?;
    if !patch.is_empty() {
        core.configure(&patch);
    }
    tracing::debug!(config = ?core.config(), "logger configured");

    let file = File::open(&args.events)
        .with_context(|| format!("opening event stream {}", args.events.display()))?;
    let events = read_events(BufReader::new(file))
        .with_context(|| format!("reading event stream {}", args.events.display()))?;
    tracing::debug!(count = events.len(), "decoded lifecycle events");

    // Labelled with the configured default context.
    let runner = Logger::unlabeled(Arc::clone(&core));
    runner.info(format_args!(
        "Replaying {} lifecycle event(s) from {}",
        events.len(),
        args.events.display()
    ));

    let mut aggregator = LifecycleAggregator::new(Logger::with_core(core, AGGREGATOR_CONTEXT));
    let summary = aggregator.replay(&events);

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary).context("serializing run summary")?;
        fs::write(path, json)
            .with_context(|| format!("writing run summary to {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote run summary");
    }

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        runner.error(format_args!(
            "{} failed test attempt(s); exiting with failure",
            summary.totals.failed
        ));
        Ok(ExitCode::FAILURE)
    }
}
