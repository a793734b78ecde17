//! aim-latch - hold-to-aim, then auto-lock direction
//!
//! Reads a gamepad, shapes movement and aim sticks into one output stick and
//! logs the result. Also replays CSV sample scripts for tuning.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aim_latch::aim::AimController;
use aim_latch::config::{watcher::SettingsWatcher, AppConfig};
use aim_latch::drivers::ConsoleOutput;
use aim_latch::input::gamepad::{print_gamepad_diagnostics, GilrsProvider};
use aim_latch::replay;

/// Hold-to-aim, then auto-lock direction for games with discrete fire directions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (live mode creates it with defaults if missing)
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List detected gamepads and exit
    #[arg(long)]
    list_gamepads: bool,

    /// Replay a CSV sample script instead of reading a gamepad
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Write the replay trace here instead of stdout
    #[arg(long, value_name = "FILE", requires = "replay")]
    trace_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_gamepads {
        tokio::task::spawn_blocking(print_gamepad_diagnostics).await?;
        return Ok(());
    }

    if let Some(script) = &args.replay {
        let config = AppConfig::load_or_default(&args.config).await?;
        return run_replay(script, &config, args.trace_out.as_deref()).await;
    }

    ensure_config(&args.config).await?;

    info!("Starting aim-latch...");
    info!("Configuration file: {}", args.config);

    run_live(args.config.clone(), shutdown_signal()).await?;

    info!("aim-latch shutdown complete");
    Ok(())
}

async fn run_live(config_path: String, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
    let (mut settings_watcher, initial_config) = SettingsWatcher::new(config_path).await?;
    info!("Configuration loaded successfully with hot-reload enabled");

    let output = Arc::new(ConsoleOutput::new(initial_config.output.log_every_write));
    let controller = AimController::new(initial_config.aim, output.clone())
        .context("Failed to create aim controller")?;
    controller.on_activate();

    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel();
    let mut provider = GilrsProvider::start(&initial_config.gamepad, sample_tx)?;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            Some(sample) = sample_rx.recv() => {
                controller.update(sample);
            }

            Some(settings) = settings_watcher.next_settings() => {
                match controller.apply_settings(settings) {
                    Ok(()) => info!("Aim settings updated: {:?}", settings),
                    Err(e) => warn!("Keeping previous aim settings: {}", e),
                }
            }

            else => {
                warn!("All input sources closed");
                break;
            }
        }
    }

    controller.on_deactivate();
    provider.shutdown();
    info!("Wrote {} axis values", output.write_count());
    Ok(())
}

async fn run_replay(script: &Path, config: &AppConfig, trace_out: Option<&Path>) -> Result<()> {
    let events = replay::load_script(script)?;
    let trace = replay::run_replay(&events, config.aim).await?;

    match trace_out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create trace file: {}", path.display()))?;
            replay::write_trace(&trace, file)?;
        }
        None => replay::write_trace(&trace, std::io::stdout().lock())?,
    }

    let timer_frames = trace.iter().filter(|row| row.source == "timer").count();
    eprintln!(
        "{} {} samples → {} frames ({} from timer)",
        "Replay complete:".bold().green(),
        events.len().to_string().cyan(),
        trace.len().to_string().cyan(),
        timer_frames.to_string().yellow()
    );
    Ok(())
}

/// Write a default configuration if none exists yet
async fn ensure_config(path: &str) -> Result<()> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }
    info!("No configuration at {}, writing defaults", path);
    AppConfig::default().save(path).await
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
