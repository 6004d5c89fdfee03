//! Mouse Jiggler - keeps the session awake from the system tray.
//!
//! While active, the cursor is nudged by a small random offset at a fixed
//! interval and put back, so idle detection never fires. Radius and
//! interval are adjustable from the tray menu.

mod config;
mod cursor;
mod jiggle;
mod signals;
mod tray;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::Config;
use crate::cursor::EnigoCursor;
use crate::jiggle::{Command, Controller};
use crate::tray::UiLoop;

/// Application version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "jiggler", version, about = "Keep your system awake by jiggling the mouse")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Start jiggling immediately
    #[arg(long)]
    start: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref())?;
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    if args.start {
        config.jiggle.start_active = true;
    }
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.logging.level)?;

    info!("Starting jiggler v{}", VERSION);

    let initial = config.jiggle.initial()?;
    info!(
        "Configuration loaded: radius={}, interval={}, start_active={}",
        initial.radius, initial.interval, config.jiggle.start_active
    );

    let driver = EnigoCursor::new().context("Failed to initialize cursor driver")?;
    let (ui, surface) = UiLoop::new()?;

    // Channel for menu and signal commands
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(16);

    // Controller runs on a tokio runtime in its own thread; the UI loop owns
    // the main thread.
    let signal_tx = cmd_tx.clone();
    let controller_initial = initial.clone();
    let stop_timeout = config.jiggle.stop_timeout();
    let start_active = config.jiggle.start_active;
    let controller_thread = std::thread::Builder::new()
        .name("jiggle-controller".to_string())
        .spawn(move || -> Result<()> {
            let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            runtime.block_on(async move {
                signals::forward_shutdown(signal_tx);

                let mut controller = Controller::new(
                    controller_initial,
                    cursor::shared(driver),
                    Box::new(surface),
                    stop_timeout,
                );
                if start_active {
                    controller.toggle_active().await;
                }
                info!(
                    "Controller started ({})",
                    if controller.is_active() { "jiggling" } else { "idle" }
                );
                controller.run(cmd_rx).await;
            });
            Ok(())
        })
        .context("Failed to spawn controller thread")?;

    // Blocks until the controller closes the tray
    ui.run(&initial, cmd_tx)?;

    match controller_thread.join() {
        Ok(result) => result?,
        Err(_) => {
            error!("Controller thread panicked");
            anyhow::bail!("Controller thread panicked");
        }
    }

    info!("Mouse Jiggler exiting...");
    Ok(())
}

/// Initialize tracing subscriber with the given log level.
fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["jiggler"]);
        assert!(args.config.is_none());
        assert!(!args.verbose);
        assert!(!args.start);
    }

    #[test]
    fn test_args_flags() {
        let args = Args::parse_from(["jiggler", "--config", "/tmp/j.toml", "-v", "--start"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/j.toml")));
        assert!(args.verbose);
        assert!(args.start);
    }
}
