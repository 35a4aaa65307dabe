//! # Tide Panel Application Entry Point
//!
//! This binary wires the pipeline together: parse the CLI, load the TOML
//! configuration, construct the panel and HTTP adapters (fatal on failure —
//! neither loop can run without its adapter), spawn the ingestion and
//! render loops, and wait for Ctrl-C.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use tide_panel_lib::config::Config;
use tide_panel_lib::display::{self, AsciiPanel, MatrixPanel};
use tide_panel_lib::mailbox::LevelMailbox;
use tide_panel_lib::pipeline::{run_ingest, run_render, StationLevelSource};

/// Wait between render iterations while no level is known yet
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// Animate the sea level of an Italian tide gauge on a MAX7219 LED panel.
///
/// CLI flags override the corresponding tide-panel.toml settings.
#[derive(Parser)]
#[command(name = "tide-panel", version)]
#[command(about = "Animates the sea level near an Italian sea town on an 8x8 LED panel")]
struct Cli {
    /// Tide gauge geographical reference (free text, e.g. "Bari")
    #[arg(long)]
    station: Option<String>,

    /// Panel resolution per axis, doubling as the quantile cut count
    #[arg(long)]
    dots: Option<u8>,

    /// Number of cascaded MAX7219 blocks
    #[arg(long, short = 'n')]
    cascaded: Option<u8>,

    /// Corrects block orientation when wired vertically (0, 90 or -90)
    #[arg(long, allow_negative_numbers = true)]
    block_orientation: Option<i16>,

    /// Rotate the panel (0=0°, 1=90°, 2=180°, 3=270°)
    #[arg(long)]
    rotate: Option<u8>,

    /// Set if cascaded blocks are wired in reverse order
    #[arg(long)]
    reverse_order: bool,

    /// Configuration file path
    #[arg(long, default_value = "tide-panel.toml")]
    config: PathBuf,

    /// Render frames to the terminal instead of the LED panel
    #[arg(long)]
    ascii: bool,

    /// Run panel wiring diagnostics and exit
    #[arg(long)]
    demo: bool,
}

impl Cli {
    /// Overlay the CLI flags onto the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(station) = &self.station {
            config.station.name = station.clone();
        }
        if let Some(dots) = self.dots {
            config.display.dots = dots;
        }
        if let Some(cascaded) = self.cascaded {
            config.display.cascaded = cascaded;
        }
        if let Some(orientation) = self.block_orientation {
            config.display.block_orientation = orientation;
        }
        if let Some(rotate) = self.rotate {
            config.display.rotate = rotate;
        }
        if self.reverse_order {
            config.display.reverse_order = true;
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load_from_path(&cli.config);
    cli.apply(&mut config);

    if cli.ascii {
        log::debug!("terminal rendering requested");
    }

    // Hardware builds drive the SPI panel unless --ascii asks for the
    // terminal; non-hardware builds always render to the terminal.
    #[cfg(feature = "hardware")]
    if !cli.ascii {
        let panel = tide_panel_lib::max7219_panel::Max7219Panel::new(&config.display)
            .context("initialize MAX7219 panel")?;
        return dispatch(cli, config, panel).await;
    }

    let panel = AsciiPanel::new(config.display.dots);
    dispatch(cli, config, panel).await
}

/// Run diagnostics or the pipeline, depending on the CLI mode.
async fn dispatch<P: MatrixPanel + Send + 'static>(
    cli: Cli,
    config: Config,
    mut panel: P,
) -> Result<()> {
    if cli.demo {
        return display::demo(&mut panel);
    }
    run_pipeline(config, panel).await
}

/// Spawn the two loops and keep the process alive until Ctrl-C or a fatal
/// render failure.
async fn run_pipeline<P: MatrixPanel + Send + 'static>(config: Config, panel: P) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("initialize HTTP client")?;

    let mailbox = Arc::new(LevelMailbox::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source = StationLevelSource::new(
        client,
        config.station.endpoint.clone(),
        config.station.name.clone(),
        config.display.dots,
        config.ingest.lookback_days,
    );

    log::info!(
        "starting pipeline for {} ({} bins, every {} min)",
        config.station.name,
        config.display.dots,
        config.ingest.interval_minutes
    );

    let ingest = tokio::spawn(run_ingest(
        source,
        Arc::clone(&mailbox),
        Duration::from_secs(config.ingest.interval_minutes * 60),
        shutdown_rx.clone(),
    ));
    let mut render = tokio::spawn(run_render(
        panel,
        Arc::clone(&mailbox),
        Duration::from_millis(config.display.hold_millis),
        IDLE_WAIT,
        shutdown_rx,
    ));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for shutdown signal")?;
            log::info!("shutdown requested");
        }
        result = &mut render => {
            // The render loop only exits early when the panel failed;
            // that's fatal, but stop the ingestion loop cleanly first.
            shutdown_tx.send(true).ok();
            ingest.await.context("join ingestion loop")?;
            return result.context("join render loop")?;
        }
    }

    shutdown_tx.send(true).ok();
    ingest.await.context("join ingestion loop")?;
    render.await.context("join render loop")??;
    Ok(())
}
