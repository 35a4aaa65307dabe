//! # Ingestion and Render Loops
//!
//! The two long-running tasks of the pipeline. They share exactly one piece
//! of state — the [`LevelMailbox`] — and never call each other.
//!
//! - [`run_ingest`] samples the station every cycle and publishes the
//!   discretized level. Any per-cycle failure is logged and the cycle is
//!   abandoned; the loop itself never stops, and the mailbox keeps its
//!   previous value so the panel continues showing the last good reading.
//! - [`run_render`] drains the mailbox without blocking, retains the last
//!   level it saw, and keeps resynthesizing and drawing the fill pattern
//!   for it every `hold` interval. Before the first successful ingestion it
//!   idles on a short wait instead of spinning.
//!
//! Both loops take a `watch`-channel shutdown signal so the binary can stop
//! them on Ctrl-C and tests can terminate them deterministically; left
//! alone, they run until the process dies.

use crate::display::MatrixPanel;
use crate::distribution::{self, FetchError};
use crate::mailbox::LevelMailbox;
use crate::pattern::FillMatrix;
use crate::quantize::{self, QuantizeError};
use crate::DiscreteLevel;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Everything that can abort a single ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Quantize(#[from] QuantizeError),
}

/// Producer seam of the ingestion loop: one discretized level per call.
#[allow(async_fn_in_trait)]
pub trait LevelSource {
    async fn current_level(&self) -> Result<DiscreteLevel, IngestError>;
}

/// Production level source: fetch a year of readings for one station and
/// discretize the latest one over `cuts` quantile bins.
pub struct StationLevelSource {
    client: reqwest::Client,
    endpoint: String,
    station: String,
    cuts: u8,
    lookback_days: i64,
}

impl StationLevelSource {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        station: impl Into<String>,
        cuts: u8,
        lookback_days: i64,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            station: station.into(),
            cuts,
            lookback_days,
        }
    }
}

impl LevelSource for StationLevelSource {
    async fn current_level(&self) -> Result<DiscreteLevel, IngestError> {
        // Month-granularity window lower bound, e.g. "2025-08". The data
        // source filters on string comparison of the period label, so the
        // day component is deliberately absent.
        let since = (Utc::now() - chrono::Duration::days(self.lookback_days))
            .format("%Y-%m")
            .to_string();

        let series = distribution::fetch_distribution(
            &self.client,
            &self.endpoint,
            &self.station,
            &since,
        )
        .await?;

        let latest = series.last().map(|s| s.level);
        let level = quantize::discretize_last(&series, self.cuts)?;
        log::info!(
            "latest reading near {}: {latest:?}, discretized to bin {level}/{} over {} samples",
            self.station,
            self.cuts,
            series.len()
        );
        Ok(level)
    }
}

/// Ingestion loop: sample, discretize, publish, sleep; repeat until told to
/// stop.
///
/// Failures never terminate the loop — the cycle is logged and skipped, the
/// mailbox is left untouched, and the next cycle retries from scratch.
pub async fn run_ingest<S: LevelSource>(
    source: S,
    mailbox: Arc<LevelMailbox>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match source.current_level().await {
            Ok(level) => {
                log::info!("publishing level {level}");
                mailbox.publish(level);
            }
            Err(error) => {
                log::warn!("ingestion cycle failed, keeping previous level: {error}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }
    log::debug!("ingestion loop stopped");
}

/// Render loop: drain the mailbox, redraw the current level, hold, repeat.
///
/// The drained level is retained locally, so the panel keeps animating the
/// last known reading between (and despite failed) ingestion cycles. While
/// no level is known yet nothing is drawn and the loop idles on `idle`
/// instead of busy-waiting. A panel failure aborts the loop with the error;
/// there is no partial-frame recovery.
pub async fn run_render<P: MatrixPanel>(
    mut panel: P,
    mailbox: Arc<LevelMailbox>,
    hold: Duration,
    idle: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut level: DiscreteLevel = 0;

    loop {
        if let Some(fresh) = mailbox.take() {
            if fresh != level {
                log::info!("rendering level {fresh}");
            }
            level = fresh;
        }

        let wait = if level > 0 {
            let matrix = FillMatrix::synthesize(level, panel.resolution(), &mut rand::rng());
            panel.draw_points(&matrix.lit_points())?;
            hold
        } else {
            idle
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => break,
        }
    }
    log::debug!("render loop stopped");
    Ok(())
}
