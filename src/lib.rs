//! # Tide Panel Core Library
//!
//! This library implements a small producer/consumer pipeline that keeps a
//! low-resolution LED matrix in sync with the sea level measured by a tide
//! gauge. A tide gauge — also known as mareograph, marigraph, or sea-level
//! recorder — measures the change in sea level (the hydrometric level) over
//! time; the Italian ISPRA National Tidegauge Network publishes one monthly
//! CSV of readings per station through a public SPARQL endpoint.
//!
//! ## Pipeline
//!
//! 1. **Ingestion** ([`pipeline::run_ingest`]): every ten minutes, fetch the
//!    last year of readings for one station ([`distribution`]), discretize
//!    the latest reading into a quantile bin ([`quantize`]), and publish the
//!    bin index into a single-slot mailbox ([`mailbox`]).
//! 2. **Rendering** ([`pipeline::run_render`]): continuously drain the
//!    mailbox and, once a level is known, draw an animated "water level"
//!    fill pattern ([`pattern`]) to the panel ([`display`]), refreshing it
//!    every 500 ms.
//!
//! The two loops never call each other; the mailbox is the only shared
//! state. Intermediate levels are discardable — only the latest reading
//! matters — so the mailbox overwrites on every publish and the render loop
//! keeps redrawing its last known level between publishes.
//!
//! ## Target
//!
//! Designed for unattended operation on a Raspberry Pi Zero W driving a
//! cascaded MAX7219 8×8 LED panel. The default build renders to the
//! terminal; the `hardware` cargo feature enables the SPI panel driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod display;
pub mod distribution;
pub mod mailbox;
#[cfg(feature = "hardware")]
pub mod max7219_panel;
pub mod pattern;
pub mod pipeline;
pub mod quantize;
pub mod sparql;

/// A single hydrometric reading at a specific instant.
///
/// Readings arrive from the data source at 10-minute cadence, one value per
/// row of the monthly CSV. The level unit is whatever the station reports
/// (centimetres relative to the local datum); the pipeline only ever ranks
/// readings against each other, so the unit never matters.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tide_panel_lib::Sample;
///
/// let sample = Sample {
///     utc: Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap(),
///     level: 25.0,
/// };
/// assert_eq!(sample.level, 25.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp of the reading (UTC)
    pub utc: DateTime<Utc>,
    /// Measured hydrometric level
    pub level: f64,
}

/// An ordered hydrometric level distribution for one station.
///
/// Formed by concatenating one sub-series per calendar month, in the order
/// the data source returns them. Samples are kept exactly as delivered:
/// never deduplicated, never re-sorted. A successful fetch always yields a
/// non-empty series (zero monthly resources is a fetch error, not an empty
/// series).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Series {
    /// Readings in delivery order, chronologically ascending per month
    pub samples: Vec<Sample>,
}

impl Series {
    /// Number of readings in the series.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the series holds no readings.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The chronologically last reading, i.e. the current one.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Discretized hydrometric level.
///
/// `0` means "unknown / not yet ingested"; `1..=cuts` is the quantile bin
/// of the latest reading relative to the last year of history. Carried by
/// value through the mailbox — each publish and drain copies it.
pub type DiscreteLevel = u8;
