//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-panel.toml file. It provides a centralized way to configure the
//! tide-gauge station, the SPARQL endpoint, ingestion cadence, and the LED
//! panel wiring options.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from tide-panel.toml
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Tide-gauge station and data-source configuration
    pub station: StationConfig,
    /// Ingestion loop configuration
    pub ingest: IngestConfig,
    /// LED panel configuration
    pub display: DisplayConfig,
}

/// Tide-gauge station configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StationConfig {
    /// Geographical reference of the gauge, matched as a free-text label
    /// by the data source (e.g. "Bari", "Venezia")
    pub name: String,
    /// SPARQL endpoint serving the tide-gauge network datasets
    pub endpoint: String,
}

/// Ingestion loop configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Minutes between ingestion cycles
    pub interval_minutes: u64,
    /// History window in days; the quantile base spans this far back,
    /// truncated to month granularity by the data source query
    pub lookback_days: i64,
}

/// LED panel configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel resolution per axis; also the quantile cut count, so every
    /// bin maps to exactly one panel row
    pub dots: u8,
    /// Milliseconds each synthesized frame is held on the panel
    pub hold_millis: u64,
    /// Number of cascaded MAX7219 blocks
    pub cascaded: u8,
    /// Block orientation when wired vertically (0, 90 or -90)
    pub block_orientation: i16,
    /// Panel rotation (0=0°, 1=90°, 2=180°, 3=270°)
    pub rotate: u8,
    /// True if cascaded blocks are wired in reverse order
    pub reverse_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                name: "Bari".to_string(),
                endpoint: "http://dati.isprambiente.it/sparql".to_string(),
            },
            ingest: IngestConfig {
                interval_minutes: 10,
                lookback_days: 365,
            },
            display: DisplayConfig {
                dots: 8,
                hold_millis: 500,
                cascaded: 1,
                block_orientation: 0,
                rotate: 0,
                reverse_order: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-panel.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("tide-panel.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    log::info!("loaded configuration for station {}", config.station.name);
                    config
                }
                Err(e) => {
                    log::warn!("invalid config file format: {e}");
                    log::warn!("using default configuration (Bari)");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no config file found, using default configuration (Bari)");
                Self::default()
            }
        }
    }

    /// Save current configuration to tide-panel.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("tide-panel.toml", contents)?;
        log::info!("configuration saved to tide-panel.toml");
        Ok(())
    }
}
