//! # MAX7219 Panel Driver
//!
//! Hardware implementation of [`MatrixPanel`] for cascaded MAX7219 8×8 LED
//! blocks on the Raspberry Pi SPI bus. Only compiled with the `hardware`
//! cargo feature; everything else in the crate renders through the ASCII
//! panel.
//!
//! Wiring quirks are handled here so the rest of the pipeline can think in
//! plain `(column, row)` coordinates: per-block orientation for vertically
//! wired blocks, whole-panel rotation in quarter turns, and reverse block
//! order for chains soldered back-to-front.

use crate::config::DisplayConfig;
use crate::display::MatrixPanel;
use anyhow::{anyhow, Context, Result};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::SpidevDevice;
use max7219::connectors::SpiConnector;
use max7219::MAX7219;

/// Edge length of one MAX7219 block
const BLOCK: u8 = 8;

/// SPI device node of the panel chain
const SPI_DEVICE: &str = "/dev/spidev0.0";

/// Cascaded MAX7219 blocks behind the [`MatrixPanel`] seam.
pub struct Max7219Panel {
    driver: MAX7219<SpiConnector<SpidevDevice>>,
    options: DisplayConfig,
}

impl Max7219Panel {
    /// Open the SPI bus and initialize the chain.
    ///
    /// Fatal on failure: the render loop cannot run without its panel.
    pub fn new(options: &DisplayConfig) -> Result<Self> {
        let mut spi = SpidevDevice::open(SPI_DEVICE)
            .with_context(|| format!("open {SPI_DEVICE}"))?;
        spi.configure(
            &SpidevOptions::new()
                .bits_per_word(8)
                .max_speed_hz(1_000_000)
                .mode(SpiModeFlags::SPI_MODE_0)
                .build(),
        )
        .context("configure SPI")?;

        let mut driver = MAX7219::from_spi(usize::from(options.cascaded), spi)
            .map_err(|e| anyhow!("MAX7219 init: {e:?}"))?;
        driver
            .power_on()
            .map_err(|e| anyhow!("MAX7219 power on: {e:?}"))?;
        for block in 0..usize::from(options.cascaded) {
            driver
                .set_intensity(block, 1)
                .map_err(|e| anyhow!("MAX7219 intensity: {e:?}"))?;
            driver
                .clear_display(block)
                .map_err(|e| anyhow!("MAX7219 clear: {e:?}"))?;
        }

        log::debug!(
            "MAX7219 chain up: {} block(s), orientation {}, rotate {}, reverse {}",
            options.cascaded,
            options.block_orientation,
            options.rotate,
            options.reverse_order
        );
        Ok(Self {
            driver,
            options: options.clone(),
        })
    }

    /// Quarter turns to apply inside each block: whole-panel rotation plus
    /// the per-block orientation correction.
    fn quarter_turns(&self) -> u8 {
        let orientation_turns = match self.options.block_orientation {
            90 => 1,
            -90 => 3,
            _ => 0,
        };
        (self.options.rotate + orientation_turns) % 4
    }

    /// Pack the points of one block into its eight row bytes, MSB = column 0.
    fn pack_block(&self, points: &[(u8, u8)], block: u8) -> [u8; 8] {
        let turns = self.quarter_turns();
        let base = block * BLOCK;
        let mut rows = [0u8; 8];

        for &(column, row) in points {
            if row >= BLOCK || column < base || column >= base + BLOCK {
                continue;
            }
            let (mut c, mut r) = (column - base, row);
            for _ in 0..turns {
                // 90° clockwise within the block
                (c, r) = (BLOCK - 1 - r, c);
            }
            rows[usize::from(r)] |= 0x80 >> c;
        }
        rows
    }

    /// Physical chain index of a logical block.
    fn chain_index(&self, block: u8) -> usize {
        if self.options.reverse_order {
            usize::from(self.options.cascaded - 1 - block)
        } else {
            usize::from(block)
        }
    }
}

impl MatrixPanel for Max7219Panel {
    fn resolution(&self) -> u8 {
        self.options.dots
    }

    fn draw_points(&mut self, points: &[(u8, u8)]) -> Result<()> {
        for block in 0..self.options.cascaded {
            let rows = self.pack_block(points, block);
            self.driver
                .write_raw(self.chain_index(block), &rows)
                .map_err(|e| anyhow!("MAX7219 write: {e:?}"))?;
        }
        Ok(())
    }

    fn draw_text(&mut self, message: &str) -> Result<()> {
        // No font support in the raw driver; diagnostics text is log-only
        // on hardware (the ASCII panel prints it instead).
        log::info!("panel text: {message}");
        Ok(())
    }
}
