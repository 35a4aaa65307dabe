//! # Display Adapter
//!
//! The render loop only ever needs three capabilities from a panel: its
//! resolution, "light these points", and "scroll this text" (diagnostics).
//! [`MatrixPanel`] is that seam. The default build ships [`AsciiPanel`],
//! which renders frames to the terminal for development without hardware;
//! the `hardware` feature adds the SPI MAX7219 implementation in the
//! `max7219_panel` module.

use anyhow::Result;

/// Capability set of an addressable on/off matrix.
///
/// Coordinates are `(column, row)`, zero-based, row 0 at the top. A failed
/// draw is fatal to the render loop — there is no partial-frame recovery,
/// and a dead panel bus does not come back without re-initialization.
pub trait MatrixPanel {
    /// Edge length of the addressable grid.
    fn resolution(&self) -> u8;

    /// Light exactly the given points; every other cell goes dark.
    fn draw_points(&mut self, points: &[(u8, u8)]) -> Result<()>;

    /// Scroll a text message across the panel.
    fn draw_text(&mut self, message: &str) -> Result<()>;
}

/// Terminal stand-in for the LED panel.
///
/// Prints each frame as a block of `█`/`·` characters. Used by the
/// `--ascii` dev mode and by non-hardware builds.
pub struct AsciiPanel {
    dots: u8,
}

impl AsciiPanel {
    pub fn new(dots: u8) -> Self {
        Self { dots }
    }

    /// Render a point set into the terminal frame format.
    fn frame(&self, points: &[(u8, u8)]) -> String {
        let mut out = String::new();
        for row in 0..self.dots {
            for column in 0..self.dots {
                let lit = points.contains(&(column, row));
                out.push(if lit { '█' } else { '·' });
            }
            out.push('\n');
        }
        out
    }
}

impl MatrixPanel for AsciiPanel {
    fn resolution(&self) -> u8 {
        self.dots
    }

    fn draw_points(&mut self, points: &[(u8, u8)]) -> Result<()> {
        println!("{}", self.frame(points));
        Ok(())
    }

    fn draw_text(&mut self, message: &str) -> Result<()> {
        println!("[panel] {message}");
        Ok(())
    }
}

/// Wiring diagnostics: exercise every panel capability with fixed patterns.
///
/// Scrolls a greeting, lights a single point, a small point set, then a
/// full, a row-striped and a column-striped frame, holding each briefly.
/// Meant to be run once from the CLI before the loops start.
pub fn demo(panel: &mut impl MatrixPanel) -> Result<()> {
    use std::thread::sleep;
    use std::time::Duration;

    let n = panel.resolution();

    panel.draw_text("Hello, world")?;

    panel.draw_points(&[(4, 6)])?;
    sleep(Duration::from_millis(1000));

    panel.draw_points(&[(0, 0), (1, 0), (4, 6)])?;
    sleep(Duration::from_millis(1000));

    // Full frame
    let full: Vec<(u8, u8)> = (0..n).flat_map(|r| (0..n).map(move |c| (c, r))).collect();
    panel.draw_points(&full)?;
    sleep(Duration::from_millis(250));

    // Every other row
    let rows: Vec<(u8, u8)> = (0..n)
        .filter(|r| r % 2 == 1)
        .flat_map(|r| (0..n).map(move |c| (c, r)))
        .collect();
    panel.draw_points(&rows)?;
    sleep(Duration::from_millis(250));

    // Every other column
    let columns: Vec<(u8, u8)> = (0..n)
        .flat_map(|r| (0..n).filter(|c| c % 2 == 1).map(move |c| (c, r)))
        .collect();
    panel.draw_points(&columns)?;
    sleep(Duration::from_millis(250));

    Ok(())
}
