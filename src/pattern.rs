//! # Fill Pattern Synthesis
//!
//! Turns a discrete level into a boolean matrix that reads as a fluid
//! surface on the panel: everything above the waterline dark, the waterline
//! row flickering 50/50, everything below lit with a 1% sparse-noise
//! dropout. The dropout is intentional dithering — resynthesized every
//! frame it makes the "water" shimmer instead of sitting as a solid block.
//!
//! Synthesis is generic over the RNG so tests can drive a seeded generator
//! and assert densities; the pattern is a stochastic visual effect, never a
//! measurement.

use rand::Rng;

/// On-probability above the waterline
const ABOVE_P: f64 = 0.0;
/// On-probability of the waterline row itself
const WATERLINE_P: f64 = 0.5;
/// On-probability below the waterline
const BELOW_P: f64 = 0.99;

/// An `N×N` boolean fill pattern, row 0 at the top.
///
/// For a level `L` drawn into a matrix of size `N`, exactly `L` rows sit at
/// or below the waterline: rows `0..N-L` are off, row `N-L` is the
/// waterline, rows `N-L+1..N` are the water body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillMatrix {
    size: u8,
    cells: Vec<bool>,
}

impl FillMatrix {
    /// Synthesize a fill pattern for `level ∈ [1, size]`.
    ///
    /// `level = size` yields zero rows above the waterline; `level = 1`
    /// yields a lone waterline row at the bottom. Out-of-range levels are
    /// clamped into the valid range.
    pub fn synthesize<R: Rng>(level: u8, size: u8, rng: &mut R) -> Self {
        let level = level.clamp(1, size);
        let waterline = size - level;

        let mut cells = Vec::with_capacity(usize::from(size) * usize::from(size));
        for row in 0..size {
            let p = match row.cmp(&waterline) {
                std::cmp::Ordering::Less => ABOVE_P,
                std::cmp::Ordering::Equal => WATERLINE_P,
                std::cmp::Ordering::Greater => BELOW_P,
            };
            for _column in 0..size {
                cells.push(rng.random_bool(p));
            }
        }

        FillMatrix { size, cells }
    }

    /// Matrix edge length.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Whether the cell at `(column, row)` is lit.
    pub fn is_lit(&self, column: u8, row: u8) -> bool {
        self.cells[usize::from(row) * usize::from(self.size) + usize::from(column)]
    }

    /// Lit cells as `(column, row)` points, row-major, ready for the panel.
    pub fn lit_points(&self) -> Vec<(u8, u8)> {
        let mut points = Vec::new();
        for row in 0..self.size {
            for column in 0..self.size {
                if self.is_lit(column, row) {
                    points.push((column, row));
                }
            }
        }
        points
    }

    /// Number of lit cells in one row.
    pub fn lit_in_row(&self, row: u8) -> usize {
        (0..self.size).filter(|&c| self.is_lit(c, row)).count()
    }
}
