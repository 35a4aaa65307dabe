//! # Quantile Discretization
//!
//! Reduces a hydrometric level distribution to a small integer: cut the
//! observed levels into `C` equal-probability bins and report which bin the
//! chronologically last reading falls into. "How high is the water *right
//! now*, relative to the last year?" — not a smoothed or averaged value.
//!
//! Boundaries are linear-interpolation quantiles of the observed values,
//! recomputed fresh from every series; nothing is persisted between
//! ingestion cycles.

use crate::{DiscreteLevel, Series};
use thiserror::Error;

/// Errors from building a quantile binning.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuantizeError {
    /// Fewer samples than bins; quantile cutting is undefined below one
    /// sample per bin
    #[error("need at least {need} samples for {need} quantile bins, got {have}")]
    InsufficientData { have: usize, need: usize },

    /// A binning needs at least two bins to discriminate anything
    #[error("cut count must be at least 2, got {0}")]
    TooFewCuts(u8),
}

/// Quantile bin boundaries derived from one observed distribution.
///
/// Holds the `C - 1` internal boundary values partitioning the levels into
/// `C` equal-probability bins labelled `1..=C`. Boundaries are monotonically
/// non-decreasing; duplicate boundaries from low-cardinality data are
/// accepted (the corresponding bins are simply unreachable).
#[derive(Clone, Debug, PartialEq)]
pub struct QuantileBinning {
    boundaries: Vec<f64>,
}

impl QuantileBinning {
    /// Derive bin boundaries from a series.
    ///
    /// Requires at least one sample per bin (`series.len() >= cuts`); below
    /// that the computation is undefined and `InsufficientData` is returned.
    /// A pure function of the series values and `cuts`.
    pub fn from_series(series: &Series, cuts: u8) -> Result<Self, QuantizeError> {
        if cuts < 2 {
            return Err(QuantizeError::TooFewCuts(cuts));
        }
        if series.len() < cuts as usize {
            return Err(QuantizeError::InsufficientData {
                have: series.len(),
                need: cuts as usize,
            });
        }

        let mut levels: Vec<f64> = series.samples.iter().map(|s| s.level).collect();
        levels.sort_by(f64::total_cmp);

        let boundaries = (1..cuts)
            .map(|k| quantile(&levels, f64::from(k) / f64::from(cuts)))
            .collect();

        Ok(QuantileBinning { boundaries })
    }

    /// The internal boundary values, non-decreasing.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Number of bins this binning partitions into.
    pub fn cuts(&self) -> u8 {
        self.boundaries.len() as u8 + 1
    }

    /// Bin index (1-based) of a level value.
    ///
    /// A value exactly on a boundary falls into the lower-indexed bin.
    pub fn classify(&self, level: f64) -> DiscreteLevel {
        let below = self.boundaries.iter().filter(|b| level > **b).count();
        below as DiscreteLevel + 1
    }

    /// Bin index of the chronologically last reading, `None` on an empty
    /// series.
    pub fn classify_last(&self, series: &Series) -> Option<DiscreteLevel> {
        series.last().map(|sample| self.classify(sample.level))
    }
}

/// Discretize the last reading of a series over `cuts` quantile bins.
///
/// Convenience wrapper combining [`QuantileBinning::from_series`] and
/// [`QuantileBinning::classify_last`]; the binning's sample-count check
/// guarantees the series is non-empty by the time it is classified.
pub fn discretize_last(series: &Series, cuts: u8) -> Result<DiscreteLevel, QuantizeError> {
    let binning = QuantileBinning::from_series(series, cuts)?;
    Ok(binning.classify_last(series).unwrap_or(0))
}

/// Linear-interpolation quantile of an ascending slice, `q` in `[0, 1]`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sample;
    use chrono::{Duration, TimeZone, Utc};

    /// Test helper: series with the given levels at 10-minute spacing.
    fn series_of(levels: &[f64]) -> Series {
        let start = Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap();
        Series {
            samples: levels
                .iter()
                .enumerate()
                .map(|(i, &level)| Sample {
                    utc: start + Duration::minutes(10 * i as i64),
                    level,
                })
                .collect(),
        }
    }

    #[test]
    fn boundaries_are_non_decreasing() {
        let series = series_of(&[25.0, 22.4, 26.3, 24.3, 25.0, 23.1, 27.9, 21.0, 24.8, 26.1]);
        let binning = QuantileBinning::from_series(&series, 4).unwrap();

        assert_eq!(binning.boundaries().len(), 3);
        for pair in binning.boundaries().windows(2) {
            assert!(
                pair[0] <= pair[1],
                "boundaries must be non-decreasing, got {:?}",
                binning.boundaries()
            );
        }
    }

    #[test]
    fn classify_stays_within_bin_range() {
        let levels: Vec<f64> = (0..50).map(|i| 20.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        let series = series_of(&levels);

        for cuts in 2..=8u8 {
            let binning = QuantileBinning::from_series(&series, cuts).unwrap();
            for sample in &series.samples {
                let bin = binning.classify(sample.level);
                assert!(
                    (1..=cuts).contains(&bin),
                    "bin {bin} out of [1, {cuts}] for level {}",
                    sample.level
                );
            }
        }
    }

    #[test]
    fn binning_is_pure() {
        let series = series_of(&[1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 3.0, 6.0]);
        let a = QuantileBinning::from_series(&series, 4).unwrap();
        let b = QuantileBinning::from_series(&series, 4).unwrap();
        assert_eq!(a, b, "same series and cuts must produce the same binning");
    }

    #[test]
    fn ties_fall_into_the_lower_bin() {
        // Sorted levels [1, 2, 3, 4]; the median boundary interpolates to 2.5
        let series = series_of(&[3.0, 1.0, 4.0, 2.0]);
        let binning = QuantileBinning::from_series(&series, 2).unwrap();

        assert_eq!(binning.boundaries(), [2.5]);
        assert_eq!(binning.classify(2.5), 1, "boundary tie goes to the lower bin");
        assert_eq!(binning.classify(2.6), 2);
    }

    #[test]
    fn degenerate_distribution_is_accepted() {
        // Fewer distinct values than bins: duplicate boundaries, no error
        let series = series_of(&[5.0; 12]);
        let binning = QuantileBinning::from_series(&series, 4).unwrap();
        assert_eq!(binning.boundaries(), [5.0, 5.0, 5.0]);
        assert_eq!(binning.classify(5.0), 1);
    }

    #[test]
    fn too_few_samples_is_insufficient_data() {
        let series = series_of(&[1.0, 2.0, 3.0]);
        assert_eq!(
            QuantileBinning::from_series(&series, 8),
            Err(QuantizeError::InsufficientData { have: 3, need: 8 })
        );
    }

    #[test]
    fn fewer_than_two_cuts_is_rejected() {
        let series = series_of(&[1.0, 2.0, 3.0]);
        assert_eq!(
            QuantileBinning::from_series(&series, 1),
            Err(QuantizeError::TooFewCuts(1))
        );
    }

    #[test]
    fn last_reading_at_95th_percentile_lands_in_top_decile() {
        // 100 readings; the chronologically last one sits at the 95th
        // percentile of the distribution
        let mut levels: Vec<f64> = (1..=99).map(f64::from).collect();
        levels.push(95.5);
        let series = series_of(&levels);

        assert_eq!(discretize_last(&series, 10), Ok(10));
    }

    #[test]
    fn discretize_last_tracks_the_current_reading_only() {
        // High history, low current reading: the bin reflects "now"
        let mut levels: Vec<f64> = (1..=19).map(f64::from).collect();
        levels.push(0.5);
        let series = series_of(&levels);

        assert_eq!(discretize_last(&series, 4), Ok(1));
    }
}
