use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::ScanError;
use crate::patterns::extrema::local_minima;
use crate::patterns::Sensitivity;
use crate::series::{validate_series, CandleData};

/// Default lookback for the extrema-based detector.
pub const DEFAULT_WINDOW: usize = 20;

/// Minimum relative rise required between the two troughs.
const MIN_RISE: f64 = 0.02;

/// A matched double bottom: the two trough indices into the candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoubleBottom {
    pub first_trough: usize,
    pub second_trough: usize,
}

/// Flags every index `i` whose preceding `window` samples contain two equal
/// minima separated by more than half the window.
///
/// The equality test is exact. That is brittle for floating-point price data
/// and is kept deliberately; `scan_with_tolerance` is the variant that
/// replaces it with a tolerance band.
///
/// Fails with `InvalidArgument` when `window == 0` and `InvalidInput` when the
/// series contains non-finite samples, both before any window is examined.
/// `window >= series.len()` yields an empty result.
pub fn scan(series: &[f64], window: usize) -> Result<Vec<usize>, ScanError> {
    scan_with_tolerance(series, window, 0.0)
}

/// `scan` with the exact-equality test widened to `|a - b| <= tolerance`.
/// `scan_with_tolerance(series, window, 0.0)` is identical to `scan`.
pub fn scan_with_tolerance(
    series: &[f64],
    window: usize,
    tolerance: f64,
) -> Result<Vec<usize>, ScanError> {
    check_scan_args(series, window, tolerance)?;

    Ok((window..series.len())
        .filter(|&i| window_matches(&series[i - window..i], tolerance))
        .collect())
}

/// Parallel `scan`: windows are independent reads over the immutable series,
/// so they are evaluated across threads. Output is identical to `scan`.
pub fn par_scan(series: &[f64], window: usize) -> Result<Vec<usize>, ScanError> {
    check_scan_args(series, window, 0.0)?;

    Ok((window..series.len())
        .into_par_iter()
        .filter(|&i| window_matches(&series[i - window..i], 0.0))
        .collect())
}

fn check_scan_args(series: &[f64], window: usize, tolerance: f64) -> Result<(), ScanError> {
    if window == 0 {
        return Err(ScanError::InvalidArgument(
            "window must be greater than 0".into(),
        ));
    }
    if !(tolerance >= 0.0) {
        return Err(ScanError::InvalidArgument(format!(
            "tolerance must be non-negative, got {tolerance}"
        )));
    }
    validate_series(series)
}

fn window_matches(sub: &[f64], tolerance: f64) -> bool {
    let Some(((pos_a, val_a), (pos_b, val_b))) = two_smallest(sub) else {
        return false;
    };
    let distance = pos_a.abs_diff(pos_b);
    // Half-window separation keeps two distinct troughs apart from one
    // noisy dip; the bound is real-valued and strict.
    distance as f64 > sub.len() as f64 / 2.0 && (val_a - val_b).abs() <= tolerance
}

/// Positions and values of the two smallest samples. The running minimum is
/// only displaced by strictly smaller values, so ties resolve to the first
/// occurrence. Returns `None` when fewer than two samples exist.
fn two_smallest(values: &[f64]) -> Option<((usize, f64), (usize, f64))> {
    let mut best: Option<(usize, f64)> = None;
    let mut second: Option<(usize, f64)> = None;

    for (pos, &val) in values.iter().enumerate() {
        match best {
            Some((_, b)) if val >= b => {
                if second.map_or(true, |(_, s)| val < s) {
                    second = Some((pos, val));
                }
            }
            _ => {
                second = best;
                best = Some((pos, val));
            }
        }
    }

    Some((best?, second?))
}

/// Extrema-pair double-bottom detector over OHLC candles.
///
/// Two local minima of the lows at similar price levels, far enough apart,
/// with a meaningful rise between them and a confirming close after the
/// second trough.
pub struct DoubleBottomDetector;

impl DoubleBottomDetector {
    pub fn detect(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<Vec<DoubleBottom>> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let tolerance = sensitivity.scaled(0.03);
        let min_distance =
            ((window as f64 * 0.7 * f64::from(sensitivity.inverted()) / 10.0) as usize).max(5);
        let order = (window / 4).max(1);

        let lows = &candle_data.low;
        let closes = &candle_data.close;
        let min_idx = local_minima(lows, order);

        let mut matches = Vec::new();

        for i in 0..min_idx.len().saturating_sub(1) {
            for j in (i + 1)..min_idx.len() {
                let (idx1, idx2) = (min_idx[i], min_idx[j]);

                if idx2 - idx1 < min_distance {
                    continue;
                }

                let (price1, price2) = (lows[idx1], lows[idx2]);
                if (price1 - price2).abs() / price1 > tolerance {
                    continue;
                }

                // Require a real recovery between the troughs.
                let max_between = closes[idx1..idx2].iter().cloned().fold(f64::MIN, f64::max);
                if (max_between - price1) / price1 < MIN_RISE
                    || (max_between - price2) / price2 < MIN_RISE
                {
                    continue;
                }

                // Confirmation: price rises after the second bottom.
                let confirmed = if idx2 + 5 < closes.len() {
                    closes[idx2 + 5] > price2
                } else {
                    closes[closes.len() - 1] > price2
                };

                if confirmed {
                    debug!(first = idx1, second = idx2, "double bottom candidate");
                    matches.push(DoubleBottom {
                        first_trough: idx1,
                        second_trough: idx2,
                    });
                }
            }
        }

        Ok(matches)
    }
}
