use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::patterns::extrema::{local_maxima, local_minima};
use crate::patterns::Sensitivity;
use crate::series::CandleData;

/// Default lookback; triangles need more room than two-extremum patterns.
pub const DEFAULT_WINDOW: usize = 40;

/// Relative breakout threshold against the projected trendline.
const BREAKOUT_DEVIATION: f64 = 0.02;

/// Relative spread under which a set of extrema counts as a flat line.
const FLAT_LINE_SPREAD: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriangleKind {
    Symmetric,
    Ascending,
    Descending,
}

/// A triangle match: five anchor indices, the projected convergence point
/// and whether price has already broken out of the formation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triangle {
    pub kind: TriangleKind,
    pub points: [usize; 5],
    pub converge_index: usize,
    pub converge_price: f64,
    pub breakout: bool,
}

pub struct TriangleDetector;

impl TriangleDetector {
    /// Detects symmetric (falling resistance, rising support), ascending
    /// (flat resistance, rising support) and descending (flat support,
    /// falling resistance) triangles.
    pub fn detect(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<Vec<Triangle>> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let min_duration =
            ((window as f64 * 0.5 * f64::from(sensitivity.inverted()) / 10.0) as usize).max(7);
        let order = (window / 8).max(1);

        let highs = &candle_data.high;
        let lows = &candle_data.low;
        let closes = &candle_data.close;

        let max_idx = local_maxima(highs, order);
        let min_idx = local_minima(lows, order);

        let mut triangles = Vec::new();
        if max_idx.len() < 3 || min_idx.len() < 3 {
            return Ok(triangles);
        }

        Self::detect_symmetric(
            highs, lows, closes, &max_idx, &min_idx, min_duration, window, &mut triangles,
        );
        Self::detect_ascending(highs, lows, closes, &max_idx, &min_idx, min_duration, &mut triangles);
        Self::detect_descending(highs, lows, closes, &max_idx, &min_idx, min_duration, &mut triangles);

        debug!(count = triangles.len(), "triangle scan complete");
        Ok(triangles)
    }

    #[allow(clippy::too_many_arguments)]
    fn detect_symmetric(
        highs: &[f64],
        lows: &[f64],
        closes: &[f64],
        max_idx: &[usize],
        min_idx: &[usize],
        min_duration: usize,
        window: usize,
        out: &mut Vec<Triangle>,
    ) {
        for triple in max_idx.windows(3) {
            let (peak1, peak2, peak3) = (triple[0], triple[1], triple[2]);

            if peak3 - peak1 < min_duration {
                continue;
            }

            let (p1, p2, p3) = (highs[peak1], highs[peak2], highs[peak3]);
            // Resistance must fall across the three peaks.
            if p1 <= p2 || p2 <= p3 {
                continue;
            }

            let troughs: Vec<usize> = min_idx
                .iter()
                .copied()
                .filter(|&t| t > peak1 && t < peak3)
                .collect();
            if troughs.len() < 2 {
                continue;
            }

            let (trough1, trough2) = (troughs[0], troughs[troughs.len() - 1]);
            let (v1, v2) = (lows[trough1], lows[trough2]);
            // Support must rise.
            if v1 >= v2 {
                continue;
            }

            let peak_slope = (p3 - p1) / (peak3 - peak1) as f64;
            let trough_slope = (v2 - v1) / (trough2 - trough1) as f64;

            // Converging lines have opposite-sign slopes.
            if peak_slope * trough_slope >= 0.0 {
                continue;
            }
            if (peak_slope - trough_slope).abs() <= 1e-10 {
                continue;
            }

            let converge_x = (v1 - p1 - trough_slope * trough1 as f64 + peak_slope * peak1 as f64)
                / (peak_slope - trough_slope);
            let converge_y = p1 + peak_slope * (converge_x - peak1 as f64);

            // Convergence should sit reasonably ahead of the formation.
            if converge_x < peak3 as f64 || converge_x > (peak3 + window) as f64 {
                continue;
            }

            let breakout = if peak3 + 5 < highs.len() {
                let expected = p1 + peak_slope * (peak3 + 5 - peak1) as f64;
                (closes[peak3 + 5] - expected).abs() / expected > BREAKOUT_DEVIATION
            } else {
                false
            };

            out.push(Triangle {
                kind: TriangleKind::Symmetric,
                points: [peak1, trough1, peak2, trough2, peak3],
                converge_index: converge_x as usize,
                converge_price: converge_y,
                breakout,
            });
        }
    }

    fn detect_ascending(
        highs: &[f64],
        lows: &[f64],
        closes: &[f64],
        max_idx: &[usize],
        min_idx: &[usize],
        min_duration: usize,
        out: &mut Vec<Triangle>,
    ) {
        for peaks in max_idx.windows(3) {
            if peaks[2] - peaks[0] < min_duration {
                continue;
            }

            let peak_prices: Vec<f64> = peaks.iter().map(|&p| highs[p]).collect();
            // Horizontal resistance: peaks at similar levels.
            if population_std(&peak_prices) / mean(&peak_prices) > FLAT_LINE_SPREAD {
                continue;
            }

            let troughs: Vec<usize> = min_idx
                .iter()
                .copied()
                .filter(|&t| t > peaks[0] && t < peaks[2])
                .collect();
            if troughs.len() < 2 {
                continue;
            }

            let trough_prices: Vec<f64> = troughs.iter().map(|&t| lows[t]).collect();
            if !trough_prices.windows(2).all(|w| w[0] < w[1]) {
                continue;
            }

            let resistance = mean(&peak_prices);
            let breakout = if peaks[2] + 5 < highs.len() {
                closes[peaks[2] + 5] > resistance
            } else {
                false
            };

            out.push(Triangle {
                kind: TriangleKind::Ascending,
                points: [peaks[0], troughs[0], peaks[1], troughs[troughs.len() - 1], peaks[2]],
                converge_index: peaks[2] + min_duration,
                converge_price: resistance,
                breakout,
            });
        }
    }

    fn detect_descending(
        highs: &[f64],
        lows: &[f64],
        closes: &[f64],
        max_idx: &[usize],
        min_idx: &[usize],
        min_duration: usize,
        out: &mut Vec<Triangle>,
    ) {
        for troughs in min_idx.windows(3) {
            if troughs[2] - troughs[0] < min_duration {
                continue;
            }

            let trough_prices: Vec<f64> = troughs.iter().map(|&t| lows[t]).collect();
            // Horizontal support: troughs at similar levels.
            if population_std(&trough_prices) / mean(&trough_prices) > FLAT_LINE_SPREAD {
                continue;
            }

            let peaks: Vec<usize> = max_idx
                .iter()
                .copied()
                .filter(|&p| p > troughs[0] && p < troughs[2])
                .collect();
            if peaks.len() < 2 {
                continue;
            }

            let peak_prices: Vec<f64> = peaks.iter().map(|&p| highs[p]).collect();
            if !peak_prices.windows(2).all(|w| w[0] > w[1]) {
                continue;
            }

            let support = mean(&trough_prices);
            let breakout = if troughs[2] + 5 < lows.len() {
                closes[troughs[2] + 5] < support
            } else {
                false
            };

            out.push(Triangle {
                kind: TriangleKind::Descending,
                points: [peaks[0], troughs[0], peaks[peaks.len() - 1], troughs[1], troughs[2]],
                converge_index: troughs[2] + min_duration,
                converge_price: support,
                breakout,
            });
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candles(high: &[f64], low: &[f64], close: &[f64]) -> CandleData {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut data = CandleData::new("TEST".into(), "1d".into());
        for i in 0..close.len() {
            let t = start + chrono::Duration::days(i as i64);
            data.push_candle(t, close[i], high[i], low[i], close[i], 1000.0);
        }
        data
    }

    #[test]
    fn detects_symmetric_triangle() {
        // Falling peaks at 5/12/20 (30 -> 28 -> 26) against rising troughs at
        // 9 (20.0) and 16 (21.0); lines converge just past the formation and
        // the close five candles after the last peak sits well under the
        // projected resistance.
        let high = [
            26.0, 27.0, 28.0, 29.0, 29.5, 30.0, 28.5, 27.0, 26.0, 25.5, 26.5, 27.2, 28.0, 27.0,
            26.0, 25.0, 24.5, 24.8, 25.2, 25.6, 26.0, 25.4, 24.8, 24.2, 23.8, 23.4, 23.0, 22.6,
            22.2, 21.8,
        ];
        let low = [
            24.0, 23.5, 23.0, 22.5, 22.0, 21.8, 21.4, 21.0, 20.4, 20.0, 20.8, 21.6, 22.4, 22.2,
            21.8, 21.3, 21.0, 21.6, 22.2, 22.8, 23.2, 22.6, 22.9, 23.2, 23.0, 22.8, 22.7, 22.6,
            22.8, 23.0,
        ];
        let close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();
        let data = candles(&high, &low, &close);

        let found = TriangleDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert_eq!(found.len(), 1);

        let tri = &found[0];
        assert_eq!(tri.kind, TriangleKind::Symmetric);
        assert_eq!(tri.points, [5, 9, 12, 16, 20]);
        assert_eq!(tri.converge_index, 30);
        assert!((tri.converge_price - 23.116279069767444).abs() < 1e-9);
        assert!(tri.breakout);
    }

    #[test]
    fn detects_ascending_triangle() {
        // Flat resistance: peaks at 5/12/19 near 20.0, well inside the 3%
        // spread bound. Rising support: troughs at 8 (15.0) and 15 (16.0).
        // The close five candles past the last peak clears the mean
        // resistance, so the breakout flag is set.
        let high = [
            17.0, 17.8, 18.6, 19.2, 19.7, 20.0, 19.0, 18.2, 17.6, 18.4, 19.2, 19.7, 19.9, 19.0,
            18.2, 17.8, 18.6, 19.3, 19.8, 20.0, 19.6, 19.2, 18.8, 19.2, 19.98, 19.5,
        ];
        let low = [
            17.0, 16.8, 16.5, 16.2, 15.9, 15.6, 15.4, 15.2, 15.0, 15.5, 16.0, 16.5, 17.0, 16.7,
            16.4, 16.0, 16.4, 17.6, 17.8, 18.0, 17.9, 17.7, 17.5, 17.8, 18.1, 18.4,
        ];
        let mut close: Vec<f64> = high
            .iter()
            .zip(&low)
            .map(|(h, l)| l + 0.6 * (h - l))
            .collect();
        close[24] = 19.97;
        let data = candles(&high, &low, &close);

        let found = TriangleDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert_eq!(found.len(), 1);

        let tri = &found[0];
        assert_eq!(tri.kind, TriangleKind::Ascending);
        assert_eq!(tri.points, [5, 8, 12, 15, 19]);
        assert_eq!(tri.converge_index, 31);
        assert!((tri.converge_price - 19.966666666666665).abs() < 1e-9);
        assert!(tri.breakout);
    }

    #[test]
    fn detects_descending_triangle() {
        // Flat support: troughs at 5/12/19 near 10.0. Falling resistance:
        // peaks at 8 (16.0) and 15 (15.0). The anchor ordering interleaves
        // the first peak before the first trough.
        let low = [
            11.0, 10.8, 10.5, 10.3, 10.1, 10.0, 10.4, 10.8, 11.2, 10.9, 10.6, 10.3, 10.05, 10.4,
            10.8, 11.0, 10.7, 10.4, 10.2, 10.0, 10.2, 10.4, 10.6, 10.8, 10.0, 11.0,
        ];
        let high = [
            13.0, 13.4, 13.8, 14.2, 14.6, 15.0, 15.4, 15.8, 16.0, 15.6, 14.8, 14.4, 14.0, 14.4,
            14.7, 15.0, 14.6, 14.2, 13.8, 13.4, 13.6, 13.9, 14.3, 14.8, 15.3, 15.5,
        ];
        let mut close: Vec<f64> = high.iter().zip(&low).map(|(h, l)| (h + l) / 2.0).collect();
        close[24] = 10.0;
        let data = candles(&high, &low, &close);

        let found = TriangleDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert_eq!(found.len(), 1);

        let tri = &found[0];
        assert_eq!(tri.kind, TriangleKind::Descending);
        assert_eq!(tri.points, [8, 5, 15, 12, 19]);
        assert_eq!(tri.converge_index, 31);
        assert!((tri.converge_price - 10.016666666666667).abs() < 1e-9);
        assert!(tri.breakout);
    }

    #[test]
    fn parallel_channel_is_not_a_triangle() {
        // Highs and lows drift down in parallel; the support never rises so
        // no branch fires.
        let high: Vec<f64> = (0..40).map(|i| 30.0 - i as f64 * 0.2).collect();
        let low: Vec<f64> = high.iter().map(|x| x - 3.0).collect();
        let close: Vec<f64> = high.iter().map(|x| x - 1.5).collect();
        let data = candles(&high, &low, &close);

        let found = TriangleDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert!(found.is_empty());
    }
}
