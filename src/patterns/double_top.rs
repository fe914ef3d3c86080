use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::patterns::extrema::local_maxima;
use crate::patterns::Sensitivity;
use crate::series::CandleData;

/// Default lookback for the extrema-based detector.
pub const DEFAULT_WINDOW: usize = 20;

/// Minimum relative drop required between the two peaks.
const MIN_DROP: f64 = 0.02;

/// A matched double top: the two peak indices into the candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoubleTop {
    pub first_peak: usize,
    pub second_peak: usize,
}

/// Mirror of the double-bottom detector on the highs: two local maxima at
/// similar price levels with a meaningful drop between them and a falling
/// close after the second peak.
pub struct DoubleTopDetector;

impl DoubleTopDetector {
    pub fn detect(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<Vec<DoubleTop>> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let tolerance = sensitivity.scaled(0.03);
        let min_distance =
            ((window as f64 * 0.7 * f64::from(sensitivity.inverted()) / 10.0) as usize).max(5);
        let order = (window / 4).max(1);

        let highs = &candle_data.high;
        let closes = &candle_data.close;
        let max_idx = local_maxima(highs, order);

        let mut matches = Vec::new();

        for i in 0..max_idx.len().saturating_sub(1) {
            for j in (i + 1)..max_idx.len() {
                let (idx1, idx2) = (max_idx[i], max_idx[j]);

                if idx2 - idx1 < min_distance {
                    continue;
                }

                let (price1, price2) = (highs[idx1], highs[idx2]);
                if (price1 - price2).abs() / price1 > tolerance {
                    continue;
                }

                // Require a real pullback between the peaks.
                let min_between = closes[idx1..idx2].iter().cloned().fold(f64::MAX, f64::min);
                if (price1 - min_between) / price1 < MIN_DROP
                    || (price2 - min_between) / price2 < MIN_DROP
                {
                    continue;
                }

                // Confirmation: price falls after the second top.
                let confirmed = if idx2 + 5 < closes.len() {
                    closes[idx2 + 5] < price2
                } else {
                    closes[closes.len() - 1] < price2
                };

                if confirmed {
                    debug!(first = idx1, second = idx2, "double top candidate");
                    matches.push(DoubleTop {
                        first_peak: idx1,
                        second_peak: idx2,
                    });
                }
            }
        }

        Ok(matches)
    }
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
    fn detector_finds_twin_peaks() {
        // The inverted shape of the double-bottom fixture: peaks in the highs
        // at 8 and 20 with a pullback between them and a falling tail.
        let trough_lows = [
            14.0, 13.6, 13.2, 12.8, 12.2, 11.6, 11.0, 10.4, 10.0, 10.6, 11.2, 11.8, 12.4, 12.8,
            13.0, 12.6, 12.0, 11.4, 10.8, 10.4, 10.2, 10.8, 11.4, 12.0, 12.6, 13.0, 13.4, 13.6,
            13.8, 14.0,
        ];
        let high: Vec<f64> = trough_lows.iter().map(|x| 30.0 - (x - 10.0)).collect();
        let close: Vec<f64> = high.iter().map(|x| x - 0.4).collect();
        let low: Vec<f64> = high.iter().map(|x| x - 0.8).collect();
        let data = candles(&high, &low, &close);

        let found =
            DoubleTopDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert_eq!(
            found,
            vec![DoubleTop {
                first_peak: 8,
                second_peak: 20
            }]
        );
    }

    #[test]
    fn detector_rejects_flat_series() {
        let high = [10.0; 30];
        let low: Vec<f64> = high.iter().map(|x| x - 0.5).collect();
        let close: Vec<f64> = high.iter().map(|x| x - 0.2).collect();
        let data = candles(&high, &low, &close);

        // Every index is a plateau maximum but no pullback exists between any
        // pair, so nothing qualifies.
        let found =
            DoubleTopDetector::detect(&data, Sensitivity::default(), DEFAULT_WINDOW).unwrap();
        assert!(found.is_empty());
    }
}
