use anyhow::Result;
use serde::Serialize;

use crate::series::CandleData;

/// Fibonacci retracement levels between the series extremes. The `0.0` level
/// sits at the low and `1.0` at the high; the intermediate ratios measure how
/// far a level sits up the low-to-high range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevels {
    #[serde(rename = "0.0")]
    pub level_0: f64,
    #[serde(rename = "0.236")]
    pub level_236: f64,
    #[serde(rename = "0.382")]
    pub level_382: f64,
    #[serde(rename = "0.5")]
    pub level_500: f64,
    #[serde(rename = "0.618")]
    pub level_618: f64,
    #[serde(rename = "0.786")]
    pub level_786: f64,
    #[serde(rename = "1.0")]
    pub level_1000: f64,
}

// Calculate Fibonacci retracement levels from the lowest low and highest high
pub fn fibonacci_retracement(candle_data: &CandleData) -> Result<FibonacciLevels> {
    candle_data.validate()?;
    if candle_data.close.is_empty() {
        return Err(anyhow::anyhow!(
            "Not enough data points for Fibonacci retracement calculation"
        ));
    }

    let high = candle_data.high.iter().cloned().fold(f64::MIN, f64::max);
    let low = candle_data.low.iter().cloned().fold(f64::MAX, f64::min);
    let diff = high - low;

    Ok(FibonacciLevels {
        level_0: low,
        level_236: low + 0.236 * diff,
        level_382: low + 0.382 * diff,
        level_500: low + 0.5 * diff,
        level_618: low + 0.618 * diff,
        level_786: low + 0.786 * diff,
        level_1000: high,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candles(high: &[f64], low: &[f64]) -> CandleData {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut data = CandleData::new("TEST".into(), "1d".into());
        for i in 0..high.len() {
            let t = start + chrono::Duration::days(i as i64);
            let mid = (high[i] + low[i]) / 2.0;
            data.push_candle(t, mid, high[i], low[i], mid, 1000.0);
        }
        data
    }

    #[test]
    fn levels_span_the_series_extremes() {
        let data = candles(&[12.0, 20.0, 15.0], &[10.0, 14.0, 11.0]);

        let levels = fibonacci_retracement(&data).unwrap();
        // Levels ascend from the lowest low to the highest high.
        assert!((levels.level_0 - 10.0).abs() < 1e-12);
        assert!((levels.level_1000 - 20.0).abs() < 1e-12);
        // 0.5 retracement of the 10-point range.
        assert!((levels.level_500 - 15.0).abs() < 1e-12);
        assert!((levels.level_236 - 12.36).abs() < 1e-12);
        assert!((levels.level_786 - 17.86).abs() < 1e-12);
    }

    #[test]
    fn serializes_under_ratio_keys() {
        let data = candles(&[20.0], &[10.0]);
        let levels = fibonacci_retracement(&data).unwrap();
        let value = serde_json::to_value(levels).unwrap();
        assert_eq!(value["0.0"], 10.0);
        assert_eq!(value["1.0"], 20.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let data = CandleData::new("TEST".into(), "1d".into());
        assert!(fibonacci_retracement(&data).is_err());
    }
}
