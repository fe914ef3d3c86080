use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::indicators::ta::{ExponentialMovingAverage, Next, SimpleMovingAverage, StandardDeviation};
use crate::series::CandleData;

/// Bollinger band values per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// The classic 20/50/200 moving-average set. The longer averages stay `None`
/// until their own windows fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverageSet {
    pub sma_20: f64,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
}

pub struct OverlapCalculator;

impl OverlapCalculator {
    // Calculate SMA (Simple Moving Average)
    pub fn calculate_sma(
        candle_data: &CandleData,
        period: usize,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        candle_data.validate()?;
        if candle_data.close.len() < period {
            return Err(anyhow::anyhow!("Not enough data points for SMA calculation"));
        }

        let mut sma = SimpleMovingAverage::new(period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let value = sma.next(close);

            if !value.is_nan() {
                results.push((candle_data.open_time[i], value));
            }
        }

        Ok(results)
    }

    // Calculate EMA (Exponential Moving Average)
    pub fn calculate_ema(
        candle_data: &CandleData,
        period: usize,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        candle_data.validate()?;
        if candle_data.close.len() < period {
            return Err(anyhow::anyhow!("Not enough data points for EMA calculation"));
        }

        let mut ema = ExponentialMovingAverage::new(period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let value = ema.next(close);

            if !value.is_nan() {
                results.push((candle_data.open_time[i], value));
            }
        }

        Ok(results)
    }

    // Calculate Bollinger Bands (SMA middle band, num_std sample deviations out)
    pub fn calculate_bollinger_bands(
        candle_data: &CandleData,
        period: usize,
        num_std: f64,
    ) -> Result<Vec<(DateTime<Utc>, BollingerPoint)>> {
        candle_data.validate()?;
        if candle_data.close.len() < period {
            return Err(anyhow::anyhow!(
                "Not enough data points for Bollinger Bands calculation"
            ));
        }

        let mut sma = SimpleMovingAverage::new(period)?;
        let mut stddev = StandardDeviation::new(period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let middle = sma.next(close);
            let sd = stddev.next(close);

            if !middle.is_nan() && !sd.is_nan() {
                results.push((
                    candle_data.open_time[i],
                    BollingerPoint {
                        upper: middle + sd * num_std,
                        middle,
                        lower: middle - sd * num_std,
                    },
                ));
            }
        }

        Ok(results)
    }

    // Calculate the 20/50/200 SMA set in one pass
    pub fn calculate_moving_average_set(
        candle_data: &CandleData,
    ) -> Result<Vec<(DateTime<Utc>, MovingAverageSet)>> {
        candle_data.validate()?;
        if candle_data.close.len() < 20 {
            return Err(anyhow::anyhow!(
                "Not enough data points for moving average calculation"
            ));
        }

        let mut sma_20 = SimpleMovingAverage::new(20)?;
        let mut sma_50 = SimpleMovingAverage::new(50)?;
        let mut sma_200 = SimpleMovingAverage::new(200)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let short = sma_20.next(close);
            let mid = sma_50.next(close);
            let long = sma_200.next(close);

            if !short.is_nan() {
                results.push((
                    candle_data.open_time[i],
                    MovingAverageSet {
                        sma_20: short,
                        sma_50: (!mid.is_nan()).then_some(mid),
                        sma_200: (!long.is_nan()).then_some(long),
                    },
                ));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn close_candles(close: &[f64]) -> CandleData {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut data = CandleData::new("TEST".into(), "1d".into());
        for (i, &c) in close.iter().enumerate() {
            let t = start + chrono::Duration::days(i as i64);
            data.push_candle(t, c, c + 0.5, c - 0.5, c, 1000.0);
        }
        data
    }

    #[test]
    fn sma_rows_start_after_warmup() {
        let close: Vec<f64> = (1..=6).map(f64::from).collect();
        let data = close_candles(&close);

        let rows = OverlapCalculator::calculate_sma(&data, 3).unwrap();
        assert_eq!(rows.len(), 4);
        assert!((rows[0].1 - 2.0).abs() < 1e-12);
        assert!((rows[3].1 - 5.0).abs() < 1e-12);
        assert_eq!(rows[0].0, data.open_time[2]);
    }

    #[test]
    fn bollinger_bands_bracket_the_middle() {
        let close = [1.0, 2.0, 3.0, 4.0, 5.0];
        let data = close_candles(&close);

        let rows = OverlapCalculator::calculate_bollinger_bands(&data, 3, 2.0).unwrap();
        assert_eq!(rows.len(), 3);
        // Window [1,2,3]: middle 2, sample std 1, bands at 0 and 4.
        let first = rows[0].1;
        assert!((first.middle - 2.0).abs() < 1e-12);
        assert!((first.upper - 4.0).abs() < 1e-12);
        assert!((first.lower - 0.0).abs() < 1e-12);
    }

    #[test]
    fn moving_average_set_fills_in_longer_windows() {
        let close: Vec<f64> = (0..60).map(|i| 10.0 + i as f64 * 0.1).collect();
        let data = close_candles(&close);

        let rows = OverlapCalculator::calculate_moving_average_set(&data).unwrap();
        assert_eq!(rows.len(), 60 - 19);
        assert!(rows[0].1.sma_50.is_none());
        assert!(rows.last().unwrap().1.sma_50.is_some());
        // Not enough candles for the 200-day average at all.
        assert!(rows.iter().all(|(_, m)| m.sma_200.is_none()));
    }

    #[test]
    fn too_short_series_is_an_error() {
        let data = close_candles(&[1.0, 2.0]);
        assert!(OverlapCalculator::calculate_sma(&data, 3).is_err());
        assert!(OverlapCalculator::calculate_bollinger_bands(&data, 20, 2.0).is_err());
        assert!(OverlapCalculator::calculate_moving_average_set(&data).is_err());
    }
}
