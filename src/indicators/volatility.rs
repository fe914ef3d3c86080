use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::indicators::ta::{Next, SimpleMovingAverage};
use crate::series::CandleData;

pub struct VolatilityCalculator;

impl VolatilityCalculator {
    // Calculate True Range
    pub fn calculate_true_range(
        candle_data: &CandleData,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        candle_data.validate()?;
        if candle_data.close.len() < 2 {
            return Err(anyhow::anyhow!(
                "Not enough data points for True Range calculation"
            ));
        }

        let mut results = Vec::with_capacity(candle_data.close.len() - 1);

        // Skip the first candle as we need a previous close.
        for i in 1..candle_data.close.len() {
            // TR = max(high - low, |high - prev_close|, |low - prev_close|)
            let high = candle_data.high[i];
            let low = candle_data.low[i];
            let prev_close = candle_data.close[i - 1];

            let range1 = high - low;
            let range2 = (high - prev_close).abs();
            let range3 = (low - prev_close).abs();

            results.push((candle_data.open_time[i], range1.max(range2).max(range3)));
        }

        Ok(results)
    }

    // Calculate ATR (Average True Range) as the rolling mean of True Range
    pub fn calculate_atr(
        candle_data: &CandleData,
        period: usize,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        if candle_data.close.len() < period + 1 {
            return Err(anyhow::anyhow!("Not enough data points for ATR calculation"));
        }

        let tr_values = Self::calculate_true_range(candle_data)?;

        let mut sma = SimpleMovingAverage::new(period)?;
        let mut results = Vec::with_capacity(tr_values.len());

        for (time, tr) in tr_values {
            let value = sma.next(tr);

            if !value.is_nan() {
                results.push((time, value));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

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
    fn true_range_picks_the_widest_measure() {
        let high = [10.0, 12.0, 11.0];
        let low = [9.0, 10.5, 8.0];
        let close = [9.5, 11.0, 9.0];
        let data = candles(&high, &low, &close);

        let rows = VolatilityCalculator::calculate_true_range(&data).unwrap();
        assert_eq!(rows.len(), 2);
        // i=1: max(1.5, |12-9.5|, |10.5-9.5|) = 2.5
        assert!((rows[0].1 - 2.5).abs() < 1e-12);
        // i=2: max(3.0, |11-11|, |8-11|) = 3.0
        assert!((rows[1].1 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn atr_is_rolling_mean_of_true_range() {
        let high = [10.0, 12.0, 11.0, 11.5];
        let low = [9.0, 10.5, 8.0, 10.0];
        let close = [9.5, 11.0, 9.0, 11.0];
        let data = candles(&high, &low, &close);

        let rows = VolatilityCalculator::calculate_atr(&data, 2).unwrap();
        // TRs are [2.5, 3.0, 2.5]; two-sample means are [2.75, 2.75].
        assert_eq!(rows.len(), 2);
        assert!((rows[0].1 - 2.75).abs() < 1e-12);
        assert!((rows[1].1 - 2.75).abs() < 1e-12);
    }

    #[test]
    fn single_candle_is_an_error() {
        let data = candles(&[10.0], &[9.0], &[9.5]);
        assert!(VolatilityCalculator::calculate_true_range(&data).is_err());
    }
}
