use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::indicators::ta::{
    MacdOutput, MovingAverageConvergenceDivergence, Next, RelativeStrengthIndex, RollingMax,
    RollingMin, SimpleMovingAverage,
};
use crate::series::CandleData;

/// Stochastic oscillator output per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticOutput {
    pub k: f64,
    pub d: f64,
}

pub struct OscillatorCalculator;

impl OscillatorCalculator {
    // Calculate RSI (Relative Strength Index)
    pub fn calculate_rsi(
        candle_data: &CandleData,
        period: usize,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        candle_data.validate()?;
        if candle_data.close.len() < period + 1 {
            return Err(anyhow::anyhow!("Not enough data points for RSI calculation"));
        }

        let mut rsi = RelativeStrengthIndex::new(period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let value = rsi.next(close);

            if !value.is_nan() {
                results.push((candle_data.open_time[i], value));
            }
        }

        Ok(results)
    }

    // Calculate MACD (Moving Average Convergence Divergence)
    pub fn calculate_macd(
        candle_data: &CandleData,
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Vec<(DateTime<Utc>, MacdOutput)>> {
        candle_data.validate()?;
        if candle_data.close.len() < slow_period + signal_period {
            return Err(anyhow::anyhow!("Not enough data points for MACD calculation"));
        }

        let mut macd =
            MovingAverageConvergenceDivergence::new(fast_period, slow_period, signal_period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for (i, &close) in candle_data.close.iter().enumerate() {
            let value = macd.next(close);

            // The histogram is the last component to warm up.
            if !value.histogram.is_nan() {
                results.push((candle_data.open_time[i], value));
            }
        }

        Ok(results)
    }

    // Calculate the Stochastic Oscillator (%K and its %D moving average)
    pub fn calculate_stochastic(
        candle_data: &CandleData,
        k_period: usize,
        d_period: usize,
    ) -> Result<Vec<(DateTime<Utc>, StochasticOutput)>> {
        candle_data.validate()?;
        if candle_data.close.len() < k_period + d_period - 1 {
            return Err(anyhow::anyhow!(
                "Not enough data points for Stochastic calculation"
            ));
        }

        let mut lowest = RollingMin::new(k_period)?;
        let mut highest = RollingMax::new(k_period)?;
        let mut d_sma = SimpleMovingAverage::new(d_period)?;
        let mut results = Vec::with_capacity(candle_data.close.len());

        for i in 0..candle_data.close.len() {
            let low = lowest.next(candle_data.low[i]);
            let high = highest.next(candle_data.high[i]);

            let k = if low.is_nan() || high.is_nan() || high == low {
                // A degenerate window (zero range) has no defined %K.
                f64::NAN
            } else {
                100.0 * (candle_data.close[i] - low) / (high - low)
            };

            let d = if k.is_nan() { f64::NAN } else { d_sma.next(k) };

            if !k.is_nan() && !d.is_nan() {
                results.push((candle_data.open_time[i], StochasticOutput { k, d }));
            }
        }

        Ok(results)
    }
}
