//! Streaming indicator primitives.
//!
//! Each indicator consumes one sample at a time through the `Next` trait and
//! returns NaN until its warmup window is full. The calculators in the
//! sibling modules drive these over candle series and drop the NaN rows.

use anyhow::Result;
use serde::Serialize;

/// The `Next` trait is used for indicators that produce a value per input.
pub trait Next<T> {
    type Output;
    fn next(&mut self, input: T) -> Self::Output;
}

/// Simple Moving Average over a fixed window.
pub struct SimpleMovingAverage {
    period: usize,
    values: Vec<f64>,
}

impl SimpleMovingAverage {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            values: Vec::with_capacity(period),
        })
    }
}

impl Next<f64> for SimpleMovingAverage {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        if self.values.len() >= self.period {
            self.values.remove(0);
        }
        self.values.push(input);

        if self.values.len() < self.period {
            return f64::NAN;
        }

        self.values.iter().sum::<f64>() / self.period as f64
    }
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// samples.
pub struct ExponentialMovingAverage {
    period: usize,
    alpha: f64,
    value: Option<f64>,
    index: usize,
    sum: f64,
}

impl ExponentialMovingAverage {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
            index: 0,
            sum: 0.0,
        })
    }
}

impl Next<f64> for ExponentialMovingAverage {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        match self.value {
            None => {
                self.sum += input;
                self.index += 1;
                if self.index < self.period {
                    return f64::NAN;
                }
                let seed = self.sum / self.period as f64;
                self.value = Some(seed);
                seed
            }
            Some(prev) => {
                let next = input * self.alpha + prev * (1.0 - self.alpha);
                self.value = Some(next);
                next
            }
        }
    }
}

/// Rolling sample standard deviation (n-1 denominator) over a fixed window.
pub struct StandardDeviation {
    period: usize,
    values: Vec<f64>,
}

impl StandardDeviation {
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(anyhow::anyhow!("Period must be greater than 1"));
        }

        Ok(Self {
            period,
            values: Vec::with_capacity(period),
        })
    }
}

impl Next<f64> for StandardDeviation {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        if self.values.len() >= self.period {
            self.values.remove(0);
        }
        self.values.push(input);

        if self.values.len() < self.period {
            return f64::NAN;
        }

        let mean = self.values.iter().sum::<f64>() / self.period as f64;
        let variance =
            self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (self.period - 1) as f64;

        variance.sqrt()
    }
}

/// Relative Strength Index over rolling mean gains and losses.
///
/// Plain rolling means, not Wilder smoothing: emits from the second sample
/// onward, averaging over however many deltas are available up to `period`.
pub struct RelativeStrengthIndex {
    period: usize,
    prev_value: Option<f64>,
    deltas: Vec<f64>,
}

impl RelativeStrengthIndex {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            prev_value: None,
            deltas: Vec::with_capacity(period),
        })
    }
}

impl Next<f64> for RelativeStrengthIndex {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let Some(prev) = self.prev_value.replace(input) else {
            return f64::NAN;
        };

        if self.deltas.len() >= self.period {
            self.deltas.remove(0);
        }
        self.deltas.push(input - prev);

        let count = self.deltas.len() as f64;
        let avg_gain = self.deltas.iter().filter(|&&d| d > 0.0).sum::<f64>() / count;
        let avg_loss = -self.deltas.iter().filter(|&&d| d < 0.0).sum::<f64>() / count;

        if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                // Flat window: 0/0 relative strength is undefined.
                return f64::NAN;
            }
            return 100.0;
        }

        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// MACD output per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Moving Average Convergence Divergence: fast EMA minus slow EMA, with an
/// EMA signal line fed only once the MACD line itself is warm.
pub struct MovingAverageConvergenceDivergence {
    fast_ema: ExponentialMovingAverage,
    slow_ema: ExponentialMovingAverage,
    signal_ema: ExponentialMovingAverage,
}

impl MovingAverageConvergenceDivergence {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Result<Self> {
        if fast_period == 0 || slow_period == 0 || signal_period == 0 {
            return Err(anyhow::anyhow!("Periods must be greater than 0"));
        }
        if fast_period >= slow_period {
            return Err(anyhow::anyhow!("Fast period must be less than slow period"));
        }

        Ok(Self {
            fast_ema: ExponentialMovingAverage::new(fast_period)?,
            slow_ema: ExponentialMovingAverage::new(slow_period)?,
            signal_ema: ExponentialMovingAverage::new(signal_period)?,
        })
    }
}

impl Next<f64> for MovingAverageConvergenceDivergence {
    type Output = MacdOutput;

    fn next(&mut self, input: f64) -> Self::Output {
        let fast = self.fast_ema.next(input);
        let slow = self.slow_ema.next(input);
        let macd = fast - slow;

        let signal = if macd.is_finite() {
            self.signal_ema.next(macd)
        } else {
            f64::NAN
        };

        MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}

/// Rolling minimum over a fixed window.
pub struct RollingMin {
    period: usize,
    values: Vec<f64>,
}

impl RollingMin {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            values: Vec::with_capacity(period),
        })
    }
}

impl Next<f64> for RollingMin {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        if self.values.len() >= self.period {
            self.values.remove(0);
        }
        self.values.push(input);

        if self.values.len() < self.period {
            return f64::NAN;
        }

        self.values.iter().cloned().fold(f64::MAX, f64::min)
    }
}

/// Rolling maximum over a fixed window.
pub struct RollingMax {
    period: usize,
    values: Vec<f64>,
}

impl RollingMax {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(anyhow::anyhow!("Period must be greater than 0"));
        }

        Ok(Self {
            period,
            values: Vec::with_capacity(period),
        })
    }
}

impl Next<f64> for RollingMax {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        if self.values.len() >= self.period {
            self.values.remove(0);
        }
        self.values.push(input);

        if self.values.len() < self.period {
            return f64::NAN;
        }

        self.values.iter().cloned().fold(f64::MIN, f64::max)
    }
}
