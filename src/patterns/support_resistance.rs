use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::patterns::extrema::{local_maxima, local_minima};
use crate::patterns::Sensitivity;
use crate::series::CandleData;

/// Default lookback controlling the extrema neighborhood.
pub const DEFAULT_WINDOW: usize = 30;

/// Confirmed price levels: indices of lows acting as support and highs
/// acting as resistance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupportResistance {
    pub support: Vec<usize>,
    pub resistance: Vec<usize>,
}

pub struct SupportResistanceDetector;

impl SupportResistanceDetector {
    /// A candidate extremum becomes a confirmed level when enough other
    /// samples approach its price within the sensitivity-scaled threshold.
    pub fn detect(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<SupportResistance> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let num_touches = (6usize.saturating_sub(usize::from(sensitivity.level() / 2))).max(2);
        let price_threshold = sensitivity.scaled(0.02);
        let order = (window / 5).max(1);

        let highs = &candle_data.high;
        let lows = &candle_data.low;

        let support = confirmed_levels(lows, &local_minima(lows, order), num_touches, price_threshold);
        let resistance =
            confirmed_levels(highs, &local_maxima(highs, order), num_touches, price_threshold);

        debug!(
            support = support.len(),
            resistance = resistance.len(),
            "support/resistance scan complete"
        );
        Ok(SupportResistance { support, resistance })
    }
}

fn confirmed_levels(
    values: &[f64],
    candidates: &[usize],
    num_touches: usize,
    threshold: f64,
) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&idx| {
            let level = values[idx];
            let touches = values
                .iter()
                .enumerate()
                .filter(|&(i, v)| i != idx && (v - level).abs() / level < threshold)
                .count();
            touches >= num_touches
        })
        .collect()
}
