use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::patterns::extrema::{local_maxima, local_minima};
use crate::patterns::Sensitivity;
use crate::series::CandleData;

/// Default lookback for both variants.
pub const DEFAULT_WINDOW: usize = 30;

/// A head & shoulders match: three peaks and the two neckline troughs
/// between them, as indices into the candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadShoulders {
    pub left_shoulder: usize,
    pub left_trough: usize,
    pub head: usize,
    pub right_trough: usize,
    pub right_shoulder: usize,
}

/// The inverted variant: three troughs and the two neckline peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InverseHeadShoulders {
    pub left_shoulder: usize,
    pub left_peak: usize,
    pub head: usize,
    pub right_peak: usize,
    pub right_shoulder: usize,
}

pub struct HeadShouldersDetector;

impl HeadShouldersDetector {
    /// Three consecutive peaks with the head strictly highest, shoulders and
    /// neckline troughs within tolerance, confirmed by a close below the
    /// neckline average five candles after the right shoulder.
    pub fn detect(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<Vec<HeadShoulders>> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let tolerance = sensitivity.scaled(0.05);
        let min_distance =
            ((window as f64 * 0.2 * f64::from(sensitivity.inverted()) / 10.0) as usize).max(3);
        let order = (window / 6).max(1);

        let highs = &candle_data.high;
        let lows = &candle_data.low;
        let closes = &candle_data.close;
        let max_idx = local_maxima(highs, order);

        let mut matches = Vec::new();
        if max_idx.len() < 3 {
            return Ok(matches);
        }

        for triple in max_idx.windows(3) {
            let (peak1, peak2, peak3) = (triple[0], triple[1], triple[2]);

            if peak2 - peak1 < min_distance || peak3 - peak2 < min_distance {
                continue;
            }

            let (p1, p2, p3) = (highs[peak1], highs[peak2], highs[peak3]);

            // Head must stand above both shoulders.
            if p2 <= p1 || p2 <= p3 {
                continue;
            }
            if (p1 - p3).abs() / p1 > tolerance {
                continue;
            }

            let trough1 = argmin(lows, peak1, peak2);
            let trough2 = argmin(lows, peak2, peak3);

            // Neckline should be roughly flat.
            if (lows[trough1] - lows[trough2]).abs() / lows[trough1] > tolerance {
                continue;
            }

            let confirmed = if peak3 + 5 < highs.len() {
                let neckline = (lows[trough1] + lows[trough2]) / 2.0;
                closes[peak3 + 5] < neckline
            } else {
                closes[closes.len() - 1] < closes[peak3]
            };

            if confirmed {
                debug!(head = peak2, "head & shoulders candidate");
                matches.push(HeadShoulders {
                    left_shoulder: peak1,
                    left_trough: trough1,
                    head: peak2,
                    right_trough: trough2,
                    right_shoulder: peak3,
                });
            }
        }

        Ok(matches)
    }

    /// Mirror on the lows: head strictly lowest, neckline from the two
    /// inter-trough peaks, confirmed by a close above the neckline average.
    pub fn detect_inverse(
        candle_data: &CandleData,
        sensitivity: Sensitivity,
        window: usize,
    ) -> Result<Vec<InverseHeadShoulders>> {
        candle_data.validate()?;
        if window == 0 {
            return Err(anyhow::anyhow!("Window must be greater than 0"));
        }

        let tolerance = sensitivity.scaled(0.05);
        let min_distance =
            ((window as f64 * 0.2 * f64::from(sensitivity.inverted()) / 10.0) as usize).max(3);
        let order = (window / 6).max(1);

        let highs = &candle_data.high;
        let lows = &candle_data.low;
        let closes = &candle_data.close;
        let min_idx = local_minima(lows, order);

        let mut matches = Vec::new();
        if min_idx.len() < 3 {
            return Ok(matches);
        }

        for triple in min_idx.windows(3) {
            let (trough1, trough2, trough3) = (triple[0], triple[1], triple[2]);

            if trough2 - trough1 < min_distance || trough3 - trough2 < min_distance {
                continue;
            }

            let (v1, v2, v3) = (lows[trough1], lows[trough2], lows[trough3]);

            if v2 >= v1 || v2 >= v3 {
                continue;
            }
            if (v1 - v3).abs() / v1 > tolerance {
                continue;
            }

            let peak1 = argmax(highs, trough1, trough2);
            let peak2 = argmax(highs, trough2, trough3);

            if (highs[peak1] - highs[peak2]).abs() / highs[peak1] > tolerance {
                continue;
            }

            let confirmed = if trough3 + 5 < lows.len() {
                let neckline = (highs[peak1] + highs[peak2]) / 2.0;
                closes[trough3 + 5] > neckline
            } else {
                closes[closes.len() - 1] > closes[trough3]
            };

            if confirmed {
                debug!(head = trough2, "inverse head & shoulders candidate");
                matches.push(InverseHeadShoulders {
                    left_shoulder: trough1,
                    left_peak: peak1,
                    head: trough2,
                    right_peak: peak2,
                    right_shoulder: trough3,
                });
            }
        }

        Ok(matches)
    }
}

/// Absolute index of the smallest value in `values[from..to)`, first
/// occurrence on ties. Callers guarantee a non-empty range.
fn argmin(values: &[f64], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from..to {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

fn argmax(values: &[f64], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from..to {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}
