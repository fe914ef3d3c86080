use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// OHLCV candle series stored as parallel column vectors.
///
/// All columns must have the same length and every sample must be finite;
/// `validate` checks both before any detector touches the data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandleData {
    pub symbol: String,
    pub interval: String,
    pub open_time: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl CandleData {
    pub fn new(symbol: String, interval: String) -> Self {
        Self {
            symbol,
            interval,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn push_candle(
        &mut self,
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) {
        self.open_time.push(open_time);
        self.open.push(open);
        self.high.push(high);
        self.low.push(low);
        self.close.push(close);
        self.volume.push(volume);
    }

    /// Checks that all columns agree in length and contain only finite values.
    pub fn validate(&self) -> Result<(), ScanError> {
        let n = self.close.len();
        let columns = [
            ("open", &self.open),
            ("high", &self.high),
            ("low", &self.low),
            ("volume", &self.volume),
        ];

        for (name, column) in &columns {
            if column.len() != n {
                return Err(ScanError::InvalidInput(format!(
                    "column '{}' has {} samples, expected {}",
                    name,
                    column.len(),
                    n
                )));
            }
        }
        if self.open_time.len() != n {
            return Err(ScanError::InvalidInput(format!(
                "column 'open_time' has {} samples, expected {}",
                self.open_time.len(),
                n
            )));
        }

        for (name, column) in &columns {
            validate_series(column).map_err(|_| {
                ScanError::InvalidInput(format!("column '{}' contains a non-finite sample", name))
            })?;
        }
        validate_series(&self.close)
            .map_err(|_| ScanError::InvalidInput("column 'close' contains a non-finite sample".into()))?;

        Ok(())
    }
}

/// Rejects NaN and infinite samples before a scan begins.
pub fn validate_series(series: &[f64]) -> Result<(), ScanError> {
    match series.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ScanError::InvalidInput(format!(
            "non-finite sample at index {i}"
        ))),
        None => Ok(()),
    }
}
