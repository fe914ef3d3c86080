use anyhow::Result;
use serde_json::{json, Value};
use tracing::debug;

use crate::patterns::{
    double_bottom, double_top, head_shoulders, support_resistance, triangle,
    DoubleBottomDetector, DoubleTopDetector, HeadShouldersDetector, Sensitivity,
    SupportResistanceDetector, TriangleDetector,
};
use crate::series::CandleData;

pub struct PatternRecognizer;

impl PatternRecognizer {
    /// Runs every detector with its default window and aggregates the
    /// non-empty results into a single JSON value keyed by pattern name.
    pub fn detect_all(candle_data: &CandleData, sensitivity: Sensitivity) -> Result<Value> {
        candle_data.validate()?;

        let mut patterns = json!({});

        let double_bottoms =
            DoubleBottomDetector::detect(candle_data, sensitivity, double_bottom::DEFAULT_WINDOW)?;
        if !double_bottoms.is_empty() {
            patterns["double_bottom"] = serde_json::to_value(&double_bottoms)?;
        }

        let double_tops =
            DoubleTopDetector::detect(candle_data, sensitivity, double_top::DEFAULT_WINDOW)?;
        if !double_tops.is_empty() {
            patterns["double_top"] = serde_json::to_value(&double_tops)?;
        }

        let hs = HeadShouldersDetector::detect(
            candle_data,
            sensitivity,
            head_shoulders::DEFAULT_WINDOW,
        )?;
        if !hs.is_empty() {
            patterns["head_and_shoulders"] = serde_json::to_value(&hs)?;
        }

        let inverse_hs = HeadShouldersDetector::detect_inverse(
            candle_data,
            sensitivity,
            head_shoulders::DEFAULT_WINDOW,
        )?;
        if !inverse_hs.is_empty() {
            patterns["inverse_head_and_shoulders"] = serde_json::to_value(&inverse_hs)?;
        }

        let triangles =
            TriangleDetector::detect(candle_data, sensitivity, triangle::DEFAULT_WINDOW)?;
        if !triangles.is_empty() {
            patterns["triangles"] = serde_json::to_value(&triangles)?;
        }

        let levels = SupportResistanceDetector::detect(
            candle_data,
            sensitivity,
            support_resistance::DEFAULT_WINDOW,
        )?;
        if !levels.support.is_empty() || !levels.resistance.is_empty() {
            patterns["support_resistance"] = serde_json::to_value(&levels)?;
        }

        debug!(
            symbol = %candle_data.symbol,
            detected = patterns.as_object().map_or(0, |m| m.len()),
            "pattern recognition complete"
        );
        Ok(patterns)
    }
}
