// Module exports
pub mod double_bottom;
pub mod double_top;
pub mod extrema;
pub mod head_shoulders;
mod recognizer;
pub mod support_resistance;
pub mod triangle;

// Public exports
pub use double_bottom::{DoubleBottom, DoubleBottomDetector};
pub use double_top::{DoubleTop, DoubleTopDetector};
pub use head_shoulders::{HeadShoulders, HeadShouldersDetector, InverseHeadShoulders};
pub use recognizer::PatternRecognizer;
pub use support_resistance::{SupportResistance, SupportResistanceDetector};
pub use triangle::{Triangle, TriangleDetector, TriangleKind};

use crate::error::ScanError;

/// Detection sensitivity on the original 1..=10 scale.
///
/// Higher levels tighten the price tolerance bands and shrink the minimum
/// distance between extrema, so more (noisier) patterns get through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sensitivity(u8);

impl Sensitivity {
    pub fn new(level: u8) -> Result<Self, ScanError> {
        if (1..=10).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ScanError::InvalidArgument(format!(
                "sensitivity level {level} outside 1..=10"
            )))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// `base * (11 - level)`: the scaling every detector applies to its
    /// tolerance and threshold constants.
    pub fn scaled(self, base: f64) -> f64 {
        base * f64::from(11 - self.0)
    }

    /// `11 - level`, the raw inverse factor used by distance formulas.
    pub fn inverted(self) -> u8 {
        11 - self.0
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(5)
    }
}
