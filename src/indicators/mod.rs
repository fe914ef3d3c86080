pub mod levels;
pub mod oscillators;
pub mod overlaps;
pub mod ta;
pub mod volatility;

// Re-export the calculators
pub use self::levels::{fibonacci_retracement, FibonacciLevels};
pub use self::oscillators::OscillatorCalculator;
pub use self::overlaps::OverlapCalculator;
pub use self::volatility::VolatilityCalculator;
