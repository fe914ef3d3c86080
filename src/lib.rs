pub mod error;
pub mod indicators;
pub mod patterns;
pub mod series;

pub use error::ScanError;
pub use patterns::double_bottom::{par_scan, scan, scan_with_tolerance};
pub use patterns::{PatternRecognizer, Sensitivity};
pub use series::CandleData;
