use thiserror::Error;

/// Errors raised by the windowed scanners and by series validation.
///
/// Both conditions are caller contract violations, not transient failures:
/// no retry semantics apply and no partial result is ever produced.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A parameter is outside the contract (zero window, out-of-range
    /// sensitivity level, negative tolerance).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The series itself is malformed: non-finite samples or mismatched
    /// candle columns. Detected up front, never mid-scan.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
