//! Error kinds shared by every analyzer.
//!
//! Errors fall in two tiers. Data conditions ([`Error::InsufficientData`] and
//! [`Error::AlphabetTooSmall`]) describe the sample and are recoverable by a
//! test panel. Everything else is a caller bug and must surface immediately.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Alphabet was empty or contained a duplicate symbol.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("unknown symbol {symbol:?}: not part of the declared alphabet")]
    UnknownSymbol { symbol: String },

    #[error("insufficient data: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("alphabet too small: declared {declared} symbols but observed {observed} distinct")]
    AlphabetTooSmall { declared: usize, observed: usize },

    #[error("degenerate expectation: expected count {value} in cell {index} is not positive")]
    DegenerateExpectation { index: usize, value: f64 },

    #[error("length mismatch: {observed} observed cells vs {expected} expected cells")]
    LengthMismatch { observed: usize, expected: usize },

    #[error("frequency table is empty (total count 0)")]
    EmptyTable,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    /// True for errors describing the sample rather than the caller's setup.
    pub fn is_data_condition(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData { .. } | Error::AlphabetTooSmall { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject a significance level outside the open interval (0, 1).
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration(format!(
            "alpha must lie in (0, 1), got {alpha}"
        )))
    }
}
