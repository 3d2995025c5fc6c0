//! Error types for the return engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for return engine operations.
pub type Result<T> = std::result::Result<T, ReturnsError>;

/// Errors that can occur while deriving returns and metrics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReturnsError {
    /// The inputs cannot form a valid portfolio definition
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Not enough observations for the requested computation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A metric is mathematically undefined for the given series
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Dimension mismatch between matrix parts
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Malformed input values
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Conditions under which a metric has no meaningful value.
///
/// These are reported instead of NaN or infinity so that "undefined" can never
/// be mistaken for a legitimate number such as zero.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize, Deserialize)]
pub enum DomainError {
    /// CAGR needs a strictly positive terminal growth factor
    #[error("terminal growth factor {0} is not positive")]
    NonPositiveGrowth(f64),

    /// Sharpe ratio is undefined when returns have no dispersion
    #[error("volatility is zero")]
    ZeroVolatility,

    /// Sample volatility needs at least two returns
    #[error("volatility needs at least two returns")]
    SingleObservation,
}
