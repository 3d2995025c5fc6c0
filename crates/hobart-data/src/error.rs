//! Error types for data operations.

use hobart_returns::ReturnsError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading, aligning, or simulating prices.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// Malformed price file
    #[error("Price file parse error: {0}")]
    Parse(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// No usable prices
    #[error("No usable prices for {symbol}: {reason}")]
    MissingData {
        /// Ticker, or a description of the batch
        symbol: String,
        /// Why the prices could not be used
        reason: String,
    },

    /// Date could not be converted for or from the quote API
    #[error("Date conversion error: {0}")]
    TimeConversion(String),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Invalid simulation parameters
    #[error("Invalid simulation parameters: {0}")]
    Simulation(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Price matrix construction error
    #[error(transparent)]
    Returns(#[from] ReturnsError),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
