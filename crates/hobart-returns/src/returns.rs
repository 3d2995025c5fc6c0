//! Daily simple returns from aligned prices.

use crate::error::{Result, ReturnsError};
use crate::types::{PriceMatrix, ReturnMatrix};
use ndarray::s;

/// Converts a [`PriceMatrix`] into a [`ReturnMatrix`].
///
/// The matrix index is the authoritative calendar: no smoothing and no
/// adjustment for gaps between consecutive rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Create a new calculator
    pub const fn new() -> Self {
        Self
    }

    /// Compute `price[t]/price[t-1] - 1` for every column.
    ///
    /// The first date has no prior-day reference and is dropped, so the
    /// result has one row fewer than the input.
    ///
    /// # Errors
    /// Returns [`ReturnsError::InsufficientData`] if the matrix has fewer than two rows.
    pub fn compute(&self, prices: &PriceMatrix) -> Result<ReturnMatrix> {
        let n = prices.nrows();
        if n < 2 {
            return Err(ReturnsError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let p = prices.prices();
        let returns = &p.slice(s![1.., ..]) / &p.slice(s![..-1, ..]) - 1.0;

        ReturnMatrix::new(
            prices.dates()[1..].to_vec(),
            prices.tickers().to_vec(),
            returns,
        )
    }
}
