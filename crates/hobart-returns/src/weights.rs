//! Weight normalization.
//!
//! Raw allocations are filtered to the tickers that actually have price data
//! and then divided by their surviving sum. Dropping a ticker therefore scales
//! the remaining weights up proportionally instead of leaving a portfolio that
//! does not sum to one.

use crate::error::{Result, ReturnsError};
use ndarray::Array1;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Normalized portfolio weights: non-negative and summing to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    /// Weight for a ticker, if held.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.weights.get(ticker).copied()
    }

    /// Held tickers in lexicographic order.
    pub fn tickers(&self) -> impl Iterator<Item = &str> + '_ {
        self.weights.keys().map(String::as_str)
    }

    /// Iterate over `(ticker, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of holdings.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the vector holds no tickers.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of weights (1.0 within floating tolerance).
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Lay the weights out against a column order, zero for tickers not held.
    pub fn aligned_to(&self, tickers: &[String]) -> Array1<f64> {
        tickers
            .iter()
            .map(|t| self.weights.get(t).copied().unwrap_or(0.0))
            .collect()
    }

    /// Borrow the underlying mapping.
    pub const fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }
}

/// Turns raw nominal allocations into a valid [`WeightVector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightNormalizer;

impl WeightNormalizer {
    /// Create a new normalizer
    pub const fn new() -> Self {
        Self
    }

    /// Filter `raw` to `available` tickers, then renormalize to sum to one.
    ///
    /// # Errors
    /// Returns [`ReturnsError::Configuration`] if a raw weight is negative or
    /// non-finite, or if no positive weight survives the filter.
    pub fn normalize<'a, I>(&self, raw: &BTreeMap<String, f64>, available: I) -> Result<WeightVector>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some((ticker, weight)) = raw.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(ReturnsError::Configuration(format!(
                "weight for {ticker} must be a non-negative number, got {weight}"
            )));
        }

        let available: HashSet<&str> = available.into_iter().collect();
        let filtered: BTreeMap<String, f64> = raw
            .iter()
            .filter(|(ticker, _)| available.contains(ticker.as_str()))
            .map(|(ticker, &weight)| (ticker.clone(), weight))
            .collect();

        for ticker in raw.keys().filter(|t| !filtered.contains_key(*t)) {
            warn!(ticker = %ticker, "dropping weight for ticker without price data");
        }

        let total: f64 = filtered.values().sum();
        if filtered.is_empty() || total <= 0.0 {
            return Err(ReturnsError::Configuration(
                "no usable tickers remain after filtering weights".to_string(),
            ));
        }

        let weights: BTreeMap<String, f64> = filtered
            .into_iter()
            .map(|(ticker, weight)| (ticker, weight / total))
            .collect();

        debug!(holdings = weights.len(), raw_total = total, "normalized weights");

        Ok(WeightVector { weights })
    }
}
