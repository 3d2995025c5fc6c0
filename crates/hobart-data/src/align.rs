//! Alignment of per-ticker price histories onto one calendar.
//!
//! The calendar is the union of every ticker's dates. A ticker that is
//! missing a usable price on any calendar date is dropped entirely rather
//! than filled, so the resulting matrix is complete.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use hobart_returns::PriceMatrix;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Prices for one ticker keyed by date.
pub type PriceHistory = BTreeMap<NaiveDate, f64>;

/// Result of aligning a set of histories.
#[derive(Debug, Clone)]
pub struct AlignedPrices {
    /// Complete matrix over the surviving tickers
    pub matrix: PriceMatrix,
    /// Tickers removed because of gaps, in ticker order
    pub dropped: Vec<String>,
}

/// Align histories onto the union calendar, dropping incomplete tickers.
///
/// # Errors
/// Returns [`DataError::MissingData`] if no ticker has a complete history.
pub fn align_prices(histories: &BTreeMap<String, PriceHistory>) -> Result<AlignedPrices> {
    let calendar: Vec<NaiveDate> = histories
        .values()
        .flat_map(|h| h.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (ticker, history) in histories {
        let complete = calendar
            .iter()
            .all(|d| history.get(d).is_some_and(|p| p.is_finite() && *p > 0.0));
        if complete {
            kept.push(ticker.clone());
        } else {
            let available = history.len();
            warn!(ticker = %ticker, available, calendar = calendar.len(), "dropping ticker with incomplete prices");
            dropped.push(ticker.clone());
        }
    }

    if kept.is_empty() || calendar.is_empty() {
        return Err(DataError::MissingData {
            symbol: histories.keys().cloned().collect::<Vec<_>>().join(","),
            reason: "no ticker has a complete price history".to_string(),
        });
    }

    let prices = Array2::from_shape_fn((calendar.len(), kept.len()), |(row, col)| {
        histories[&kept[col]][&calendar[row]]
    });

    debug!(tickers = kept.len(), dates = calendar.len(), dropped = dropped.len(), "aligned prices");

    Ok(AlignedPrices {
        matrix: PriceMatrix::new(calendar, kept, prices)?,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn history(points: &[(u32, f64)]) -> PriceHistory {
        points.iter().map(|(day, p)| (d(*day), *p)).collect()
    }

    #[test]
    fn test_complete_histories_align() {
        let histories: BTreeMap<String, PriceHistory> = [
            ("A".to_string(), history(&[(4, 10.0), (5, 11.0)])),
            ("B".to_string(), history(&[(4, 20.0), (5, 19.0)])),
        ]
        .into_iter()
        .collect();

        let aligned = align_prices(&histories).unwrap();
        assert!(aligned.dropped.is_empty());
        assert_eq!(aligned.matrix.tickers(), &["A".to_string(), "B".to_string()]);
        assert_eq!(aligned.matrix.column("B").unwrap().to_vec(), vec![20.0, 19.0]);
    }

    #[test]
    fn test_ticker_with_gap_is_dropped() {
        let histories: BTreeMap<String, PriceHistory> = [
            ("A".to_string(), history(&[(4, 10.0), (5, 11.0), (6, 12.0)])),
            ("B".to_string(), history(&[(4, 20.0), (6, 19.0)])),
        ]
        .into_iter()
        .collect();

        let aligned = align_prices(&histories).unwrap();
        assert_eq!(aligned.dropped, vec!["B".to_string()]);
        assert_eq!(aligned.matrix.tickers(), &["A".to_string()]);
        assert_eq!(aligned.matrix.nrows(), 3);
    }

    #[test]
    fn test_non_positive_price_counts_as_missing() {
        let histories: BTreeMap<String, PriceHistory> = [
            ("A".to_string(), history(&[(4, 10.0), (5, 11.0)])),
            ("B".to_string(), history(&[(4, 20.0), (5, 0.0)])),
        ]
        .into_iter()
        .collect();

        let aligned = align_prices(&histories).unwrap();
        assert_eq!(aligned.dropped, vec!["B".to_string()]);
    }

    #[test]
    fn test_no_survivors_is_missing_data() {
        let histories: BTreeMap<String, PriceHistory> = [
            ("A".to_string(), history(&[(4, 10.0)])),
            ("B".to_string(), history(&[(5, 20.0)])),
        ]
        .into_iter()
        .collect();

        assert!(matches!(align_prices(&histories), Err(DataError::MissingData { .. })));
        assert!(align_prices(&BTreeMap::new()).is_err());
    }
}
