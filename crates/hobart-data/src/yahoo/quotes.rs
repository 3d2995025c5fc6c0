//! Adjusted close prices from Yahoo Finance.

use crate::align::PriceHistory;
use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with the default delay of 250ms after each request.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a provider with a custom delay after each request.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily prices for one symbol over `[start, end]`.
    ///
    /// Uses the adjusted close, falling back to the close when the adjusted
    /// value is missing or not positive.
    pub async fn fetch_prices(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceHistory> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = to_offset_datetime(start)?;
        let end_time = to_offset_datetime(end)?;

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        let mut history = PriceHistory::new();
        for quote in &quotes {
            let date = DateTime::from_timestamp(quote.timestamp, 0)
                .ok_or_else(|| DataError::TimeConversion(format!("invalid timestamp {}", quote.timestamp)))?
                .date_naive();
            if let Some(price) = select_price(quote.adjclose, quote.close) {
                history.insert(date, price);
            }
        }

        if history.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        debug!(symbol, observations = history.len(), "fetched prices");

        sleep(self.rate_limit_delay).await;

        Ok(history)
    }
}

fn to_offset_datetime(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid date {date}")))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp).map_err(|e| DataError::TimeConversion(e.to_string()))
}

/// Adjusted close if usable, otherwise close, otherwise nothing.
fn select_price(adjclose: f64, close: f64) -> Option<f64> {
    [adjclose, close]
        .into_iter()
        .find(|p| p.is_finite() && *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_price_prefers_adjusted_close() {
        assert_eq!(select_price(98.5, 100.0), Some(98.5));
        assert_eq!(select_price(0.0, 100.0), Some(100.0));
        assert_eq!(select_price(f64::NAN, 100.0), Some(100.0));
        assert_eq!(select_price(f64::NAN, -1.0), None);
    }

    #[test]
    fn test_offset_datetime_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let converted = to_offset_datetime(date).unwrap();
        assert_eq!(converted.unix_timestamp(), 1_546_300_800);
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let provider = YahooQuoteProvider::new().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let result = provider.fetch_prices("ROBO", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooQuoteProvider::new().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let result = provider.fetch_prices("  ", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }
}
