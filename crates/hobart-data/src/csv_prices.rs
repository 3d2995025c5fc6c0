//! Wide CSV price files.
//!
//! ```text
//! date,ROBO,SOXX,ICLN
//! 2024-01-02,55.10,210.4,
//! 2024-01-03,54.87,207.9,14.2
//! ```
//!
//! The first column holds ISO dates; every other column is a ticker. Blank
//! cells are missing prices.

use crate::align::PriceHistory;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a wide price table from any reader.
///
/// # Errors
/// Fails on malformed CSV, an unparseable date or price, a repeated date, or
/// a repeated ticker column.
pub fn read_wide_prices<R: Read>(reader: R) -> Result<BTreeMap<String, PriceHistory>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let tickers: Vec<String> = rdr.headers()?.iter().skip(1).map(str::to_string).collect();
    let mut histories: BTreeMap<String, PriceHistory> = BTreeMap::new();
    for ticker in &tickers {
        if ticker.is_empty() {
            return Err(DataError::Parse("empty ticker in header".to_string()));
        }
        if histories.insert(ticker.clone(), PriceHistory::new()).is_some() {
            return Err(DataError::Parse(format!("duplicate ticker column {ticker}")));
        }
    }

    for record in rdr.records() {
        let record = record?;
        let Some(raw_date) = record.get(0) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("invalid date {raw_date:?}: {e}")))?;

        for (ticker, cell) in tickers.iter().zip(record.iter().skip(1)) {
            if cell.is_empty() {
                continue;
            }
            let price: f64 = cell
                .parse()
                .map_err(|e| DataError::Parse(format!("invalid price {cell:?} for {ticker} on {date}: {e}")))?;
            let history = histories.entry(ticker.clone()).or_default();
            if history.insert(date, price).is_some() {
                return Err(DataError::Parse(format!("duplicate date {date} for {ticker}")));
            }
        }
    }

    debug!(tickers = histories.len(), "read wide price table");
    Ok(histories)
}

/// Read a wide price table from a file.
///
/// # Errors
/// Fails if the file cannot be opened or parsed.
pub fn load_wide_prices(path: impl AsRef<Path>) -> Result<BTreeMap<String, PriceHistory>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_wide_prices(file)
}
