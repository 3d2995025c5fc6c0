//! Core value types: price and return matrices and dated series.
//!
//! All types are immutable once constructed. Constructors validate the
//! calendar (strictly increasing dates, one value per date) so that the
//! engine functions can rely on it without re-checking.

use crate::error::{Result, ReturnsError};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A value that may be missing because there was not enough history.
///
/// Serializes as a plain number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    /// A computed value
    Value(f64),
    /// Not enough observations to compute a value
    NotAvailable,
}

impl Observation {
    /// The value, if available.
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotAvailable => None,
        }
    }

    /// Whether a value is present.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<Option<f64>> for Observation {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NotAvailable, Self::Value)
    }
}

impl From<f64> for Observation {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::NotAvailable => write!(f, "n/a"),
        }
    }
}

/// Check that `dates` is strictly increasing and matches `len` values.
fn validate_calendar(dates: &[NaiveDate], len: usize) -> Result<()> {
    if dates.len() != len {
        return Err(ReturnsError::DimensionMismatch {
            expected: dates.len(),
            actual: len,
        });
    }
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ReturnsError::InvalidInput(format!(
            "dates must be strictly increasing ({} followed by {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

macro_rules! dated_series {
    ($(#[$meta:meta])* $name:ident, $value:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            dates: Vec<NaiveDate>,
            values: Vec<$value>,
        }

        impl $name {
            /// Create a series, validating that dates are strictly increasing
            /// and that there is exactly one value per date.
            pub fn new(dates: Vec<NaiveDate>, values: Vec<$value>) -> Result<Self> {
                validate_calendar(&dates, values.len())?;
                Ok(Self { dates, values })
            }

            /// Build from parts already known to satisfy the calendar invariant.
            pub(crate) const fn from_validated(dates: Vec<NaiveDate>, values: Vec<$value>) -> Self {
                Self { dates, values }
            }

            /// Observation dates.
            pub fn dates(&self) -> &[NaiveDate] {
                &self.dates
            }

            /// Values, one per date.
            pub fn values(&self) -> &[$value] {
                &self.values
            }

            /// Number of observations.
            pub fn len(&self) -> usize {
                self.values.len()
            }

            /// Whether the series has no observations.
            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }

            /// The most recent observation.
            pub fn last(&self) -> Option<(NaiveDate, $value)> {
                Some((*self.dates.last()?, *self.values.last()?))
            }

            /// Iterate over `(date, value)` pairs in chronological order.
            pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, $value)> + '_ {
                self.dates.iter().copied().zip(self.values.iter().copied())
            }

            /// Split into dates and values.
            pub fn into_parts(self) -> (Vec<NaiveDate>, Vec<$value>) {
                (self.dates, self.values)
            }
        }
    };
}

dated_series!(
    /// Daily simple returns, `price[t]/price[t-1] - 1`, for a single series.
    ReturnSeries,
    f64
);

dated_series!(
    /// Growth of $1: the running product of `(1 + r)` up to and including each date.
    CumulativeSeries,
    f64
);

dated_series!(
    /// Distance below the running peak of a cumulative series, always `<= 0`.
    DrawdownSeries,
    f64
);

dated_series!(
    /// A dated series where early values may be missing (e.g. rolling warm-up).
    RollingSeries,
    Observation
);

/// Aligned prices: dates (rows) by tickers (columns), every cell positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    prices: Array2<f64>,
}

impl PriceMatrix {
    /// Create a price matrix.
    ///
    /// # Errors
    /// Fails if the shape does not match the labels, dates are not strictly
    /// increasing, a ticker appears twice, or any price is not a positive
    /// finite number.
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, prices: Array2<f64>) -> Result<Self> {
        validate_calendar(&dates, prices.nrows())?;
        validate_tickers(&tickers, prices.ncols())?;

        for ((row, col), &price) in prices.indexed_iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(ReturnsError::InvalidInput(format!(
                    "price for {} on {} must be positive, got {}",
                    tickers[col], dates[row], price
                )));
            }
        }

        Ok(Self {
            dates,
            tickers,
            prices,
        })
    }

    /// Trading dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Ticker symbols, in column order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// The raw price matrix (rows = dates, columns = tickers).
    pub const fn prices(&self) -> &Array2<f64> {
        &self.prices
    }

    /// Number of dates.
    pub fn nrows(&self) -> usize {
        self.prices.nrows()
    }

    /// Prices for one ticker.
    pub fn column(&self, ticker: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.prices.column(idx))
    }

    /// Restrict to rows dated within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();

        Self {
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            tickers: self.tickers.clone(),
            prices: self.prices.select(Axis(0), &rows),
        }
    }

    /// Keep only the given tickers, in the given order.
    ///
    /// # Errors
    /// Fails if a requested ticker is not in the matrix.
    pub fn select(&self, tickers: &[String]) -> Result<Self> {
        let cols = tickers
            .iter()
            .map(|t| {
                self.tickers.iter().position(|x| x == t).ok_or_else(|| {
                    ReturnsError::Configuration(format!("ticker {t} is not in the price matrix"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dates: self.dates.clone(),
            tickers: tickers.to_vec(),
            prices: self.prices.select(Axis(1), &cols),
        })
    }
}

/// Daily simple returns for every ticker of a price matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    returns: Array2<f64>,
}

impl ReturnMatrix {
    /// Create a return matrix.
    pub fn new(dates: Vec<NaiveDate>, tickers: Vec<String>, returns: Array2<f64>) -> Result<Self> {
        validate_calendar(&dates, returns.nrows())?;
        validate_tickers(&tickers, returns.ncols())?;
        Ok(Self {
            dates,
            tickers,
            returns,
        })
    }

    /// Return dates (the first price date is not included).
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Ticker symbols, in column order.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// The raw return matrix (rows = dates, columns = tickers).
    pub const fn returns(&self) -> &Array2<f64> {
        &self.returns
    }

    /// Number of dates.
    pub fn nrows(&self) -> usize {
        self.returns.nrows()
    }

    /// Extract one ticker as a single return series.
    pub fn series(&self, ticker: &str) -> Option<ReturnSeries> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(ReturnSeries::from_validated(
            self.dates.clone(),
            self.returns.column(idx).to_vec(),
        ))
    }
}

fn validate_tickers(tickers: &[String], ncols: usize) -> Result<()> {
    if tickers.len() != ncols {
        return Err(ReturnsError::DimensionMismatch {
            expected: tickers.len(),
            actual: ncols,
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
        return Err(ReturnsError::InvalidInput(format!("duplicate ticker {dup}")));
    }
    Ok(())
}
