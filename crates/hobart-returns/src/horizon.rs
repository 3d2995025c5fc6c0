//! Trailing returns over named horizons.
//!
//! All series are first intersected onto a common date index (truncated at
//! the `as_of` date) so every horizon is measured from the same current date
//! for the portfolio and each benchmark. For a lookback `k` on a common index
//! of length `n` the return is `value[n-1] / value[n-1-k] - 1`, or
//! [`Observation::NotAvailable`] when `k >= n`.

use crate::types::{CumulativeSeries, Observation};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// How far back a horizon reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonKind {
    /// A fixed number of trading days
    Lookback(usize),
    /// Since the last observation of the previous calendar year
    YearToDate,
    /// Since the first common observation
    SinceInception,
}

/// A labelled horizon such as `1M` or `YTD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// Display label
    pub label: String,
    /// Lookback rule
    pub kind: HorizonKind,
}

impl Horizon {
    /// A fixed trading-day lookback.
    pub fn lookback(label: impl Into<String>, days: usize) -> Self {
        Self {
            label: label.into(),
            kind: HorizonKind::Lookback(days),
        }
    }

    /// Year to date relative to the comparison date.
    pub fn year_to_date(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: HorizonKind::YearToDate,
        }
    }

    /// Full history of the common index.
    pub fn since_inception(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: HorizonKind::SinceInception,
        }
    }
}

/// 1M, 3M, 6M, YTD, 1Y and since inception.
pub fn default_horizons() -> Vec<Horizon> {
    vec![
        Horizon::lookback("1M", 21),
        Horizon::lookback("3M", 63),
        Horizon::lookback("6M", 126),
        Horizon::year_to_date("YTD"),
        Horizon::lookback("1Y", 252),
        Horizon::since_inception("Since Inception"),
    ]
}

/// Returns for one horizon, keyed by series name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonRow {
    /// Horizon label
    pub label: String,
    /// Trailing return per series
    pub returns: BTreeMap<String, Observation>,
}

/// Horizon-by-series table of trailing returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonTable {
    /// Last date of the common index, if any
    pub as_of: Option<NaiveDate>,
    /// Series names in the order supplied
    pub series: Vec<String>,
    /// One row per horizon, in configured order
    pub rows: Vec<HorizonRow>,
}

impl HorizonTable {
    /// Look up one cell.
    pub fn get(&self, label: &str, series: &str) -> Option<Observation> {
        self.rows
            .iter()
            .find(|row| row.label == label)?
            .returns
            .get(series)
            .copied()
    }

    /// Nested mapping `label -> series -> return`.
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<String, Observation>> {
        self.rows
            .iter()
            .map(|row| (row.label.clone(), row.returns.clone()))
            .collect()
    }
}

/// Evaluates horizons for several cumulative series on a common time base.
#[derive(Debug, Clone)]
pub struct HorizonComparator {
    horizons: Vec<Horizon>,
}

impl Default for HorizonComparator {
    fn default() -> Self {
        Self::new(default_horizons())
    }
}

impl HorizonComparator {
    /// Create a comparator for the given horizons.
    pub const fn new(horizons: Vec<Horizon>) -> Self {
        Self { horizons }
    }

    /// Configured horizons.
    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    /// Build the horizon table for `series` as of `as_of`.
    pub fn compare(&self, series: &[(&str, &CumulativeSeries)], as_of: NaiveDate) -> HorizonTable {
        let common = common_dates(series, as_of);
        let n = common.len();

        let aligned: Vec<(&str, Vec<f64>)> = series
            .iter()
            .map(|(name, s)| {
                let values = common
                    .iter()
                    .filter_map(|d| s.dates().binary_search(d).ok().map(|i| s.values()[i]))
                    .collect();
                (*name, values)
            })
            .collect();

        debug!(series = series.len(), common_dates = n, %as_of, "comparing horizons");

        let rows = self
            .horizons
            .iter()
            .map(|horizon| {
                let lookback = match horizon.kind {
                    HorizonKind::Lookback(days) => Some(days),
                    HorizonKind::SinceInception => n.checked_sub(1),
                    HorizonKind::YearToDate => year_to_date_lookback(&common, as_of),
                };
                let returns = aligned
                    .iter()
                    .map(|(name, values)| (name.to_string(), trailing_return(values, lookback)))
                    .collect();
                HorizonRow {
                    label: horizon.label.clone(),
                    returns,
                }
            })
            .collect();

        HorizonTable {
            as_of: common.last().copied(),
            series: series.iter().map(|(name, _)| name.to_string()).collect(),
            rows,
        }
    }
}

/// Dates present in every series, on or before `as_of`, ascending.
fn common_dates(series: &[(&str, &CumulativeSeries)], as_of: NaiveDate) -> Vec<NaiveDate> {
    let mut iter = series.iter();
    let Some((_, first)) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDate> = first.dates().iter().copied().filter(|d| *d <= as_of).collect();
    for (_, s) in iter {
        let dates: BTreeSet<NaiveDate> = s.dates().iter().copied().collect();
        common = common.intersection(&dates).copied().collect();
    }
    common.into_iter().collect()
}

/// Lookback from the last common date back to the final observation of the previous year.
fn year_to_date_lookback(common: &[NaiveDate], as_of: NaiveDate) -> Option<usize> {
    let prior_year_end = NaiveDate::from_ymd_opt(as_of.year() - 1, 12, 31)?;
    let base = common.partition_point(|d| *d <= prior_year_end).checked_sub(1)?;
    Some(common.len() - 1 - base)
}

fn trailing_return(values: &[f64], lookback: Option<usize>) -> Observation {
    let n = values.len();
    match lookback {
        Some(k) if k < n => Observation::Value(values[n - 1] / values[n - 1 - k] - 1.0),
        _ => Observation::NotAvailable,
    }
}
