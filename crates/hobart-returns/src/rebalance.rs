//! Rebalancing simulation.
//!
//! The rebalancing model is a periodic reset to the same fixed weights, not
//! weight drift followed by rebalancing trades. Within every segment the
//! portfolio return on a date is the dot product of that date's return row
//! with the weight vector, so enabling rebalancing does not change the daily
//! formula; it partitions the date range into period-end segments that are
//! reported alongside the returns.
//!
//! Segment boundaries are period-end calendar dates. Each boundary date
//! belongs to exactly one segment, the one that starts at it; the first
//! segment starts at the first return date:
//!
//! ```text
//! [first, b0) [b0, b1) ... [b_{n-1}, last]
//! ```

use crate::error::{Result, ReturnsError};
use crate::types::{ReturnMatrix, ReturnSeries};
use crate::weights::WeightVector;
use chrono::{Datelike, Months, NaiveDate};
use ndarray::s;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Calendar period whose last day is a rebalancing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceFrequency {
    /// Every calendar month end
    Monthly,
    /// Mar 31, Jun 30, Sep 30, Dec 31
    #[default]
    Quarterly,
    /// Jun 30, Dec 31
    SemiAnnual,
    /// Dec 31
    Annual,
}

impl RebalanceFrequency {
    /// Length of the period in months.
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }

    /// Every period-end date within `[first, last]`, in order.
    ///
    /// Period ends are calendar dates and need not be trading days.
    pub fn period_ends(self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        let mut ends = Vec::new();
        let (mut year, mut month) = (first.year(), first.month());

        while let Some(end) = month_end(year, month) {
            if end > last {
                break;
            }
            if month % self.months() == 0 && end >= first {
                ends.push(end);
            }
            (year, month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
        }

        ends
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnual => "semi_annual",
            Self::Annual => "annual",
        };
        f.write_str(name)
    }
}

impl FromStr for RebalanceFrequency {
    type Err = ReturnsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "monthly" | "m" => Ok(Self::Monthly),
            "quarterly" | "q" => Ok(Self::Quarterly),
            "semi_annual" | "semiannual" => Ok(Self::SemiAnnual),
            "annual" | "yearly" | "y" => Ok(Self::Annual),
            other => Err(ReturnsError::Configuration(format!(
                "unknown rebalance frequency: {other}"
            ))),
        }
    }
}

/// A contiguous run of return dates sharing one weight reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceSegment {
    /// First return date in the segment
    pub start: NaiveDate,
    /// Last return date in the segment
    pub end: NaiveDate,
    /// Index of the first row (inclusive)
    pub start_row: usize,
    /// Index one past the last row
    pub end_row: usize,
}

impl RebalanceSegment {
    /// Number of return dates in the segment.
    pub const fn len(&self) -> usize {
        self.end_row - self.start_row
    }

    /// Whether the segment holds no dates (never produced by the simulator).
    pub const fn is_empty(&self) -> bool {
        self.end_row == self.start_row
    }
}

/// Portfolio return series together with its segment bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPortfolio {
    /// Daily portfolio returns
    pub returns: ReturnSeries,
    /// Segments in chronological order, partitioning the return dates
    pub segments: Vec<RebalanceSegment>,
}

/// Applies a fixed weight vector to a return matrix.
#[derive(Debug, Clone, Copy)]
pub struct RebalancingSimulator {
    rebalance: bool,
    frequency: RebalanceFrequency,
}

impl Default for RebalancingSimulator {
    fn default() -> Self {
        Self::new(true, RebalanceFrequency::default())
    }
}

impl RebalancingSimulator {
    /// Create a simulator
    pub const fn new(rebalance: bool, frequency: RebalanceFrequency) -> Self {
        Self {
            rebalance,
            frequency,
        }
    }

    /// Whether period-end segmentation is enabled.
    pub const fn rebalance(&self) -> bool {
        self.rebalance
    }

    /// Period-end rule used for segmentation.
    pub const fn frequency(&self) -> RebalanceFrequency {
        self.frequency
    }

    /// Compute the single-column portfolio return series.
    ///
    /// # Errors
    /// Returns [`ReturnsError::Configuration`] if a weighted ticker has no
    /// column in `returns`, and [`ReturnsError::InsufficientData`] if there
    /// are no return rows.
    pub fn simulate(&self, returns: &ReturnMatrix, weights: &WeightVector) -> Result<SimulatedPortfolio> {
        if let Some(missing) = weights
            .tickers()
            .find(|t| !returns.tickers().iter().any(|c| c.as_str() == *t))
        {
            return Err(ReturnsError::Configuration(format!(
                "weighted ticker {missing} has no return data"
            )));
        }

        let n = returns.nrows();
        if n == 0 {
            return Err(ReturnsError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let w = weights.aligned_to(returns.tickers());
        let segments = if self.rebalance {
            self.segments(returns.dates())
        } else {
            vec![whole_range(returns.dates())]
        };

        let mut values = Vec::with_capacity(n);
        for segment in &segments {
            let rows = returns
                .returns()
                .slice(s![segment.start_row..segment.end_row, ..]);
            values.extend(rows.dot(&w).iter().copied());
        }

        debug!(
            rows = n,
            segments = segments.len(),
            rebalance = self.rebalance,
            "simulated portfolio returns"
        );

        Ok(SimulatedPortfolio {
            returns: ReturnSeries::from_validated(returns.dates().to_vec(), values),
            segments,
        })
    }

    /// Partition `dates` (non-empty, increasing) at period-end boundaries.
    fn segments(&self, dates: &[NaiveDate]) -> Vec<RebalanceSegment> {
        let (first, last) = (dates[0], dates[dates.len() - 1]);
        let boundaries = self.frequency.period_ends(first, last);

        if boundaries.is_empty() {
            debug!(%first, %last, frequency = %self.frequency, "range shorter than one period, using a single segment");
            return vec![whole_range(dates)];
        }

        let mut starts = vec![0];
        for boundary in boundaries {
            let row = dates.partition_point(|d| *d < boundary);
            if row < dates.len() && row > *starts.last().unwrap_or(&0) {
                starts.push(row);
            }
        }

        starts
            .iter()
            .enumerate()
            .map(|(i, &start_row)| {
                let end_row = starts.get(i + 1).copied().unwrap_or(dates.len());
                RebalanceSegment {
                    start: dates[start_row],
                    end: dates[end_row - 1],
                    start_row,
                    end_row,
                }
            })
            .collect()
    }
}

fn whole_range(dates: &[NaiveDate]) -> RebalanceSegment {
    RebalanceSegment {
        start: dates[0],
        end: dates[dates.len() - 1],
        start_row: 0,
        end_row: dates.len(),
    }
}
