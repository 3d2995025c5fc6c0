//! Whole-period performance and risk metrics.
//!
//! One engine serves the portfolio and every benchmark:
//!
//! - CAGR = `growth_N ^ (periods_per_year / N) - 1`
//! - Volatility = `sample_std(returns) * sqrt(periods_per_year)`
//! - Sharpe = `CAGR / volatility` (no risk-free rate is subtracted)
//! - Max drawdown = `min_t(growth_t / max(growth_0..=t) - 1)`

use crate::compound::{compound, drawdown_series};
use crate::error::{DomainError, Result, ReturnsError};
use crate::stats::sample_std;
use crate::types::{CumulativeSeries, ReturnSeries};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Volatility at or below this is treated as zero.
pub const ZERO_VOLATILITY_TOLERANCE: f64 = 1e-12;

/// A metric that is either a number or undefined for a stated reason.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    /// Defined value
    Value(f64),
    /// Mathematically undefined for this series
    Undefined(DomainError),
}

impl Metric {
    /// The value, if defined.
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined(_) => None,
        }
    }

    /// Whether the metric is defined.
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<std::result::Result<f64, DomainError>> for Metric {
    fn from(result: std::result::Result<f64, DomainError>) -> Self {
        match result {
            Ok(v) => Self::Value(v),
            Err(e) => Self::Undefined(e),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Undefined(e) => write!(f, "undefined ({e})"),
        }
    }
}

/// Metrics for one return series. Recomputed on every call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Number of daily returns (N)
    pub periods: usize,
    /// Final growth factor minus one
    pub total_return: f64,
    /// Compound annual growth rate
    pub cagr: Metric,
    /// Annualized volatility, undefined for a single return
    pub volatility: Metric,
    /// CAGR divided by annualized volatility
    pub sharpe: Metric,
    /// Worst peak-to-trough decline, `<= 0`
    pub max_drawdown: f64,
}

/// Derives [`MetricsSnapshot`]s from return series.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    periods_per_year: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(TRADING_DAYS_PER_YEAR)
    }
}

impl MetricsEngine {
    /// Create an engine with the given annualization constant.
    pub const fn new(periods_per_year: f64) -> Self {
        Self { periods_per_year }
    }

    /// Annualization constant.
    pub const fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    /// Compute every metric for a daily return series.
    ///
    /// Domain problems (non-positive terminal growth, zero volatility, a
    /// single return) are reported inside the snapshot as [`Metric::Undefined`].
    ///
    /// # Errors
    /// Returns [`ReturnsError::InsufficientData`] for an empty series.
    pub fn compute(&self, returns: &ReturnSeries) -> Result<MetricsSnapshot> {
        if returns.is_empty() {
            return Err(ReturnsError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let cumulative = compound(returns);
        let max_drawdown = self.max_drawdown(&cumulative)?;
        let final_growth = cumulative.last().map_or(1.0, |(_, g)| g);

        let volatility = match self.volatility(returns) {
            Ok(v) => Metric::Value(v),
            Err(ReturnsError::InsufficientData { .. }) => Metric::Undefined(DomainError::SingleObservation),
            Err(e) => return Err(e),
        };
        let cagr = match self.cagr(&cumulative) {
            Ok(v) => Metric::Value(v),
            Err(ReturnsError::Domain(e)) => Metric::Undefined(e),
            Err(e) => return Err(e),
        };
        let sharpe = match (cagr, volatility) {
            (Metric::Value(c), Metric::Value(v)) => Metric::from(self.sharpe(c, v)),
            (undefined @ Metric::Undefined(_), _) | (_, undefined @ Metric::Undefined(_)) => undefined,
        };

        Ok(MetricsSnapshot {
            periods: returns.len(),
            total_return: final_growth - 1.0,
            cagr,
            volatility,
            sharpe,
            max_drawdown,
        })
    }

    /// `final_growth ^ (periods_per_year / N) - 1`.
    ///
    /// # Errors
    /// [`DomainError::NonPositiveGrowth`] if the terminal growth factor is not
    /// positive; [`ReturnsError::InsufficientData`] for an empty series.
    pub fn cagr(&self, cumulative: &CumulativeSeries) -> Result<f64> {
        let (_, final_growth) = cumulative.last().ok_or(ReturnsError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        if final_growth <= 0.0 || !final_growth.is_finite() {
            return Err(DomainError::NonPositiveGrowth(final_growth).into());
        }
        let n = cumulative.len() as f64;
        Ok(final_growth.powf(self.periods_per_year / n) - 1.0)
    }

    /// Sample standard deviation of daily returns, annualized.
    ///
    /// # Errors
    /// [`ReturnsError::InsufficientData`] for fewer than two returns.
    pub fn volatility(&self, returns: &ReturnSeries) -> Result<f64> {
        let std = sample_std(returns.values()).ok_or(ReturnsError::InsufficientData {
            required: 2,
            actual: returns.len(),
        })?;
        Ok(std * self.periods_per_year.sqrt())
    }

    /// CAGR over annualized volatility, without a risk-free rate.
    ///
    /// # Errors
    /// [`DomainError::ZeroVolatility`] when volatility is (numerically) zero.
    pub fn sharpe(&self, cagr: f64, volatility: f64) -> std::result::Result<f64, DomainError> {
        if volatility.abs() <= ZERO_VOLATILITY_TOLERANCE {
            return Err(DomainError::ZeroVolatility);
        }
        Ok(cagr / volatility)
    }

    /// Worst value of the drawdown path; `0.0` for a non-decreasing series.
    ///
    /// # Errors
    /// [`ReturnsError::InsufficientData`] for an empty series.
    pub fn max_drawdown(&self, cumulative: &CumulativeSeries) -> Result<f64> {
        drawdown_series(cumulative)
            .values()
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or(ReturnsError::InsufficientData {
                required: 1,
                actual: 0,
            })
    }
}
