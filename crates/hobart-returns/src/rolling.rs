//! Rolling annualized Sharpe ratio over a trailing window.
//!
//! Entry `t` uses returns `t-W+1..=t`:
//!
//! `(mean * periods_per_year) / (sample_std * sqrt(periods_per_year))`
//!
//! The first `W-1` entries are [`Observation::NotAvailable`]. A window with
//! zero dispersion is also `NotAvailable` rather than infinite.

use crate::error::{Result, ReturnsError};
use crate::metrics::{TRADING_DAYS_PER_YEAR, ZERO_VOLATILITY_TOLERANCE};
use crate::stats::{mean, sample_std};
use crate::types::{Observation, ReturnSeries, RollingSeries};

/// Default window: 126 trading days, about six months.
pub const DEFAULT_ROLLING_WINDOW: usize = 126;

/// Computes rolling risk-adjusted return series.
#[derive(Debug, Clone, Copy)]
pub struct RollingRiskEngine {
    window: usize,
    periods_per_year: f64,
}

impl RollingRiskEngine {
    /// Create an engine.
    ///
    /// # Errors
    /// Returns [`ReturnsError::Configuration`] if `window < 2`, since the
    /// sample standard deviation needs at least two observations.
    pub fn new(window: usize, periods_per_year: f64) -> Result<Self> {
        if window < 2 {
            return Err(ReturnsError::Configuration(format!(
                "rolling window must be at least 2, got {window}"
            )));
        }
        Ok(Self {
            window,
            periods_per_year,
        })
    }

    /// Create with the default six-month window and 252 periods per year.
    ///
    /// # Errors
    /// Propagates [`Self::new`] validation of the default window.
    pub fn try_default() -> Result<Self> {
        Self::new(DEFAULT_ROLLING_WINDOW, TRADING_DAYS_PER_YEAR)
    }

    /// Window length in periods.
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Rolling Sharpe ratio aligned to the input dates.
    pub fn sharpe(&self, returns: &ReturnSeries) -> RollingSeries {
        let values = returns.values();
        let annualized_mean = self.periods_per_year;
        let annualized_std = self.periods_per_year.sqrt();

        let rolling = (0..values.len())
            .map(|t| {
                if t + 1 < self.window {
                    return Observation::NotAvailable;
                }
                let window = &values[t + 1 - self.window..=t];
                match (mean(window), sample_std(window)) {
                    (Some(m), Some(s)) if s > ZERO_VOLATILITY_TOLERANCE => {
                        Observation::Value((m * annualized_mean) / (s * annualized_std))
                    }
                    _ => Observation::NotAvailable,
                }
            })
            .collect();

        RollingSeries::from_validated(returns.dates().to_vec(), rolling)
    }
}
