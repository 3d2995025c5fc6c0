//! Seeded synthetic prices for allocation sleeves.
//!
//! Each sleeve's daily return is drawn from
//! `Normal(annual_return / 252, annual_volatility / sqrt(252))`. All draws
//! come from one [`StdRng`] seeded with the configured seed, a full path per
//! sleeve in declaration order, so a given configuration always produces the
//! same prices. Paths start at 100 on the first weekday on or after the start
//! date and advance one weekday per return.

use crate::error::{DataError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use hobart_returns::{PriceMatrix, TRADING_DAYS_PER_YEAR};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Starting price of every simulated path.
pub const INITIAL_PRICE: f64 = 100.0;

/// Return and risk assumptions for one allocation sleeve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleeveAssumption {
    /// Sleeve name, used as the ticker
    pub name: String,
    /// Nominal allocation (any positive scale; normalized downstream)
    pub allocation: f64,
    /// Expected annual return
    pub annual_return: f64,
    /// Annual volatility
    pub annual_volatility: f64,
}

impl SleeveAssumption {
    /// Create a sleeve assumption.
    pub fn new(name: impl Into<String>, allocation: f64, annual_return: f64, annual_volatility: f64) -> Self {
        Self {
            name: name.into(),
            allocation,
            annual_return,
            annual_volatility,
        }
    }
}

/// Parameters for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed
    pub seed: u64,
    /// Number of simulated daily returns
    pub trading_days: usize,
    /// First price date (rolled forward to a weekday)
    pub start_date: NaiveDate,
    /// Sleeves in draw order
    pub sleeves: Vec<SleeveAssumption>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            trading_days: 3 * 252,
            start_date: NaiveDate::from_ymd_opt(2022, 7, 1).unwrap_or_default(),
            sleeves: vec![
                SleeveAssumption::new("ROBO", 32.0, 0.12, 0.20),
                SleeveAssumption::new("ADSK", 8.0, 0.10, 0.22),
                SleeveAssumption::new("ISRG", 8.0, 0.14, 0.25),
                SleeveAssumption::new("ABB", 8.0, 0.09, 0.18),
                SleeveAssumption::new("TER", 8.0, 0.13, 0.24),
                SleeveAssumption::new("QCLN", 5.0, 0.11, 0.23),
                SleeveAssumption::new("ENPH", 5.0, 0.15, 0.30),
                SleeveAssumption::new("NEE", 5.0, 0.08, 0.15),
                SleeveAssumption::new("Other ESG Automation", 21.0, 0.10, 0.20),
            ],
        }
    }
}

impl SimulationConfig {
    /// Default sleeves over `years` of 252 trading days.
    pub fn with_years(seed: u64, years: usize) -> Self {
        Self {
            seed,
            trading_days: years * 252,
            ..Self::default()
        }
    }

    /// Raw allocation mapping, sleeve name to nominal allocation.
    pub fn allocation(&self) -> BTreeMap<String, f64> {
        self.sleeves
            .iter()
            .map(|s| (s.name.clone(), s.allocation))
            .collect()
    }
}

/// Generates price paths from a [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct PriceSimulator {
    config: SimulationConfig,
}

impl PriceSimulator {
    /// Create a simulator.
    pub const fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate one price path per sleeve.
    ///
    /// # Errors
    /// Returns [`DataError::Simulation`] for fewer than two trading days, no
    /// sleeves, or an invalid volatility, and propagates price matrix
    /// validation failures (duplicate sleeve names, a path reaching zero).
    pub fn simulate(&self) -> Result<PriceMatrix> {
        let days = self.config.trading_days;
        if days < 2 {
            return Err(DataError::Simulation(format!(
                "need at least 2 trading days, got {days}"
            )));
        }
        if self.config.sleeves.is_empty() {
            return Err(DataError::Simulation("no sleeves configured".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut prices = Array2::<f64>::zeros((days + 1, self.config.sleeves.len()));

        for (col, sleeve) in self.config.sleeves.iter().enumerate() {
            let mu = sleeve.annual_return / TRADING_DAYS_PER_YEAR;
            let sigma = sleeve.annual_volatility / TRADING_DAYS_PER_YEAR.sqrt();
            let normal = Normal::new(mu, sigma)
                .map_err(|e| DataError::Simulation(format!("sleeve {}: {e}", sleeve.name)))?;

            let mut price = INITIAL_PRICE;
            prices[[0, col]] = price;
            for row in 1..=days {
                price *= 1.0 + normal.sample(&mut rng);
                prices[[row, col]] = price;
            }
        }

        let dates = weekdays(self.config.start_date, days + 1)?;
        let tickers = self.config.sleeves.iter().map(|s| s.name.clone()).collect();

        debug!(
            seed = self.config.seed,
            days,
            sleeves = self.config.sleeves.len(),
            "simulated prices"
        );

        Ok(PriceMatrix::new(dates, tickers, prices)?)
    }
}

/// `count` consecutive weekdays starting on or after `start`.
fn weekdays(start: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(count);
    let mut date = start;
    while dates.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
        date = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DataError::Simulation("date overflow".to_string()))?;
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            trading_days: 30,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            sleeves: vec![
                SleeveAssumption::new("A", 60.0, 0.10, 0.20),
                SleeveAssumption::new("B", 40.0, 0.05, 0.10),
            ],
        }
    }

    #[test]
    fn test_same_seed_same_prices() {
        let a = PriceSimulator::new(small_config(7)).simulate().unwrap();
        let b = PriceSimulator::new(small_config(7)).simulate().unwrap();
        assert_eq!(a, b);

        let c = PriceSimulator::new(small_config(8)).simulate().unwrap();
        assert_ne!(a.prices(), c.prices());
    }

    #[test]
    fn test_paths_start_at_initial_price_on_weekdays() {
        let prices = PriceSimulator::new(small_config(1)).simulate().unwrap();
        assert_eq!(prices.nrows(), 31);
        assert_relative_eq!(prices.prices()[[0, 0]], INITIAL_PRICE);
        assert_relative_eq!(prices.prices()[[0, 1]], INITIAL_PRICE);
        // 2024-01-06 is a Saturday.
        assert_eq!(prices.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert!(
            prices
                .dates()
                .iter()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn test_zero_volatility_sleeve_grows_at_drift() {
        let config = SimulationConfig {
            sleeves: vec![SleeveAssumption::new("Flat", 1.0, 0.252, 0.0)],
            ..small_config(3)
        };
        let prices = PriceSimulator::new(config).simulate().unwrap();
        let last = prices.prices()[[30, 0]];
        assert_relative_eq!(last, INITIAL_PRICE * 1.001_f64.powi(30), epsilon = 1e-9);
    }

    #[test]
    fn test_default_allocation() {
        let config = SimulationConfig::default();
        assert_eq!(config.trading_days, 756);
        assert_eq!(config.sleeves.len(), 9);
        let total: f64 = config.allocation().values().sum();
        assert_relative_eq!(total, 100.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut config = small_config(1);
        config.trading_days = 1;
        assert!(PriceSimulator::new(config).simulate().is_err());

        let mut config = small_config(1);
        config.sleeves[0].annual_volatility = -0.1;
        assert!(matches!(
            PriceSimulator::new(config).simulate(),
            Err(DataError::Simulation(_))
        ));
    }
}
