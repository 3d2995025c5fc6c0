//! Analysis configuration.
//!
//! [`AnalysisConfig`] is a plain value passed into each run; nothing is read
//! from global state. Every field is optional in TOML and falls back to the
//! reference ESG automation portfolio:
//!
//! ```toml
//! name = "ESG Automation Portfolio"
//! start_date = "2019-01-01"
//! end_date = "2025-07-01"
//! benchmarks = ["QQQ", "SPY", "ESGU"]
//! rebalance = true
//! rebalance_frequency = "quarterly"
//! rolling_window = 126
//!
//! [weights]
//! ROBO = 0.15
//! SOXX = 0.10
//!
//! [[horizons]]
//! label = "1M"
//! kind = { lookback = 21 }
//!
//! [[horizons]]
//! label = "YTD"
//! kind = "year_to_date"
//! ```

use chrono::NaiveDate;
use hobart_returns::{
    DEFAULT_ROLLING_WINDOW, Horizon, HorizonComparator, HorizonKind, MetricsEngine, RebalanceFrequency,
    RebalancingSimulator, RollingRiskEngine, TRADING_DAYS_PER_YEAR, default_horizons,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a portfolio analysis run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Portfolio display name, also its series name
    pub name: String,
    /// First price date included
    pub start_date: NaiveDate,
    /// Last price date included
    pub end_date: NaiveDate,
    /// Raw nominal weights by ticker (normalized before use)
    pub weights: BTreeMap<String, f64>,
    /// Benchmark tickers, in display order
    pub benchmarks: Vec<String>,
    /// Whether to reset to target weights at period ends
    pub rebalance: bool,
    /// Period-end rule when rebalancing
    pub rebalance_frequency: RebalanceFrequency,
    /// Rolling Sharpe window in trading days
    pub rolling_window: usize,
    /// Annualization constant
    pub periods_per_year: f64,
    /// Trailing-return horizons, in display order
    pub horizons: Vec<Horizon>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let weights = [
            ("ROK", 0.05),
            ("EMR", 0.04),
            ("HON", 0.04),
            ("MSFT", 0.07),
            ("NVDA", 0.07),
            ("PLTR", 0.04),
            ("CRWD", 0.04),
            ("CGNX", 0.03),
            ("AMAT", 0.04),
            ("SNOW", 0.03),
            ("SSYS", 0.03),
            ("DDD", 0.02),
            ("ROBO", 0.15),
            ("SOXX", 0.10),
            ("ESGU", 0.10),
            ("ICLN", 0.05),
        ]
        .into_iter()
        .map(|(t, w)| (t.to_string(), w))
        .collect();

        Self {
            name: "ESG Automation Portfolio".to_string(),
            start_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap_or_default(),
            weights,
            benchmarks: vec!["QQQ".to_string(), "SPY".to_string(), "ESGU".to_string()],
            rebalance: true,
            rebalance_frequency: RebalanceFrequency::Quarterly,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            horizons: default_horizons(),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid TOML, or fails [`Self::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    /// Fails if the text is not valid TOML or fails [`Self::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and consistency.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rolling_window < 2 {
            return Err(ConfigError::Invalid(format!(
                "rolling_window must be at least 2, got {}",
                self.rolling_window
            )));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        if self.start_date >= self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} must be before end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.weights.is_empty() {
            return Err(ConfigError::Invalid("weights must not be empty".to_string()));
        }
        if let Some((ticker, w)) = self.weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "weight for {ticker} must be a non-negative number, got {w}"
            )));
        }
        if self.weights.values().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid("weights must not all be zero".to_string()));
        }
        if self.benchmarks.iter().any(|b| b.trim().is_empty()) {
            return Err(ConfigError::Invalid("benchmark tickers must not be empty".to_string()));
        }

        let mut labels = HashSet::new();
        for horizon in &self.horizons {
            if horizon.kind == HorizonKind::Lookback(0) {
                return Err(ConfigError::Invalid(format!(
                    "horizon {} has a zero lookback",
                    horizon.label
                )));
            }
            if !labels.insert(horizon.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate horizon label {}",
                    horizon.label
                )));
            }
        }
        Ok(())
    }

    /// Portfolio tickers followed by benchmarks not already held.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.weights.keys().cloned().collect();
        for b in &self.benchmarks {
            if !tickers.contains(b) {
                tickers.push(b.clone());
            }
        }
        tickers
    }

    /// Rebalancing simulator for these settings.
    pub const fn rebalancing_simulator(&self) -> RebalancingSimulator {
        RebalancingSimulator::new(self.rebalance, self.rebalance_frequency)
    }

    /// Metrics engine for these settings.
    pub const fn metrics_engine(&self) -> MetricsEngine {
        MetricsEngine::new(self.periods_per_year)
    }

    /// Rolling engine for these settings.
    ///
    /// # Errors
    /// Fails if the window is below 2.
    pub fn rolling_engine(&self) -> hobart_returns::Result<RollingRiskEngine> {
        RollingRiskEngine::new(self.rolling_window, self.periods_per_year)
    }

    /// Horizon comparator for these settings.
    pub fn horizon_comparator(&self) -> HorizonComparator {
        HorizonComparator::new(self.horizons.clone())
    }
}
