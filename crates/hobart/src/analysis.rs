//! End-to-end portfolio analysis.
//!
//! A run slices prices to the configured dates, normalizes weights against
//! the tickers that actually have data, simulates the portfolio, and then
//! pushes the portfolio and every benchmark through the same metrics path.
//! Trailing horizon returns are evaluated for all series on their common
//! dates.

use crate::config::{AnalysisConfig, ConfigError};
use chrono::{DateTime, NaiveDate, Utc};
use hobart_data::{DataError, PriceSimulator, SimulationConfig};
use hobart_output::{ExportError, MetricsExport, PerformanceSummary, PortfolioDocument, TimeSeriesExport};
use hobart_returns::{
    CumulativeSeries, DrawdownSeries, HorizonTable, MetricsEngine, MetricsSnapshot, PriceMatrix, RebalanceSegment,
    ReturnCalculator, ReturnSeries, ReturnsError, RollingSeries, WeightNormalizer, WeightVector, compound,
    drawdown_series,
};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine error
    #[error(transparent)]
    Returns(#[from] ReturnsError),

    /// Data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result type for analysis runs.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Derived paths and metrics for one return series.
#[derive(Debug, Clone)]
pub struct SeriesAnalysis {
    /// Series name
    pub name: String,
    /// Daily returns
    pub returns: ReturnSeries,
    /// Growth of $1
    pub cumulative: CumulativeSeries,
    /// Drawdown path
    pub drawdown: DrawdownSeries,
    /// Whole-period metrics
    pub metrics: MetricsSnapshot,
}

impl SeriesAnalysis {
    /// Compound a return series and compute its metrics.
    ///
    /// # Errors
    /// Fails if the series is empty.
    pub fn from_returns(name: impl Into<String>, returns: ReturnSeries, engine: &MetricsEngine) -> Result<Self> {
        let metrics = engine.compute(&returns)?;
        let cumulative = compound(&returns);
        let drawdown = drawdown_series(&cumulative);
        Ok(Self {
            name: name.into(),
            returns,
            cumulative,
            drawdown,
            metrics,
        })
    }
}

/// Everything produced by a run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Normalized weights actually applied
    pub weights: WeightVector,
    /// Portfolio series
    pub portfolio: SeriesAnalysis,
    /// Rebalancing segments of the portfolio
    pub segments: Vec<RebalanceSegment>,
    /// Rolling Sharpe ratio of the portfolio
    pub rolling_sharpe: RollingSeries,
    /// Benchmark series that had data, in configured order
    pub benchmarks: Vec<SeriesAnalysis>,
    /// Trailing returns for the portfolio and benchmarks
    pub horizons: HorizonTable,
}

impl AnalysisReport {
    /// Portfolio followed by benchmarks.
    pub fn series(&self) -> impl Iterator<Item = &SeriesAnalysis> {
        std::iter::once(&self.portfolio).chain(self.benchmarks.iter())
    }

    /// Metrics and horizon tables for display.
    pub fn summary(&self) -> PerformanceSummary {
        let dates = self.portfolio.returns.dates();
        PerformanceSummary {
            name: self.portfolio.name.clone(),
            period_start: dates.first().copied().unwrap_or_default(),
            period_end: dates.last().copied().unwrap_or_default(),
            metrics: self
                .series()
                .map(|s| (s.name.clone(), s.metrics.clone()))
                .collect(),
            horizons: self.horizons.clone(),
            segments: self.segments.clone(),
        }
    }

    /// The `portfolio.json` document.
    pub fn document(&self, last_updated: DateTime<Utc>) -> PortfolioDocument {
        PortfolioDocument::new(
            &self.weights,
            &self.portfolio.metrics,
            self.horizons.to_map(),
            last_updated,
        )
    }

    /// Metrics table for every series.
    pub fn metrics_export(&self) -> MetricsExport {
        MetricsExport::new(self.series().map(|s| (s.name.as_str(), &s.metrics)))
    }

    /// Cumulative and drawdown paths for every series, plus the portfolio's rolling Sharpe.
    pub fn series_export(&self) -> TimeSeriesExport {
        let mut export = TimeSeriesExport::new();
        for s in self.series() {
            export.push_series(&format!("{}:cumulative", s.name), s.cumulative.iter());
            export.push_series(&format!("{}:drawdown", s.name), s.drawdown.iter());
        }
        export.push_series(
            &format!("{}:rolling_sharpe", self.portfolio.name),
            self.rolling_sharpe.iter(),
        );
        export
    }
}

/// Runs the full analysis for one configuration.
#[derive(Debug, Clone)]
pub struct PortfolioAnalysis {
    config: AnalysisConfig,
}

impl PortfolioAnalysis {
    /// Create an analysis, validating the configuration.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Config`] if validation fails.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the portfolio and benchmarks.
    ///
    /// `prices` must contain the portfolio tickers; tickers without data are
    /// dropped from the weights. `benchmark_prices` may be the same matrix.
    /// Horizons are evaluated as of `as_of`.
    ///
    /// Benchmarks that are missing or too short to analyze are logged and
    /// left out of the report.
    ///
    /// # Errors
    /// Fails if no weighted ticker has prices, or the date range holds fewer
    /// than two prices.
    pub fn run(
        &self,
        prices: &PriceMatrix,
        benchmark_prices: Option<&PriceMatrix>,
        as_of: NaiveDate,
    ) -> Result<AnalysisReport> {
        let config = &self.config;
        let engine = config.metrics_engine();
        let calculator = ReturnCalculator::new();

        let prices = prices.between(config.start_date, config.end_date);
        let weights = WeightNormalizer::new().normalize(&config.weights, prices.tickers().iter().map(String::as_str))?;
        let held: Vec<String> = weights.tickers().map(str::to_string).collect();
        let returns = calculator.compute(&prices.select(&held)?)?;

        let simulated = config.rebalancing_simulator().simulate(&returns, &weights)?;
        let portfolio = SeriesAnalysis::from_returns(config.name.clone(), simulated.returns, &engine)?;
        let rolling_sharpe = config.rolling_engine()?.sharpe(&portfolio.returns);

        let mut benchmarks = Vec::new();
        if let Some(benchmark_prices) = benchmark_prices {
            let benchmark_prices = benchmark_prices.between(config.start_date, config.end_date);
            let available: Vec<String> = config
                .benchmarks
                .iter()
                .filter(|b| benchmark_prices.tickers().contains(*b))
                .cloned()
                .collect();
            for missing in config.benchmarks.iter().filter(|b| !available.contains(*b)) {
                warn!(benchmark = %missing, "no prices for benchmark, skipping");
            }
            if !available.is_empty() {
                match calculator.compute(&benchmark_prices.select(&available)?) {
                    Ok(benchmark_returns) => {
                        for name in &available {
                            let Some(series) = benchmark_returns.series(name) else {
                                continue;
                            };
                            match SeriesAnalysis::from_returns(name.clone(), series, &engine) {
                                Ok(analysis) => benchmarks.push(analysis),
                                Err(e) => warn!(benchmark = %name, error = %e, "benchmark metrics failed, skipping"),
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "benchmark prices too short for returns, skipping benchmarks"),
                }
            }
        }

        let cumulative: Vec<(&str, &CumulativeSeries)> = std::iter::once(&portfolio)
            .chain(benchmarks.iter())
            .map(|s| (s.name.as_str(), &s.cumulative))
            .collect();
        let horizons = config.horizon_comparator().compare(&cumulative, as_of);

        info!(
            portfolio = %portfolio.name,
            holdings = weights.len(),
            benchmarks = benchmarks.len(),
            periods = portfolio.metrics.periods,
            "analysis complete"
        );

        Ok(AnalysisReport {
            weights,
            portfolio,
            segments: simulated.segments,
            rolling_sharpe,
            benchmarks,
            horizons,
        })
    }
}

/// Simulate sleeve prices and analyze the resulting portfolio.
///
/// The sleeve allocation becomes the weight mapping; there are no benchmarks
/// and horizons are evaluated as of the last simulated date.
///
/// # Errors
/// Propagates simulation and analysis failures.
pub fn analyze_simulation(simulation: &SimulationConfig) -> Result<AnalysisReport> {
    let prices = PriceSimulator::new(simulation.clone()).simulate()?;
    let (Some(&start_date), Some(&end_date)) = (prices.dates().first(), prices.dates().last()) else {
        return Err(ReturnsError::InsufficientData {
            required: 2,
            actual: 0,
        }
        .into());
    };

    let config = AnalysisConfig {
        name: "Simulated Portfolio".to_string(),
        start_date,
        end_date,
        weights: simulation.allocation(),
        benchmarks: Vec::new(),
        rebalance: false,
        ..AnalysisConfig::default()
    };

    PortfolioAnalysis::new(config)?.run(&prices, None, end_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Days;
    use hobart_returns::{Metric, Observation};
    use ndarray::Array2;
    use std::collections::BTreeMap;

    fn matrix(tickers: &[&str], columns: &[Vec<f64>]) -> PriceMatrix {
        let n = columns[0].len();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dates = (0..n).map(|i| start + Days::new(i as u64)).collect();
        let prices = Array2::from_shape_fn((n, columns.len()), |(r, c)| columns[c][r]);
        PriceMatrix::new(dates, tickers.iter().map(|t| t.to_string()).collect(), prices).unwrap()
    }

    fn config(weights: &[(&str, f64)], benchmarks: &[&str]) -> AnalysisConfig {
        AnalysisConfig {
            name: "Portfolio".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            weights: weights.iter().map(|(t, w)| (t.to_string(), *w)).collect::<BTreeMap<_, _>>(),
            benchmarks: benchmarks.iter().map(|b| b.to_string()).collect(),
            rolling_window: 3,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_single_asset_run() {
        let prices = matrix(&["A"], &[vec![100.0, 110.0, 99.0]]);
        let analysis = PortfolioAnalysis::new(config(&[("A", 1.0)], &[])).unwrap();
        let report = analysis
            .run(&prices, None, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();

        assert_relative_eq!(report.portfolio.cumulative.values()[1], 0.99, epsilon = 1e-12);
        assert_relative_eq!(report.portfolio.metrics.max_drawdown, -0.10, epsilon = 1e-12);
        assert!(report.rolling_sharpe.values().iter().all(|o| !o.is_available()));
        assert!(report.benchmarks.is_empty());
    }

    #[test]
    fn test_missing_ticker_dropped_from_weights() {
        let prices = matrix(&["A"], &[vec![100.0, 101.0, 102.0, 101.5]]);
        let analysis = PortfolioAnalysis::new(config(&[("A", 3.0), ("B", 1.0)], &[])).unwrap();
        let report = analysis
            .run(&prices, None, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();
        assert_relative_eq!(report.weights.get("A").unwrap(), 1.0);
        assert_eq!(report.weights.len(), 1);
    }

    #[test]
    fn test_benchmarks_share_metrics_path() {
        let prices = matrix(
            &["A", "B"],
            &[vec![100.0, 102.0, 101.0, 104.0], vec![50.0, 50.5, 49.0, 51.0]],
        );
        let benchmark = matrix(&["SPY"], &[vec![400.0, 404.0, 402.0, 410.0]]);
        let analysis = PortfolioAnalysis::new(config(&[("A", 0.5), ("B", 0.5)], &["SPY", "QQQ"])).unwrap();
        let report = analysis
            .run(&prices, Some(&benchmark), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();

        assert_eq!(report.benchmarks.len(), 1);
        let spy = &report.benchmarks[0];
        let direct = MetricsEngine::default().compute(&spy.returns).unwrap();
        assert_eq!(spy.metrics, direct);
        assert_relative_eq!(spy.metrics.total_return, 410.0 / 400.0 - 1.0, epsilon = 1e-12);

        assert_eq!(report.horizons.series, vec!["Portfolio".to_string(), "SPY".to_string()]);
        assert!(matches!(
            report.horizons.get("Since Inception", "SPY"),
            Some(Observation::Value(_))
        ));
        assert_eq!(report.horizons.get("1M", "SPY"), Some(Observation::NotAvailable));
    }

    #[test]
    fn test_exports_cover_all_series() {
        let prices = matrix(&["A"], &[vec![100.0, 101.0, 99.0, 103.0, 104.0]]);
        let benchmark = matrix(&["SPY"], &[vec![400.0, 401.0, 402.0, 399.0, 405.0]]);
        let report = PortfolioAnalysis::new(config(&[("A", 1.0)], &["SPY"]))
            .unwrap()
            .run(&prices, Some(&benchmark), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();

        // 2 series x (cumulative + drawdown) x 4 returns + 4 rolling points
        assert_eq!(report.series_export().len(), 20);
        assert_eq!(report.metrics_export().records.len(), 2);
        let document = report.document(Utc::now());
        assert_relative_eq!(document.total_weight(), 1.0, epsilon = 1e-12);
        assert!(report.summary().to_ascii_table().contains("SPY"));
    }

    #[test]
    fn test_too_short_history_is_insufficient_data() {
        let prices = matrix(&["A"], &[vec![100.0]]);
        let result = PortfolioAnalysis::new(config(&[("A", 1.0)], &[]))
            .unwrap()
            .run(&prices, None, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(matches!(
            result,
            Err(AnalysisError::Returns(ReturnsError::InsufficientData { .. }))
        ));
    }

    #[test]
    fn test_two_price_benchmark_reports_undefined_volatility() {
        let prices = matrix(&["A"], &[vec![100.0, 101.0, 99.0, 103.0, 104.0]]);
        let benchmark = matrix(&["SPY"], &[vec![400.0, 404.0]]);
        let report = PortfolioAnalysis::new(config(&[("A", 1.0)], &["SPY"]))
            .unwrap()
            .run(&prices, Some(&benchmark), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();

        assert_eq!(report.portfolio.metrics.periods, 4);
        assert_eq!(report.benchmarks.len(), 1);
        let spy = &report.benchmarks[0].metrics;
        assert_eq!(spy.periods, 1);
        assert_relative_eq!(spy.total_return, 0.01, epsilon = 1e-12);
        assert!(!spy.volatility.is_defined());
        assert!(!spy.sharpe.is_defined());
    }

    #[test]
    fn test_single_price_benchmark_is_skipped() {
        let prices = matrix(&["A"], &[vec![100.0, 101.0, 99.0, 103.0]]);
        let benchmark = matrix(&["SPY"], &[vec![400.0]]);
        let report = PortfolioAnalysis::new(config(&[("A", 1.0)], &["SPY"]))
            .unwrap()
            .run(&prices, Some(&benchmark), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            .unwrap();

        assert!(report.benchmarks.is_empty());
        assert_eq!(report.horizons.series, vec!["Portfolio".to_string()]);
        assert_eq!(report.portfolio.metrics.periods, 3);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let sim = SimulationConfig::with_years(42, 1);
        let a = analyze_simulation(&sim).unwrap();
        let b = analyze_simulation(&sim).unwrap();

        assert_eq!(a.portfolio.returns, b.portfolio.returns);
        assert_eq!(a.portfolio.metrics.periods, 252);
        assert!(matches!(a.portfolio.metrics.cagr, Metric::Value(_)));
        assert_eq!(a.weights.len(), 9);
        assert_relative_eq!(a.weights.get("ROBO").unwrap(), 0.32, epsilon = 1e-12);
    }
}
