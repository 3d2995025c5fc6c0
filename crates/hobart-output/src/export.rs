//! Export of analysis results.
//!
//! Three artifacts are produced: the [`PortfolioDocument`] (`portfolio.json`)
//! consumed by the dashboard, the per-series metrics table, and long-format
//! time series (`date,series,value`).

use crate::format::format_snapshot;
use chrono::{DateTime, NaiveDate, Utc};
use hobart_returns::{MetricsSnapshot, Observation, WeightVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn json_string<T: Serialize>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// A single holding in a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHolding {
    /// Security symbol.
    pub symbol: String,

    /// Weight in the portfolio (0.0 to 1.0).
    pub weight: f64,
}

/// The `portfolio.json` document.
///
/// `metrics` holds display strings (`"12.34%"`), and `performance` maps each
/// horizon to each series' trailing return, `null` when not available.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioDocument {
    /// Normalized weights by ticker
    pub portfolio_weights: BTreeMap<String, f64>,
    /// Formatted portfolio metrics
    pub metrics: BTreeMap<String, String>,
    /// Holdings, largest weight first
    pub holdings: Vec<PortfolioHolding>,
    /// Horizon label to series to trailing return
    pub performance: BTreeMap<String, BTreeMap<String, Observation>>,
    /// Generation time
    pub last_updated: DateTime<Utc>,
}

impl PortfolioDocument {
    /// Assemble the document from analysis results.
    pub fn new(
        weights: &WeightVector,
        metrics: &MetricsSnapshot,
        performance: BTreeMap<String, BTreeMap<String, Observation>>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let mut holdings: Vec<PortfolioHolding> = weights
            .iter()
            .map(|(symbol, weight)| PortfolioHolding {
                symbol: symbol.to_string(),
                weight,
            })
            .collect();
        holdings.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.symbol.cmp(&b.symbol)));

        Self {
            portfolio_weights: weights.as_map().clone(),
            metrics: format_snapshot(metrics),
            holdings,
            performance,
            last_updated,
        }
    }

    /// Get total portfolio weight (should be close to 1.0).
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }
}

impl Exporter for PortfolioDocument {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();
                output.push_str(&format!("# Last Updated: {}\n", self.last_updated.to_rfc3339()));
                output.push_str(&format!("# Total Weight: {}\n", self.total_weight()));

                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["symbol", "weight"])?;
                for holding in &self.holdings {
                    wtr.write_record([holding.symbol.as_str(), &holding.weight.to_string()])?;
                }
                output.push_str(&finish_csv(wtr)?);
                Ok(output)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
        }
    }
}

/// One row of the metrics table, formatted for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsRecord {
    /// Series name
    pub series: String,
    /// Number of daily returns
    pub periods: usize,
    /// Total return
    pub total_return: String,
    /// Compound annual growth rate
    pub cagr: String,
    /// Annualized volatility
    pub volatility: String,
    /// Sharpe ratio
    pub sharpe_ratio: String,
    /// Maximum drawdown
    pub max_drawdown: String,
}

/// Metrics for every series of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsExport {
    /// Rows in display order
    pub records: Vec<MetricsRecord>,
}

impl MetricsExport {
    /// Build from `(series, snapshot)` pairs.
    pub fn new<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a MetricsSnapshot)>,
    {
        let records = rows
            .into_iter()
            .map(|(series, snapshot)| {
                let mut formatted = format_snapshot(snapshot);
                let mut take = |key: &str| formatted.remove(key).unwrap_or_default();
                MetricsRecord {
                    series: series.to_string(),
                    periods: snapshot.periods,
                    total_return: take("total_return"),
                    cagr: take("cagr"),
                    volatility: take("volatility"),
                    sharpe_ratio: take("sharpe_ratio"),
                    max_drawdown: take("max_drawdown"),
                }
            })
            .collect();
        Self { records }
    }
}

impl Exporter for MetricsExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in &self.records {
                    wtr.serialize(record)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(&self.records, format),
        }
    }
}

/// One observation of a named series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    /// Observation date
    pub date: NaiveDate,
    /// Series name, e.g. `Portfolio:cumulative`
    pub series: String,
    /// Value, empty when not available
    pub value: Option<f64>,
}

/// Long-format collection of dated series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimeSeriesExport {
    /// All points, grouped by series in insertion order
    pub points: Vec<SeriesPoint>,
}

impl TimeSeriesExport {
    /// Create an empty export.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a series.
    pub fn push_series<I, V>(&mut self, name: &str, points: I)
    where
        I: IntoIterator<Item = (NaiveDate, V)>,
        V: Into<Observation>,
    {
        self.points.extend(points.into_iter().map(|(date, value)| SeriesPoint {
            date,
            series: name.to_string(),
            value: value.into().value(),
        }));
    }

    /// Append a series, builder style.
    pub fn with_series<I, V>(mut self, name: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, V)>,
        V: Into<Observation>,
    {
        self.push_series(name, points);
        self
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Exporter for TimeSeriesExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for point in &self.points {
                    wtr.serialize(point)?;
                }
                finish_csv(wtr)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(&self.points, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hobart_returns::{DomainError, Metric, WeightNormalizer};

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            periods: 756,
            total_return: 0.4567,
            cagr: Metric::Value(0.1335),
            volatility: Metric::Value(0.1821),
            sharpe: Metric::Undefined(DomainError::ZeroVolatility),
            max_drawdown: -0.2104,
        }
    }

    fn document() -> PortfolioDocument {
        let raw: BTreeMap<String, f64> = [("ROBO".to_string(), 32.0), ("NEE".to_string(), 8.0)]
            .into_iter()
            .collect();
        let weights = WeightNormalizer::new().normalize(&raw, ["ROBO", "NEE"]).unwrap();
        let performance = [(
            "1M".to_string(),
            [
                ("Portfolio".to_string(), Observation::Value(0.02)),
                ("SPY".to_string(), Observation::NotAvailable),
            ]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();
        PortfolioDocument::new(
            &weights,
            &snapshot(),
            performance,
            Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_document_json_shape() {
        let json = document().export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["portfolio_weights"]["ROBO"], 0.8);
        assert_eq!(value["metrics"]["cagr"], "13.35%");
        assert_eq!(value["metrics"]["sharpe_ratio"], "n/a");
        assert_eq!(value["holdings"][0]["symbol"], "ROBO");
        assert_eq!(value["performance"]["1M"]["Portfolio"], 0.02);
        assert!(value["performance"]["1M"]["SPY"].is_null());
        assert!(value["last_updated"].as_str().unwrap().starts_with("2025-07-01T12:00:00"));
    }

    #[test]
    fn test_document_csv_holdings() {
        let csv = document().export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("# Total Weight: 1"));
        assert!(csv.contains("symbol,weight"));
        assert!(csv.contains("ROBO,0.8"));
    }

    #[test]
    fn test_metrics_csv() {
        let snap = snapshot();
        let export = MetricsExport::new([("Portfolio", &snap)]);
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "series,periods,total_return,cagr,volatility,sharpe_ratio,max_drawdown"
        );
        assert_eq!(lines.next().unwrap(), "Portfolio,756,45.67%,13.35%,18.21%,n/a,-21.04%");
    }

    #[test]
    fn test_time_series_csv_blank_for_missing() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let export = TimeSeriesExport::new()
            .with_series("Portfolio:cumulative", [(d(2), 1.01), (d(3), 1.02)])
            .with_series(
                "Portfolio:rolling_sharpe",
                [(d(2), Observation::NotAvailable), (d(3), Observation::Value(0.5))],
            );

        assert_eq!(export.len(), 4);
        let csv = export.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("date,series,value\n"));
        assert!(csv.contains("2024-01-02,Portfolio:rolling_sharpe,\n"));
        assert!(csv.contains("2024-01-03,Portfolio:rolling_sharpe,0.5\n"));
    }

    #[test]
    fn test_export_to_file_creates_directories() {
        let dir = std::env::temp_dir().join(format!("hobart-export-{}", std::process::id()));
        let path = dir.join("nested").join("portfolio.json");
        document().export_to_file(&path, ExportFormat::PrettyJson).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"portfolio_weights\""));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
