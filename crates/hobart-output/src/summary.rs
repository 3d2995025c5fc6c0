//! Performance summary tables.
//!
//! A [`PerformanceSummary`] pairs the whole-period metrics of every series
//! (portfolio first, then benchmarks) with the trailing horizon returns, and
//! renders both as ASCII or Markdown.

use crate::format::{format_metric_percent, format_metric_ratio, format_observation_percent, format_percent};
use chrono::NaiveDate;
use hobart_returns::{HorizonTable, MetricsSnapshot, RebalanceSegment};
use serde::Serialize;
use std::fmt;

/// Metrics and horizon returns for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    /// Portfolio name
    pub name: String,
    /// First return date
    pub period_start: NaiveDate,
    /// Last return date
    pub period_end: NaiveDate,
    /// Metrics per series, in display order
    pub metrics: Vec<(String, MetricsSnapshot)>,
    /// Trailing returns per horizon
    pub horizons: HorizonTable,
    /// Rebalancing segments of the portfolio
    pub segments: Vec<RebalanceSegment>,
}

impl PerformanceSummary {
    /// Render as a fixed-width ASCII report.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nPerformance Summary: {}\n", self.name));
        output.push_str(&format!("Period: {} to {}\n", self.period_start, self.period_end));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nRisk & Return Metrics:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>10} {:>10} {:>11} {:>8} {:>12}\n",
            "Series", "Total", "CAGR", "Volatility", "Sharpe", "Max DD"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');
        for (series, m) in &self.metrics {
            output.push_str(&format!(
                "{:<24} {:>10} {:>10} {:>11} {:>8} {:>12}\n",
                truncate(series, 24),
                format_percent(m.total_return),
                format_metric_percent(m.cagr),
                format_metric_percent(m.volatility),
                format_metric_ratio(m.sharpe),
                format_percent(m.max_drawdown),
            ));
        }

        if !self.horizons.rows.is_empty() {
            output.push_str("\nTrailing Returns");
            if let Some(as_of) = self.horizons.as_of {
                output.push_str(&format!(" (as of {as_of})"));
            }
            output.push_str(":\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');

            output.push_str(&format!("{:<16}", "Horizon"));
            for series in &self.horizons.series {
                output.push_str(&format!(" {:>12}", truncate(series, 12)));
            }
            output.push('\n');
            for row in &self.horizons.rows {
                output.push_str(&format!("{:<16}", truncate(&row.label, 16)));
                for series in &self.horizons.series {
                    let cell = self.horizons.get(&row.label, series).map_or_else(
                        || crate::format::NOT_AVAILABLE.to_string(),
                        format_observation_percent,
                    );
                    output.push_str(&format!(" {cell:>12}"));
                }
                output.push('\n');
            }
        }

        if self.segments.len() > 1 {
            output.push_str(&format!("\nRebalancing segments: {}\n", self.segments.len()));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Performance Summary: {}\n\n", self.name));
        output.push_str(&format!(
            "**Period:** {} to {}\n\n",
            self.period_start, self.period_end
        ));

        output.push_str("## Risk & Return Metrics\n\n");
        output.push_str("| Series | Total Return | CAGR | Volatility | Sharpe Ratio | Max Drawdown |\n");
        output.push_str("|--------|--------------|------|------------|--------------|--------------|\n");
        for (series, m) in &self.metrics {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                series,
                format_percent(m.total_return),
                format_metric_percent(m.cagr),
                format_metric_percent(m.volatility),
                format_metric_ratio(m.sharpe),
                format_percent(m.max_drawdown),
            ));
        }

        if !self.horizons.rows.is_empty() {
            output.push_str("\n## Trailing Returns\n\n");
            output.push_str("| Horizon |");
            for series in &self.horizons.series {
                output.push_str(&format!(" {series} |"));
            }
            output.push_str("\n|---------|");
            for _ in &self.horizons.series {
                output.push_str("------|");
            }
            output.push('\n');
            for row in &self.horizons.rows {
                output.push_str(&format!("| {} |", row.label));
                for series in &self.horizons.series {
                    let cell = self
                        .horizons
                        .get(&row.label, series)
                        .map_or_else(|| crate::format::NOT_AVAILABLE.to_string(), format_observation_percent);
                    output.push_str(&format!(" {cell} |"));
                }
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_returns::{DomainError, HorizonRow, Metric, Observation};
    use std::collections::BTreeMap;

    fn sample_summary() -> PerformanceSummary {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let portfolio = MetricsSnapshot {
            periods: 252,
            total_return: 0.12,
            cagr: Metric::Value(0.12),
            volatility: Metric::Value(0.2),
            sharpe: Metric::Value(0.6),
            max_drawdown: -0.15,
        };
        let flat = MetricsSnapshot {
            periods: 252,
            total_return: 0.0,
            cagr: Metric::Value(0.0),
            volatility: Metric::Value(0.0),
            sharpe: Metric::Undefined(DomainError::ZeroVolatility),
            max_drawdown: 0.0,
        };

        let returns: BTreeMap<String, Observation> = [
            ("Portfolio".to_string(), Observation::Value(0.034)),
            ("SPY".to_string(), Observation::NotAvailable),
        ]
        .into_iter()
        .collect();

        PerformanceSummary {
            name: "ESG Automation".to_string(),
            period_start: d(1, 2),
            period_end: d(6, 30),
            metrics: vec![("Portfolio".to_string(), portfolio), ("SPY".to_string(), flat)],
            horizons: HorizonTable {
                as_of: Some(d(6, 30)),
                series: vec!["Portfolio".to_string(), "SPY".to_string()],
                rows: vec![HorizonRow {
                    label: "1M".to_string(),
                    returns,
                }],
            },
            segments: vec![],
        }
    }

    #[test]
    fn test_ascii_table() {
        let ascii = sample_summary().to_ascii_table();
        assert!(ascii.contains("Performance Summary: ESG Automation"));
        assert!(ascii.contains("12.00%"));
        assert!(ascii.contains("-15.00%"));
        assert!(ascii.contains("3.40%"));
        assert!(ascii.contains("n/a"));
        assert!(ascii.contains("as of 2025-06-30"));
    }

    #[test]
    fn test_markdown() {
        let markdown = sample_summary().to_markdown();
        assert!(markdown.contains("# Performance Summary: ESG Automation"));
        assert!(markdown.contains("| Series | Total Return |"));
        assert!(markdown.contains("| 1M | 3.40% | n/a |"));
        assert!(markdown.contains("| SPY | 0.00% | 0.00% | 0.00% | n/a | 0.00% |"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Other ESG Automation", 8), "Other E~");
        assert_eq!(truncate("SPY", 8), "SPY");
    }
}
