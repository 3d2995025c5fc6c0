//! Display formatting for metrics and horizon returns.

use hobart_returns::{Metric, MetricsSnapshot, Observation};
use std::collections::BTreeMap;

/// Marker printed for undefined or unavailable values.
pub const NOT_AVAILABLE: &str = "n/a";

/// `0.1234` -> `"12.34%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// `1.2345` -> `"1.23"`.
pub fn format_ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// Percentage, or `"n/a"` when undefined.
pub fn format_metric_percent(metric: Metric) -> String {
    metric.value().map_or_else(|| NOT_AVAILABLE.to_string(), format_percent)
}

/// Ratio, or `"n/a"` when undefined.
pub fn format_metric_ratio(metric: Metric) -> String {
    metric.value().map_or_else(|| NOT_AVAILABLE.to_string(), format_ratio)
}

/// Percentage, or `"n/a"` when not available.
pub fn format_observation_percent(observation: Observation) -> String {
    observation
        .value()
        .map_or_else(|| NOT_AVAILABLE.to_string(), format_percent)
}

/// Metric name to formatted value, keyed the way the portfolio document expects.
pub fn format_snapshot(snapshot: &MetricsSnapshot) -> BTreeMap<String, String> {
    [
        ("total_return", format_percent(snapshot.total_return)),
        ("cagr", format_metric_percent(snapshot.cagr)),
        ("volatility", format_metric_percent(snapshot.volatility)),
        ("sharpe_ratio", format_metric_ratio(snapshot.sharpe)),
        ("max_drawdown", format_percent(snapshot.max_drawdown)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
