#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod format;
pub mod summary;

pub use export::{
    ExportError, ExportFormat, Exporter, MetricsExport, MetricsRecord, PortfolioDocument, PortfolioHolding,
    SeriesPoint, TimeSeriesExport,
};
pub use format::{format_metric_percent, format_metric_ratio, format_percent, format_snapshot};
pub use summary::PerformanceSummary;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
