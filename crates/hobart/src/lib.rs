#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod config;

// Re-export component crates
pub use hobart_data as data;
pub use hobart_output as output;
pub use hobart_returns as returns;

pub use analysis::{AnalysisError, AnalysisReport, PortfolioAnalysis, SeriesAnalysis, analyze_simulation};
pub use config::{AnalysisConfig, ConfigError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
