#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod compound;
pub mod error;
pub mod horizon;
pub mod metrics;
pub mod rebalance;
pub mod returns;
pub mod rolling;
pub mod stats;
pub mod types;
pub mod weights;

// Re-export main types
pub use compound::{compound, decompound, drawdown_series};
pub use error::{DomainError, Result, ReturnsError};
pub use horizon::{Horizon, HorizonComparator, HorizonKind, HorizonRow, HorizonTable, default_horizons};
pub use metrics::{Metric, MetricsEngine, MetricsSnapshot, TRADING_DAYS_PER_YEAR};
pub use rebalance::{RebalanceFrequency, RebalanceSegment, RebalancingSimulator, SimulatedPortfolio};
pub use returns::ReturnCalculator;
pub use rolling::{DEFAULT_ROLLING_WINDOW, RollingRiskEngine};
pub use types::{
    CumulativeSeries, DrawdownSeries, Observation, PriceMatrix, ReturnMatrix, ReturnSeries, RollingSeries,
};
pub use weights::{WeightNormalizer, WeightVector};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
