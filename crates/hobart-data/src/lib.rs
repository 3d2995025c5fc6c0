#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod csv_prices;
pub mod error;
pub mod simulate;
pub mod yahoo;

pub use align::{AlignedPrices, PriceHistory, align_prices};
pub use csv_prices::{load_wide_prices, read_wide_prices};
pub use error::{DataError, Result};
pub use simulate::{PriceSimulator, SimulationConfig, SleeveAssumption};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
