//! Market data acquisition for the command-line runs.
//!
//! Prices come either from wide CSV files or from Yahoo Finance, and are
//! aligned onto a common calendar before analysis.

pub(crate) mod data_pipeline;
