//! Data pipeline for fetching and aligning portfolio and benchmark prices.
//!
//! Yahoo Finance requests run concurrently; symbols that fail to download are
//! reported and left out, and the alignment step then drops any ticker that
//! does not cover the full calendar.

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use hobart::AnalysisConfig;
use hobart_data::yahoo::YahooQuoteProvider;
use hobart_data::{AlignedPrices, DataError, PriceHistory, align_prices, load_wide_prices};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Error type for data pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DataPipelineError {
    /// Price loading or alignment error.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Every requested symbol failed to download.
    #[error("No prices could be fetched for any of {0} symbols")]
    NothingFetched(usize),
}

/// Default number of concurrent fetches.
const DEFAULT_CONCURRENCY: usize = 10;

/// Aligned prices ready for analysis.
#[derive(Debug)]
pub(crate) struct MarketData {
    /// Portfolio holdings
    pub portfolio: AlignedPrices,
    /// Benchmarks, if any were requested and found
    pub benchmarks: Option<AlignedPrices>,
}

/// Load prices from CSV files.
///
/// Benchmarks default to the portfolio file when no separate file is given;
/// the analysis only picks the configured benchmark columns out of it.
pub(crate) fn load_csv_market_data(
    prices: &Path,
    benchmark_prices: Option<&Path>,
) -> Result<MarketData, DataPipelineError> {
    let raw = load_wide_prices(prices)?;
    let benchmarks = match benchmark_prices {
        Some(path) => Some(align_benchmarks(&load_wide_prices(path)?)),
        None => None,
    };
    let portfolio = align_prices(&raw)?;
    let benchmarks = benchmarks.unwrap_or_else(|| Some(portfolio.clone()));
    Ok(MarketData {
        portfolio,
        benchmarks,
    })
}

/// Fetch every portfolio and benchmark ticker from Yahoo Finance.
///
/// Holdings and benchmarks are aligned separately so that a benchmark with a
/// shorter history does not shorten the portfolio calendar.
pub(crate) async fn fetch_market_data(
    provider: &YahooQuoteProvider,
    config: &AnalysisConfig,
    progress: Option<&ProgressBar>,
) -> Result<MarketData, DataPipelineError> {
    let symbols = config.all_tickers();
    let mut histories =
        fetch_price_histories(provider, &symbols, config.start_date, config.end_date, progress).await?;

    let benchmark_histories: BTreeMap<String, PriceHistory> = config
        .benchmarks
        .iter()
        .filter_map(|b| histories.get(b).map(|h| (b.clone(), h.clone())))
        .collect();
    histories.retain(|symbol, _| config.weights.contains_key(symbol));

    let portfolio = align_prices(&histories)?;
    let benchmarks = if benchmark_histories.is_empty() {
        warn!("no benchmark prices were fetched");
        None
    } else {
        align_benchmarks(&benchmark_histories)
    };

    Ok(MarketData {
        portfolio,
        benchmarks,
    })
}

/// Align benchmark histories on their own calendar.
///
/// Benchmarks never abort a run: when none covers the full calendar the
/// analysis proceeds without them.
fn align_benchmarks(histories: &BTreeMap<String, PriceHistory>) -> Option<AlignedPrices> {
    match align_prices(histories) {
        Ok(aligned) => Some(aligned),
        Err(e) => {
            warn!(error = %e, "no usable benchmark prices, continuing without benchmarks");
            None
        }
    }
}

/// Fetch daily prices for each symbol with an optional progress bar.
///
/// Failed symbols are logged and skipped. Fails only if nothing could be fetched.
pub(crate) async fn fetch_price_histories(
    provider: &YahooQuoteProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    progress: Option<&ProgressBar>,
) -> Result<BTreeMap<String, PriceHistory>, DataPipelineError> {
    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_position(0);
        pb.set_message(format!(
            "Fetching {} symbols ({} concurrent)...",
            symbols.len(),
            DEFAULT_CONCURRENCY
        ));
    }

    let results: Vec<_> = stream::iter(symbols.iter().cloned())
        .map(|symbol| async move {
            match provider.fetch_prices(&symbol, start, end).await {
                Ok(history) => Ok((symbol, history)),
                Err(e) => Err((symbol, e)),
            }
        })
        .buffer_unordered(DEFAULT_CONCURRENCY)
        .inspect(|_| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
        })
        .collect()
        .await;

    let mut histories = BTreeMap::new();
    for result in results {
        match result {
            Ok((symbol, history)) if history.is_empty() => {
                report_failure(progress, &symbol, "no quotes in range");
            }
            Ok((symbol, history)) => {
                histories.insert(symbol, history);
            }
            Err((symbol, e)) => report_failure(progress, &symbol, &e.to_string()),
        }
    }

    if histories.is_empty() {
        return Err(DataPipelineError::NothingFetched(symbols.len()));
    }

    info!(
        fetched = histories.len(),
        requested = symbols.len(),
        "price download finished"
    );
    Ok(histories)
}

fn report_failure(progress: Option<&ProgressBar>, symbol: &str, reason: &str) {
    match progress {
        Some(pb) => pb.suspend(|| warn!(%symbol, %reason, "failed to fetch prices")),
        None => warn!(%symbol, %reason, "failed to fetch prices"),
    }
}
