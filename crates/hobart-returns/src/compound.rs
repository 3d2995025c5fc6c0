//! Compounding of daily returns into growth-of-$1 paths.
//!
//! Shared by the portfolio and every benchmark. The growth factor starts at 1
//! immediately before the first return, so entry `t` is
//! `(1 + r_0) * ... * (1 + r_t)`.

use crate::types::{CumulativeSeries, DrawdownSeries, ReturnSeries};

/// Running product of `(1 + r)` over a return series.
pub fn compound(returns: &ReturnSeries) -> CumulativeSeries {
    let values = returns
        .values()
        .iter()
        .scan(1.0_f64, |growth, &r| {
            *growth *= 1.0 + r;
            Some(*growth)
        })
        .collect();

    CumulativeSeries::from_validated(returns.dates().to_vec(), values)
}

/// Recover per-period returns from a cumulative series.
///
/// The first return is measured against the implicit starting value of 1.
pub fn decompound(cumulative: &CumulativeSeries) -> ReturnSeries {
    let values = cumulative
        .values()
        .iter()
        .scan(1.0_f64, |previous, &growth| {
            let r = growth / *previous - 1.0;
            *previous = growth;
            Some(r)
        })
        .collect();

    ReturnSeries::from_validated(cumulative.dates().to_vec(), values)
}

/// Percentage distance below the running peak: `growth[t] / max(growth[..=t]) - 1`.
pub fn drawdown_series(cumulative: &CumulativeSeries) -> DrawdownSeries {
    let values = cumulative
        .values()
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &growth| {
            *peak = peak.max(growth);
            Some(growth / *peak - 1.0)
        })
        .collect();

    DrawdownSeries::from_validated(cumulative.dates().to_vec(), values)
}
