//! End-to-end checks of the return engine on small hand-computed portfolios.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use hobart_returns::{
    HorizonComparator, Horizon, MetricsEngine, Observation, PriceMatrix, RebalanceFrequency,
    RebalancingSimulator, ReturnCalculator, RollingRiskEngine, WeightNormalizer, compound, decompound,
    drawdown_series,
};
use ndarray::{Array2, array};
use rstest::rstest;
use std::collections::BTreeMap;

fn calendar(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n).map(|i| start + Days::new(i as u64)).collect()
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

#[test]
fn test_single_asset_pipeline() {
    let prices = PriceMatrix::new(calendar(start(), 3), vec!["A".to_string()], array![[100.0], [110.0], [99.0]])
        .unwrap();
    let returns = ReturnCalculator::new().compute(&prices).unwrap();

    let raw: BTreeMap<String, f64> = [("A".to_string(), 1.0)].into_iter().collect();
    let weights = WeightNormalizer::new()
        .normalize(&raw, returns.tickers().iter().map(String::as_str))
        .unwrap();

    let portfolio = RebalancingSimulator::new(false, RebalanceFrequency::Quarterly)
        .simulate(&returns, &weights)
        .unwrap();
    assert_relative_eq!(portfolio.returns.values()[0], 0.10, epsilon = 1e-12);
    assert_relative_eq!(portfolio.returns.values()[1], -0.10, epsilon = 1e-12);

    let cumulative = compound(&portfolio.returns);
    assert_relative_eq!(cumulative.values()[0], 1.10, epsilon = 1e-12);
    assert_relative_eq!(cumulative.values()[1], 0.99, epsilon = 1e-12);

    let mdd = MetricsEngine::default().max_drawdown(&cumulative).unwrap();
    assert_relative_eq!(mdd, -0.10, epsilon = 1e-12);
}

#[test]
fn test_missing_ticker_weight_is_redistributed() {
    let raw: BTreeMap<String, f64> = [("A".to_string(), 3.0), ("B".to_string(), 1.0)].into_iter().collect();
    let weights = WeightNormalizer::new().normalize(&raw, ["A"]).unwrap();
    assert_relative_eq!(weights.get("A").unwrap(), 1.0, epsilon = 1e-12);
    assert!(weights.get("B").is_none());
}

#[rstest]
#[case(&[("A", 0.32), ("B", 0.08), ("C", 0.05)])]
#[case(&[("A", 1.0), ("B", 1.0), ("C", 1.0)])]
#[case(&[("A", 7.5), ("B", 0.0), ("C", 2.5)])]
fn test_normalized_weights_sum_to_one(#[case] pairs: &[(&str, f64)]) {
    let raw: BTreeMap<String, f64> = pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect();
    let weights = WeightNormalizer::new().normalize(&raw, ["A", "B", "C"]).unwrap();
    assert_relative_eq!(weights.total(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_compound_then_decompound_recovers_portfolio_returns() {
    let prices = PriceMatrix::new(
        calendar(start(), 6),
        vec!["A".to_string(), "B".to_string()],
        array![[10.0, 50.0], [10.5, 49.0], [10.2, 51.0], [10.9, 52.5], [10.7, 52.0], [11.1, 53.0]],
    )
    .unwrap();
    let returns = ReturnCalculator::new().compute(&prices).unwrap();
    let raw: BTreeMap<String, f64> = [("A".to_string(), 0.6), ("B".to_string(), 0.4)].into_iter().collect();
    let weights = WeightNormalizer::new().normalize(&raw, ["A", "B"]).unwrap();
    let portfolio = RebalancingSimulator::default().simulate(&returns, &weights).unwrap();

    let recovered = decompound(&compound(&portfolio.returns));
    for (a, b) in recovered.values().iter().zip(portfolio.returns.values()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_rolling_window_three_over_five_points() {
    let prices = PriceMatrix::new(
        calendar(start(), 6),
        vec!["A".to_string()],
        array![[100.0], [101.0], [99.0], [102.0], [102.5], [101.0]],
    )
    .unwrap();
    let series = ReturnCalculator::new().compute(&prices).unwrap().series("A").unwrap();
    assert_eq!(series.len(), 5);

    let rolling = RollingRiskEngine::new(3, 252.0).unwrap().sharpe(&series);
    assert!(!rolling.values()[0].is_available());
    assert!(!rolling.values()[1].is_available());
    assert!(rolling.values()[2..].iter().all(|o| o.is_available()));
}

#[test]
fn test_cagr_doubling_over_two_years() {
    // 504 returns whose product is exactly 2.
    let n = 504;
    let r = 2.0_f64.powf(1.0 / n as f64) - 1.0;
    let mut prices = Array2::<f64>::zeros((n + 1, 1));
    prices[[0, 0]] = 1.0;
    for i in 1..=n {
        prices[[i, 0]] = prices[[i - 1, 0]] * (1.0 + r);
    }
    let matrix = PriceMatrix::new(calendar(start(), n + 1), vec!["A".to_string()], prices).unwrap();
    let series = ReturnCalculator::new().compute(&matrix).unwrap().series("A").unwrap();

    let snapshot = MetricsEngine::default().compute(&series).unwrap();
    assert_relative_eq!(snapshot.cagr.value().unwrap(), 0.4142, epsilon = 1e-4);
    assert_relative_eq!(snapshot.total_return, 1.0, epsilon = 1e-9);
}

#[test]
fn test_drawdown_never_positive() {
    let prices = PriceMatrix::new(
        calendar(start(), 7),
        vec!["A".to_string()],
        array![[100.0], [95.0], [97.0], [120.0], [80.0], [81.0], [130.0]],
    )
    .unwrap();
    let series = ReturnCalculator::new().compute(&prices).unwrap().series("A").unwrap();
    let drawdown = drawdown_series(&compound(&series));
    assert!(drawdown.values().iter().all(|&d| d <= 0.0));
    assert_relative_eq!(
        MetricsEngine::default().max_drawdown(&compound(&series)).unwrap(),
        80.0 / 120.0 - 1.0,
        epsilon = 1e-12
    );
}

#[rstest]
#[case(4, false)]
#[case(5, false)]
#[case(40, false)]
#[case(3, true)]
fn test_horizon_lookback_availability(#[case] lookback: usize, #[case] available: bool) {
    let prices = PriceMatrix::new(
        calendar(start(), 5),
        vec!["A".to_string()],
        array![[100.0], [101.0], [102.0], [103.0], [104.0]],
    )
    .unwrap();
    let series = ReturnCalculator::new().compute(&prices).unwrap().series("A").unwrap();
    let cumulative = compound(&series);
    assert_eq!(cumulative.len(), 4);

    let table = HorizonComparator::new(vec![Horizon::lookback("h", lookback)])
        .compare(&[("A", &cumulative)], NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    let cell = table.get("h", "A").unwrap();
    assert_eq!(cell.is_available(), available);
    if !available {
        assert_eq!(cell, Observation::NotAvailable);
    }
}
