//! Income conversion through in-memory providers.
//!
//! Validates that:
//! - the FX series is fetched over the income years only
//! - years without an FX rate are dropped from the output
//! - missing income and missing FX are distinct errors

use aporte_backtest::{IncomeConverter, IncomeError, DEFAULT_FX_SYMBOL};
use aporte_md::{AnnualFigure, ProviderError};
use aporte_testkit::{d, raw, StaticFundamentals, StaticProvider};

fn fig(year: i32, value: f64) -> AnnualFigure {
    AnnualFigure { year, value }
}

#[tokio::test]
async fn income_is_converted_at_annual_mean_rate() {
    let fundamentals = StaticFundamentals::new().with_income(
        "WEGE3.SA",
        vec![fig(2021, 3.6e9), fig(2022, 4.2e9), fig(2023, 5.7e9)],
    );
    let prices = StaticProvider::new().with_series(
        DEFAULT_FX_SYMBOL,
        vec![
            raw("2021-03-01", 5.0),
            raw("2021-09-01", 5.8),
            raw("2022-06-01", 5.25),
            // 2023 absent: that year must be dropped.
        ],
    );

    let out = IncomeConverter::new(2020, 2024)
        .convert(&fundamentals, &prices, "WEGE3")
        .await
        .unwrap();

    let years: Vec<i32> = out.iter().map(|c| c.year).collect();
    assert_eq!(years, vec![2021, 2022]);
    assert!((out[0].fx_rate - 5.4).abs() < 1e-12);
    assert!((out[0].converted_value - 3.6e9 / 5.4).abs() < 1.0);
    assert!((out[1].converted_value - 8.0e8).abs() < 1.0);

    let req = &prices.requests()[0];
    assert_eq!(req.symbol, "USDBRL=X");
    assert_eq!(req.start, d("2021-01-01"));
    assert_eq!(req.end, d("2023-12-31"));
}

#[tokio::test]
async fn no_income_is_reported_before_fetching_fx() {
    let fundamentals = StaticFundamentals::new();
    let prices = StaticProvider::new();

    let err = IncomeConverter::new(2020, 2024)
        .convert(&fundamentals, &prices, "AAPL")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        IncomeError::NoIncomeData {
            ticker: "AAPL".to_string()
        }
    );
    assert!(prices.requests().is_empty());
}

#[tokio::test]
async fn empty_fx_series_is_no_fx_data() {
    let fundamentals = StaticFundamentals::new().with_income("AAPL", vec![fig(2022, 1.0)]);
    let prices = StaticProvider::new().with_series("EURUSD=X", vec![]);

    let err = IncomeConverter::new(2020, 2024)
        .with_fx_symbol("EURUSD=X")
        .convert(&fundamentals, &prices, "AAPL")
        .await
        .unwrap_err();

    assert!(matches!(err, IncomeError::NoFxData { ref symbol } if symbol == "EURUSD=X"));
}

#[tokio::test]
async fn fundamentals_failure_is_upstream() {
    let fundamentals = StaticFundamentals::new().with_error(
        "AAPL",
        ProviderError::Api {
            code: Some("429".to_string()),
            message: "Too Many Requests".to_string(),
        },
    );
    let prices = StaticProvider::new();

    let err = IncomeConverter::new(2020, 2024)
        .convert(&fundamentals, &prices, "AAPL")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("data provider failed for AAPL"));
}
