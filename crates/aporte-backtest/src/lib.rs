//! Contribution backtests over clean daily series.
//!
//! - [`ContributionSimulator`] replays one [`aporte_md::CleanSeries`] under a
//!   recurring-monthly or lump-sum strategy, reinvesting dividends and
//!   tracking splits.
//! - [`BatchRunner`] drives many tickers through a provider and sums the
//!   results; per-ticker failures are values, not aborts.
//! - [`income`] converts annual net income at the annual mean FX rate.
//! - [`inflation`] aggregates monthly inflation prints per year and
//!   [`dividends`] sums a ticker's most recent cash payments.

pub mod batch;
pub mod corporate_actions;
pub mod dividends;
pub mod engine;
pub mod income;
pub mod inflation;
pub mod types;

pub use batch::{BatchRunner, RunSettings};
pub use corporate_actions::DividendPolicy;
pub use dividends::{
    dividend_payments, summarize_last, DividendHistory, DividendPayment, DividendSummary,
    DEFAULT_LAST_PAYMENTS,
};
pub use engine::{simulate, BacktestError, ContributionSimulator};
pub use income::{
    annual_mean_rates, convert_annual_income, ConvertedIncome, IncomeConverter, IncomeError,
    DEFAULT_FX_SYMBOL,
};
pub use inflation::{
    annual_inflation, cumulative_pct, fetch_annual_inflation, AnnualInflation, InflationError,
};
pub use types::{
    BacktestResult, BatchReport, ContributionMode, Performance, PortfolioSummary,
    SimulationConfig, SimulationState, TickerError,
};
