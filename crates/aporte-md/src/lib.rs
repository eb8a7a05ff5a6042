//! aporte-md
//!
//! Market-data boundary for contribution backtests.
//!
//! This crate owns the provider abstraction, the concrete providers (Yahoo
//! chart HTTP API, CSV directory, BCB inflation series), the ticker suffix heuristic and the
//! normalization of raw daily records into a clean trading-day series.
//! It does **not** simulate anything; `aporte-backtest` consumes
//! [`normalizer::CleanSeries`] values produced here.

pub mod bcb;
pub mod ingest_csv;
pub mod normalizer;
pub mod provider;
pub mod quality;
pub mod ticker;
pub mod yahoo;

pub use bcb::BcbProvider;
pub use ingest_csv::CsvDirectoryProvider;
pub use normalizer::{normalize, CleanSeries, MonthlySchedule, NormalizerError, TradingDay};
pub use provider::{
    AnnualFigure, FetchDailyRequest, FundamentalsProvider, HistoricalProvider, InflationProvider,
    MonthlyRate, ProviderError, RawDay,
};
pub use quality::{build_quality_report, QualityReport};
pub use ticker::{normalize_ticker, parse_ticker_list};
pub use yahoo::YahooProvider;
