//! `aporte income`: annual net income converted at the annual mean FX rate.
//!
//! Fundamentals always come from Yahoo; the FX series comes from the
//! configured data source.

use anyhow::{Context, Result};
use aporte_backtest::{ConvertedIncome, IncomeConverter, IncomeError};
use aporte_config::{ConfigMode, DataSource, IncomeSettings};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{build_provider, load_config, today, yahoo_provider};
use crate::CommonArgs;

#[derive(Debug, Clone, Default)]
pub struct IncomeFlags {
    pub fx_symbol: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Serialize)]
struct TickerIncome {
    ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    years: Option<Vec<ConvertedIncome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run_income(common: CommonArgs, flags: IncomeFlags) -> Result<()> {
    let loaded = load_config(
        &common,
        ConfigMode::Income,
        vec![
            ("/income/fx_symbol", flags.fx_symbol.map(Value::String)),
            ("/income/start_year", flags.start_year.map(Value::from)),
            ("/income/end_year", flags.end_year.map(Value::from)),
        ],
    )?;

    let settings = IncomeSettings::from_config_json(&loaded.config_json, today())
        .context("invalid income configuration")?;

    let configured_yahoo = match &settings.source {
        DataSource::Yahoo { base_url } => base_url.as_deref(),
        DataSource::Csv { .. } => None,
    };
    let fundamentals = yahoo_provider(configured_yahoo)?;
    let prices = build_provider(&settings.source)?;

    let mut converter = IncomeConverter::new(settings.start_year, settings.end_year);
    if let Some(symbol) = &settings.fx_symbol {
        converter = converter.with_fx_symbol(symbol.clone());
    }

    let mut rows = Vec::with_capacity(settings.tickers.len());
    for ticker in &settings.tickers {
        let outcome: Result<Vec<ConvertedIncome>, IncomeError> = converter
            .convert(&fundamentals, prices.as_ref(), ticker)
            .await;
        let ticker = aporte_md::normalize_ticker(ticker);
        rows.push(match outcome {
            Ok(years) => TickerIncome {
                ticker,
                years: Some(years),
                error: None,
            },
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "income conversion failed");
                TickerIncome {
                    ticker,
                    years: None,
                    error: Some(e.to_string()),
                }
            }
        });
    }

    if common.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "config_hash": loaded.config_hash,
                "fx_symbol": converter.fx_symbol(),
                "results": rows,
            }))
            .context("serialize income json failed")?
        );
        return Ok(());
    }

    println!("config_hash={}", loaded.config_hash);
    println!("fx_symbol={}", converter.fx_symbol());
    for row in &rows {
        match (&row.years, &row.error) {
            (Some(years), _) => {
                for y in years {
                    println!(
                        "ticker={} year={} net_income={:.0} fx_rate={:.4} converted={:.0}",
                        row.ticker, y.year, y.local_value, y.fx_rate, y.converted_value
                    );
                }
            }
            (None, Some(err)) => {
                println!("ticker={} status=error error=\"{}\"", row.ticker, err)
            }
            (None, None) => {}
        }
    }

    Ok(())
}
