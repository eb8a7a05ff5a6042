//! `aporte dividends`: recent cash payments per ticker and their sum.

use anyhow::{Context, Result};
use aporte_backtest::{DividendHistory, DividendSummary, DEFAULT_LAST_PAYMENTS};
use aporte_config::{ConfigMode, DividendSettings};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{build_provider, fmt_money, load_config, today};
use crate::CommonArgs;

#[derive(Debug, Clone, Default)]
pub struct DividendFlags {
    pub start: Option<String>,
    pub end: Option<String>,
    pub last: Option<usize>,
}

#[derive(Serialize)]
struct Row {
    ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DividendSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run_dividends(common: CommonArgs, flags: DividendFlags) -> Result<()> {
    let loaded = load_config(
        &common,
        ConfigMode::Dividends,
        vec![
            ("/start_date", flags.start.map(Value::String)),
            ("/end_date", flags.end.map(Value::String)),
            ("/dividend_history/last", flags.last.map(Value::from)),
        ],
    )?;
    let settings = DividendSettings::from_config_json(&loaded.config_json, today())
        .context("invalid dividends configuration")?;
    let provider = build_provider(&settings.source)?;

    let history = DividendHistory::new(settings.start_date, settings.end_date)
        .with_last(settings.last.unwrap_or(DEFAULT_LAST_PAYMENTS));

    let mut rows = Vec::with_capacity(settings.tickers.len());
    for ticker in &settings.tickers {
        let ticker_symbol = aporte_md::normalize_ticker(ticker);
        rows.push(match history.fetch(provider.as_ref(), ticker).await {
            Ok(summary) => Row {
                ticker: ticker_symbol,
                summary: Some(summary),
                error_kind: None,
                error: None,
            },
            Err(e) => {
                warn!(ticker = %ticker_symbol, error = %e, "dividend history failed");
                Row {
                    ticker: ticker_symbol,
                    summary: None,
                    error_kind: Some(e.kind()),
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
                "last": history.last(),
                "results": rows,
            }))
            .context("serialize dividends json failed")?
        );
        return Ok(());
    }

    println!("config_hash={}", loaded.config_hash);
    for row in &rows {
        match (&row.summary, &row.error) {
            (Some(s), _) => {
                for p in &s.payments {
                    println!("ticker={} date={} amount={:.4}", s.ticker, p.date, p.amount);
                }
                println!(
                    "ticker={} status=ok payments={} available={} total={}",
                    s.ticker,
                    s.payments.len(),
                    s.available,
                    fmt_money(s.total)
                );
            }
            (None, Some(err)) => println!(
                "ticker={} status=error kind={} error=\"{}\"",
                row.ticker,
                row.error_kind.unwrap_or("unknown"),
                err
            ),
            (None, None) => {}
        }
    }

    Ok(())
}
