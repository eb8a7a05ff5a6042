//! `aporte backtest`: per-ticker contribution simulation plus portfolio total.

use anyhow::{Context, Result};
use aporte_backtest::{
    BacktestResult, BatchReport, BatchRunner, ContributionMode, DividendPolicy, RunSettings,
};
use aporte_config::{BacktestSettings, ConfigMode, SettingsError};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{build_provider, fmt_money, fmt_opt_pct, load_config, today};
use crate::CommonArgs;

/// Flags specific to `backtest`. `None` leaves the config value in place.
#[derive(Debug, Clone, Default)]
pub struct BacktestFlags {
    pub mode: Option<String>,
    pub amount: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub dividends: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    config_hash: &'a str,
    mode: &'static str,
    contribution_amount: f64,
    start_date: String,
    end_date: String,
    dividends: &'static str,
    source: &'static str,
    #[serde(flatten)]
    report: &'a BatchReport,
}

pub async fn run_backtest(common: CommonArgs, flags: BacktestFlags) -> Result<()> {
    let loaded = load_config(
        &common,
        ConfigMode::Backtest,
        vec![
            ("/mode", flags.mode.map(Value::String)),
            ("/contribution_amount", flags.amount.map(Value::String)),
            ("/start_date", flags.start.map(Value::String)),
            ("/end_date", flags.end.map(Value::String)),
            ("/dividends", flags.dividends.map(Value::String)),
        ],
    )?;

    // Fail fast: nothing is fetched until every setting validates.
    let settings = BacktestSettings::from_config_json(&loaded.config_json, today())
        .context("invalid backtest configuration")?;
    let run = resolve_run_settings(&settings).context("invalid backtest configuration")?;
    let provider = build_provider(&settings.source)?;

    let runner = BatchRunner::new(run.clone());
    let report = runner.run(provider.as_ref(), &settings.tickers).await;
    info!(
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        "backtest complete"
    );

    if common.json {
        let out = JsonOutput {
            config_hash: &loaded.config_hash,
            mode: run.mode.as_str(),
            contribution_amount: run.amount,
            start_date: run.start.to_string(),
            end_date: run.end.to_string(),
            dividends: run.dividend_policy.as_str(),
            source: settings.source.as_str(),
            report: &report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize backtest json failed")?
        );
        return Ok(());
    }

    println!("config_hash={}", loaded.config_hash);
    println!(
        "mode={} amount={} start={} end={} dividends={} source={}",
        run.mode,
        fmt_money(run.amount),
        run.start,
        run.end,
        run.dividend_policy.as_str(),
        settings.source.as_str()
    );
    for result in &report.results {
        println!("{}", result_line(result));
    }
    let s = &report.summary;
    println!(
        "portfolio_final_value={} portfolio_contributed={} portfolio_return_pct={} succeeded={} failed={}",
        fmt_money(s.total_final_value),
        fmt_money(s.total_contributed),
        fmt_opt_pct(s.total_return_pct()),
        s.succeeded,
        s.failed
    );

    Ok(())
}

/// Turn the config's string choices into simulation settings, filling the
/// mode-dependent default amount.
fn resolve_run_settings(settings: &BacktestSettings) -> Result<RunSettings, SettingsError> {
    let mode = match settings.mode.as_deref() {
        None => ContributionMode::Recurring,
        Some(s) => ContributionMode::parse(s).ok_or_else(|| {
            SettingsError::malformed("mode", s, "expected recurring or lump_sum")
        })?,
    };
    let dividend_policy = match settings.dividends.as_deref() {
        None => DividendPolicy::Reinvest,
        Some(s) => DividendPolicy::parse(s).ok_or_else(|| {
            SettingsError::malformed("dividends", s, "expected reinvest or ignore")
        })?,
    };
    Ok(RunSettings {
        mode,
        amount: settings
            .contribution_amount
            .unwrap_or_else(|| mode.default_amount()),
        start: settings.start_date,
        end: settings.end_date,
        dividend_policy,
    })
}

fn result_line(result: &BacktestResult) -> String {
    match &result.outcome {
        Ok(p) => format!(
            "ticker={} status=ok first_valid_date={} final_value={} contributed={} return_pct={} shares={:.6} contributions={} splits={} dividends_reinvested={}",
            result.ticker,
            p.first_valid_date,
            fmt_money(p.final_portfolio_value),
            fmt_money(p.total_contributed),
            fmt_opt_pct(p.total_return_pct()),
            p.shares_held,
            p.contributions,
            p.splits_applied,
            fmt_money(p.dividends_reinvested)
        ),
        Err(e) => format!(
            "ticker={} status=error kind={} error=\"{}\"",
            result.ticker,
            e.kind(),
            e
        ),
    }
}
