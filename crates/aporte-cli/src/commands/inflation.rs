//! `aporte inflation`: annual IPCA from the BCB SGS series.

use anyhow::{Context, Result};
use aporte_backtest::{cumulative_pct, fetch_annual_inflation};
use aporte_config::{ConfigMode, InflationSettings};
use aporte_md::BcbProvider;
use serde_json::Value;

use super::{load_config, today};
use crate::CommonArgs;

/// Overrides the configured BCB base URL (tests point it at a mock server).
pub const ENV_BCB_BASE_URL: &str = "APORTE_BCB_BASE_URL";

#[derive(Debug, Clone, Default)]
pub struct InflationFlags {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub series: Option<u32>,
}

pub async fn run_inflation(common: CommonArgs, flags: InflationFlags) -> Result<()> {
    let loaded = load_config(
        &common,
        ConfigMode::Inflation,
        vec![
            ("/inflation/start_year", flags.start_year.map(Value::from)),
            ("/inflation/end_year", flags.end_year.map(Value::from)),
            ("/inflation/series", flags.series.map(Value::from)),
        ],
    )?;
    let settings = InflationSettings::from_config_json(&loaded.config_json, today())
        .context("invalid inflation configuration")?;

    let base_url = std::env::var(ENV_BCB_BASE_URL)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| settings.base_url.clone())
        .unwrap_or_else(|| aporte_md::bcb::DEFAULT_BASE_URL.to_string());
    let mut provider = BcbProvider::new_with_base_url(base_url.clone())
        .with_context(|| format!("bcb provider init failed (base_url={base_url})"))?;
    if let Some(series) = settings.series {
        provider = provider.with_series(series);
    }

    let years = fetch_annual_inflation(&provider, settings.start_year, settings.end_year)
        .await
        .context("inflation fetch failed")?;
    let cumulative = cumulative_pct(&years);

    if common.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "config_hash": loaded.config_hash,
                "series": provider.series(),
                "years": years,
                "cumulative_pct": cumulative,
            }))
            .context("serialize inflation json failed")?
        );
        return Ok(());
    }

    println!("config_hash={}", loaded.config_hash);
    println!("series={}", provider.series());
    for y in &years {
        println!(
            "year={} months={} summed_pct={:.2} compounded_pct={:.2}",
            y.year, y.months, y.summed_pct, y.compounded_pct
        );
    }
    println!(
        "start_year={} end_year={} cumulative_pct={:.2}",
        settings.start_year, settings.end_year, cumulative
    );

    Ok(())
}
