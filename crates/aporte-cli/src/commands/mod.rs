//! Command handler modules for the `aporte` binary.
//!
//! Shared config and provider wiring lives here; command-specific logic lives
//! in the submodules.

pub mod backtest;
pub mod dividends;
pub mod income;
pub mod inflation;

use anyhow::{Context, Result};
use aporte_config::{
    deep_merge, load_layered_yaml, report_unused_keys, ConfigMode, DataSource, LoadedConfig,
    UnusedKeyPolicy,
};
use aporte_md::{HistoricalProvider, YahooProvider};
use chrono::{NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::CommonArgs;

/// Overrides the configured Yahoo base URL (tests point it at a mock server).
pub const ENV_YAHOO_BASE_URL: &str = "APORTE_YAHOO_BASE_URL";

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load the layered config, then apply command-line flags as the top layer.
///
/// `extra` holds command-specific overrides as `(json_pointer, value)`.
pub fn load_config(
    common: &CommonArgs,
    mode: ConfigMode,
    extra: Vec<(&str, Option<Value>)>,
) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = common.config_paths.iter().map(|s| s.as_str()).collect();
    let base = load_layered_yaml(&path_refs)?;

    let mut overrides = Value::Object(Map::new());
    let shared = [
        ("/tickers", common.tickers.clone().map(Value::String)),
        ("/data/source", common.source.clone().map(Value::String)),
        ("/data/csv_dir", common.csv_dir.clone().map(Value::String)),
    ];
    for (pointer, value) in shared.into_iter().chain(extra) {
        if let Some(v) = value {
            set_pointer(&mut overrides, pointer, v);
        }
    }
    let loaded = base.with_overrides(overrides)?;

    let policy = if common.strict_keys {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(mode, &loaded.config_json, policy)?;
    for key in &report.unused_leaf_pointers {
        warn!(mode = %report.mode, key = %key, "config key not used by this command");
    }

    info!(config_hash = %loaded.config_hash, "config loaded");
    Ok(loaded)
}

/// Merge `value` into `root` at `pointer`, creating parent objects.
fn set_pointer(root: &mut Value, pointer: &str, value: Value) {
    let nested = pointer
        .trim_start_matches('/')
        .rsplit('/')
        .fold(value, |acc, key| {
            let mut m = Map::new();
            m.insert(key.to_string(), acc);
            Value::Object(m)
        });
    *root = deep_merge(std::mem::take(root), nested);
}

/// Yahoo base URL: env var, then config, then the public endpoint.
pub fn yahoo_base_url(configured: Option<&str>) -> String {
    std::env::var(ENV_YAHOO_BASE_URL)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| aporte_md::yahoo::DEFAULT_BASE_URL.to_string())
}

pub fn yahoo_provider(configured: Option<&str>) -> Result<YahooProvider> {
    let base_url = yahoo_base_url(configured);
    YahooProvider::new_with_base_url(base_url.clone())
        .with_context(|| format!("yahoo provider init failed (base_url={base_url})"))
}

/// Daily-history provider for the configured source.
pub fn build_provider(source: &DataSource) -> Result<Box<dyn HistoricalProvider>> {
    let provider: Box<dyn HistoricalProvider> = match source {
        DataSource::Yahoo { base_url } => Box::new(yahoo_provider(base_url.as_deref())?),
        DataSource::Csv { dir } => {
            if !dir.is_dir() {
                anyhow::bail!("csv_dir '{}' is not a directory", dir.display());
            }
            Box::new(aporte_md::CsvDirectoryProvider::new(dir.clone()))
        }
    };
    Ok(provider)
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Two decimals for key=value output.
pub fn fmt_money(v: f64) -> String {
    format!("{v:.2}")
}

pub fn fmt_opt_pct(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "n/a".to_string())
}
