//! Layered YAML configuration.
//!
//! Documents are merged in order (later layers override earlier ones), the
//! result is rendered as canonical JSON and hashed with SHA-256 so a run can
//! be tied to the exact configuration that produced it. Typed extraction
//! lives in [`settings`].

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

pub mod settings;

pub use settings::{
    BacktestSettings, DataSource, DividendSettings, IncomeSettings, InflationSettings,
    SettingsError,
};

/// Which command is reading the config. Each reads a different key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Backtest,
    Income,
    Inflation,
    Dividends,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Backtest => "BACKTEST",
            ConfigMode::Income => "INCOME",
            ConfigMode::Inflation => "INFLATION",
            ConfigMode::Dividends => "DIVIDENDS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// JSON-pointer prefixes each mode actually reads.
///
/// A prefix consumes its whole subtree: `/data` consumes `/data/csv_dir`.
/// Keep this in step with `settings.rs`.
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Backtest => &[
            "/tickers",
            "/mode",
            "/contribution_amount",
            "/start_date",
            "/end_date",
            "/dividends",
            "/data",
        ],
        ConfigMode::Income => &["/tickers", "/data", "/income"],
        ConfigMode::Inflation => &["/inflation"],
        ConfigMode::Dividends => &[
            "/tickers",
            "/start_date",
            "/end_date",
            "/dividend_history",
            "/data",
        ],
    }
}

/// Produce an unused-key report for a given mode.
/// `Fail` errors when unused keys exist; `Warn` always returns the report.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers_for_mode(mode)
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} unused config leaf key(s) detected. \
            Remove them or check for typos. First few: {}",
            report.mode,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

/// Leading "/", no trailing "/" unless it is just "/".
fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but not "/a/bc". "/" consumes all.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Merge one more layer on top (e.g. command-line flags) and re-hash.
    pub fn with_overrides(self, overrides: Value) -> Result<LoadedConfig> {
        finish(deep_merge(self.config_json, overrides))
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        if raw.trim().is_empty() {
            continue;
        }
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses to null; treat it as "no overrides".
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }
    if !merged.is_object() {
        bail!("config root must be a mapping");
    }
    finish(merged)
}

fn finish(merged: Value) -> Result<LoadedConfig> {
    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other `b` replaces `a`.
pub fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's Map is key-sorted (no `preserve_order`), so compact output
    // is already canonical.
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_respects_segment_boundary() {
        assert!(is_prefix_pointer("/data", "/data/csv_dir"));
        assert!(is_prefix_pointer("/data", "/data"));
        assert!(!is_prefix_pointer("/data", "/database/url"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn deep_merge_overrides_leaves_and_keeps_siblings() {
        let merged = deep_merge(
            json!({"data": {"source": "yahoo", "base_url": "x"}}),
            json!({"data": {"source": "csv"}}),
        );
        assert_eq!(merged, json!({"data": {"source": "csv", "base_url": "x"}}));
    }

    #[test]
    fn list_leaves_are_indexed() {
        let mut out = Vec::new();
        collect_leaf_pointers(&json!({"tickers": ["A", "B"]}), "", &mut out);
        assert_eq!(out, vec!["/tickers/0", "/tickers/1"]);
    }

    #[test]
    fn overrides_change_the_hash() {
        let base = load_layered_yaml_from_strings(&["mode: recurring"]).unwrap();
        let hash = base.config_hash.clone();
        let over = base.with_overrides(json!({"mode": "lump_sum"})).unwrap();
        assert_ne!(over.config_hash, hash);
        assert_eq!(over.config_json["mode"], "lump_sum");
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        assert!(load_layered_yaml_from_strings(&["- a\n- b\n"]).is_err());
    }
}
