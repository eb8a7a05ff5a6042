//! Config hash stability.
//!
//! GREEN when:
//! - the same inputs hash identically on every call
//! - key order inside a YAML document does not change the hash
//! - different values hash differently
//! - an overlay layer overrides the base and hashes stably

use aporte_config::{load_layered_yaml, load_layered_yaml_from_strings};

const BASE_YAML: &str = r#"
tickers: "WEGE3 ITUB4 AAPL"
mode: recurring
contribution_amount: 1000
start_date: "2010-01-01"
dividends: reinvest
data:
  source: yahoo
"#;

/// Same content as BASE_YAML but with keys in different order.
const BASE_YAML_REORDERED: &str = r#"
data:
  source: yahoo
dividends: reinvest
start_date: "2010-01-01"
contribution_amount: 1000
mode: recurring
tickers: "WEGE3 ITUB4 AAPL"
"#;

const OVERLAY_YAML: &str = r#"
mode: lump_sum
contribution_amount: 10000
data:
  source: csv
  csv_dir: ./prices
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();

    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
    assert_eq!(original.canonical_json, reordered.canonical_json);
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, "contribution_amount: 1001"]).unwrap();

    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_overrides_base_and_keeps_siblings() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);

    let cfg = &a.config_json;
    assert_eq!(cfg.pointer("/mode").and_then(|v| v.as_str()), Some("lump_sum"));
    assert_eq!(cfg.pointer("/data/source").and_then(|v| v.as_str()), Some("csv"));
    assert_eq!(
        cfg.pointer("/data/csv_dir").and_then(|v| v.as_str()),
        Some("./prices")
    );
    // Untouched by the overlay.
    assert_eq!(
        cfg.pointer("/tickers").and_then(|v| v.as_str()),
        Some("WEGE3 ITUB4 AAPL")
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_layers_are_ignored() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, "", "{}"]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn files_load_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&local, OVERLAY_YAML).unwrap();

    let from_files = load_layered_yaml(&[
        base.to_str().unwrap(),
        local.to_str().unwrap(),
    ])
    .unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
