//! `aporte backtest` end to end against a CSV directory.
//!
//! Validates that:
//! - each ticker prints one key=value line, suffix heuristic applied
//! - a ticker with no file is reported and the batch still succeeds
//! - the portfolio line sums the successful tickers only
//! - `--json` emits the same numbers in machine-readable form
//! - a malformed amount fails before any data is fetched

use aporte_testkit::{monthly_closes, raw, write_price_csv};
use httpmock::prelude::*;
use predicates::prelude::*;

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_price_csv(
        dir.path(),
        "WEGE3.SA",
        &monthly_closes(2024, 1, &[100.0, 100.0, 200.0]),
    )
    .unwrap();
    write_price_csv(
        dir.path(),
        "AAPL",
        &[
            raw("2024-01-02", 10.0),
            raw("2024-02-01", 5.0).with_split(2.0),
            raw("2024-03-01", 6.0).with_dividend(0.6),
        ],
    )
    .unwrap();
    dir
}

#[allow(deprecated)]
fn aporte(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("aporte").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn recurring_backtest_prints_per_ticker_and_portfolio_lines() {
    let dir = fixture_dir();
    let csv_dir = dir.path().to_str().unwrap().to_string();

    aporte(&dir)
        .args([
            "backtest",
            "--source",
            "csv",
            "--csv-dir",
            &csv_dir,
            "--tickers",
            "WEGE3 NOPE",
            "--amount",
            "1000",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ticker=WEGE3.SA status=ok first_valid_date=2024-01-02 final_value=5000.00 contributed=3000.00",
        ))
        .stdout(predicate::str::contains(
            "ticker=NOPE status=error kind=upstream",
        ))
        .stdout(predicate::str::contains(
            "portfolio_final_value=5000.00 portfolio_contributed=3000.00",
        ))
        .stdout(predicate::str::contains("succeeded=1 failed=1"));
}

#[test]
fn lump_sum_json_output_tracks_split_and_dividend() {
    let dir = fixture_dir();
    let csv_dir = dir.path().to_str().unwrap().to_string();

    let out = aporte(&dir)
        .args([
            "backtest",
            "--source",
            "csv",
            "--csv-dir",
            &csv_dir,
            "--tickers",
            "AAPL",
            "--mode",
            "lump_sum",
            "--amount",
            "100",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["mode"], "lump_sum");
    let perf = &v["results"][0]["performance"];
    // 10 shares, split to 20, +0.6*20/6 = 2 from the dividend; 22 @ 6.
    assert!((perf["shares_held"].as_f64().unwrap() - 22.0).abs() < 1e-9);
    assert!((perf["final_portfolio_value"].as_f64().unwrap() - 132.0).abs() < 1e-9);
    assert_eq!(v["summary"]["succeeded"], 1);
    assert_eq!(v["config_hash"].as_str().unwrap().len(), 64);
}

#[test]
fn config_file_supplies_settings_and_flags_override() {
    let dir = fixture_dir();
    let cfg = dir.path().join("aporte.yaml");
    std::fs::write(
        &cfg,
        format!(
            "tickers: [\"WEGE3\"]\nmode: lump_sum\ncontribution_amount: 999\nstart_date: \"2024-01-01\"\nend_date: \"2024-12-31\"\ndata:\n  source: csv\n  csv_dir: \"{}\"\n",
            dir.path().display()
        ),
    )
    .unwrap();

    aporte(&dir)
        .args([
            "backtest",
            "--config",
            cfg.to_str().unwrap(),
            "--mode",
            "recurring",
            "--amount",
            "1000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=recurring amount=1000.00"))
        .stdout(predicate::str::contains("final_value=5000.00"));
}

#[test]
fn malformed_amount_fails_before_fetching() {
    let server = MockServer::start();
    let any_fetch = server.mock(|when, then| {
        when.method(GET);
        then.status(500);
    });

    let dir = tempfile::tempdir().unwrap();
    #[allow(deprecated)]
    let mut cmd = assert_cmd::Command::cargo_bin("aporte").unwrap();
    cmd.current_dir(dir.path())
        .env("APORTE_YAHOO_BASE_URL", server.base_url())
        .args(["backtest", "--tickers", "AAPL", "--amount", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("contribution_amount"))
        .stderr(predicate::str::contains("not a number"));

    any_fetch.assert_hits(0);
}

#[test]
fn missing_tickers_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    aporte(&dir)
        .args(["backtest", "--source", "csv", "--csv-dir", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required setting 'tickers'"));
}

#[test]
fn config_hash_command_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("base.yaml");
    std::fs::write(&cfg, "mode: recurring\ntickers: AAPL\n").unwrap();

    aporte(&dir)
        .args(["config-hash", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^config_hash=[0-9a-f]{64}\n").unwrap())
        .stdout(predicate::str::contains(r#"{"mode":"recurring","tickers":"AAPL"}"#));
}
