//! `aporte inflation` against a mock BCB endpoint and `aporte dividends`
//! against a CSV directory.
//!
//! Validates that:
//! - the BCB base URL env var redirects the SGS request
//! - each year prints summed and compounded inflation, then the total
//! - dividend history prints the last N payments and their sum
//! - a ticker with no file is an error line, not a failed run

use aporte_testkit::{raw, write_price_csv};
use httpmock::prelude::*;
use predicates::prelude::*;

#[allow(deprecated)]
fn aporte(dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("aporte").unwrap();
    cmd.current_dir(dir.path()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn inflation_prints_each_year_and_cumulative_total() {
    let server = MockServer::start();
    let sgs = server.mock(|when, then| {
        when.method(GET)
            .path("/dados/serie/bcdata.sgs.433/dados")
            .query_param("dataInicial", "01/01/2022")
            .query_param("dataFinal", "31/12/2023");
        then.status(200).body(
            r#"[{"data":"01/01/2022","valor":"10.00"},{"data":"01/01/2023","valor":"10.00"}]"#,
        );
    });

    let dir = tempfile::tempdir().unwrap();
    aporte(&dir)
        .env("APORTE_BCB_BASE_URL", server.base_url())
        .args(["inflation", "--start-year", "2022", "--end-year", "2023"])
        .assert()
        .success()
        .stdout(predicate::str::contains("series=433"))
        .stdout(predicate::str::contains(
            "year=2022 months=1 summed_pct=10.00 compounded_pct=10.00",
        ))
        .stdout(predicate::str::contains(
            "start_year=2022 end_year=2023 cumulative_pct=21.00",
        ));

    sgs.assert();
}

#[test]
fn inflation_upstream_failure_fails_the_command() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(503);
    });

    let dir = tempfile::tempdir().unwrap();
    aporte(&dir)
        .env("APORTE_BCB_BASE_URL", server.base_url())
        .args(["inflation", "--start-year", "2022", "--end-year", "2023"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inflation fetch failed"));
}

#[test]
fn dividends_sum_the_most_recent_payments() {
    let dir = tempfile::tempdir().unwrap();
    write_price_csv(
        dir.path(),
        "ITUB4.SA",
        &[
            raw("2024-01-02", 30.0).with_dividend(0.25),
            raw("2024-02-01", 31.0),
            raw("2024-03-01", 32.0).with_dividend(0.5),
            raw("2024-04-01", 33.0).with_dividend(0.75),
        ],
    )
    .unwrap();
    let csv_dir = dir.path().to_str().unwrap().to_string();

    aporte(&dir)
        .args([
            "dividends",
            "--source",
            "csv",
            "--csv-dir",
            &csv_dir,
            "--tickers",
            "ITUB4 NOPE",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--last",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ticker=ITUB4.SA date=2024-03-01 amount=0.5000"))
        .stdout(predicate::str::contains("ticker=ITUB4.SA date=2024-01-02").not())
        .stdout(predicate::str::contains(
            "ticker=ITUB4.SA status=ok payments=2 available=3 total=1.25",
        ))
        .stdout(predicate::str::contains(
            "ticker=NOPE status=error kind=upstream",
        ));
}
