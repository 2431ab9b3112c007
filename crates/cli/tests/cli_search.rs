use assert_cmd::prelude::*;
use mockito::Server;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::process::Command;

mod common;
use common::{MATRIX_PAGE, site_entry, write_config};

#[tokio::test]
async fn json_output_lists_matches_with_year() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", &server.url(), true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.arg("Matrix")
        .arg("--config")
        .arg(config.path())
        .env("NO_COLOR", "1");

    let assert = cmd.assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&out).expect("stdout is json");

    assert_eq!(json["count"], 1);
    let first = &json["results"][0];
    assert_eq!(first["title"], "The Matrix");
    assert_eq!(first["year"], "1999");
    assert_eq!(first["site"], "mock");
    assert_eq!(
        first["url"].as_str().unwrap(),
        format!("{}/film/matrix-1999", server.url())
    );
}

#[tokio::test]
async fn table_output_reports_no_results() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body("<html><body><p>nothing here</p></body></html>")
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", &server.url(), true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.args(["Matrix", "--format", "table"])
        .arg("--config")
        .arg(config.path())
        .env("NO_COLOR", "1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No results."));
}

#[tokio::test]
async fn plain_table_groups_rows_by_site() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", &server.url(), true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.args(["Matrix", "--format", "table"])
        .arg("--config")
        .arg(config.path())
        .env("NO_TABLE", "1")
        .env("NO_COLOR", "1");

    let expected = format!("  - The Matrix (1999) ({}/film/matrix-1999)", server.url());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!("mock ({}):", server.url())))
        .stdout(predicate::str::contains(expected));
}

#[tokio::test]
async fn query_is_read_from_stdin_when_omitted() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", &server.url(), true)]);

    let mut cmd = assert_cmd::Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.arg("--config")
        .arg(config.path())
        .env("NO_COLOR", "1")
        .write_stdin("Matrix\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"))
        .stderr(predicate::str::contains("Search phrase:"));
}

#[test]
fn short_query_is_rejected() {
    let config = write_config(&[site_entry("mock", "http://127.0.0.1:9", true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.arg("x").arg("--config").arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("too short"));
}

#[tokio::test]
async fn failing_site_does_not_hide_other_results() {
    let mut good = Server::new_async().await;
    let _ok = good
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .create_async()
        .await;
    let mut bad = Server::new_async().await;
    let _err = bad
        .mock("GET", "/search/Matrix")
        .with_status(500)
        .create_async()
        .await;
    let config = write_config(&[
        site_entry("broken", &bad.url(), true),
        site_entry("working", &good.url(), true),
    ]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.arg("Matrix")
        .arg("--config")
        .arg(config.path())
        .env("NO_COLOR", "1");

    let assert = cmd.assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&out).expect("stdout is json");
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["site"], "working");
}

#[tokio::test]
async fn disable_flag_skips_site() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .expect(0)
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", &server.url(), true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.args(["Matrix", "--disable", "mock"])
        .arg("--config")
        .arg(config.path())
        .env("NO_COLOR", "1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 0"));
    m.assert_async().await;
}

#[tokio::test]
async fn mirror_flag_redirects_a_site() {
    let mut mirror = Server::new_async().await;
    let m = mirror
        .mock("GET", "/search/Matrix")
        .with_status(200)
        .with_body(MATRIX_PAGE)
        .create_async()
        .await;
    let config = write_config(&[site_entry("mock", "http://127.0.0.1:9", true)]);

    let mut cmd = Command::cargo_bin("movie-searcher").expect("binary built");
    cmd.arg("Matrix")
        .arg("--config")
        .arg(config.path())
        .arg("--mirror")
        .arg(format!("mock={}", mirror.url()))
        .env("NO_COLOR", "1");

    let assert = cmd.assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&out).expect("stdout is json");
    assert_eq!(json["query"], "Matrix");
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["site_url"], mirror.url());
    m.assert_async().await;
}
