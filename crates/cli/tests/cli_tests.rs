use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;

use assert_cmd::Command;
use pagewatch_http::{AppState, FixtureData, create_router};
use predicates::prelude::*;
use serde_json::{Value, json};

const ATTEMPTS: &str = "/api/manage/admin/cc-pair/1/index-attempts";

fn pagewatch() -> Command {
    let mut cmd = Command::cargo_bin("pagewatch").unwrap();
    for var in [
        "RUST_LOG",
        "PAGEWATCH_BASE_URL",
        "PAGEWATCH_API_KEY",
        "PAGEWATCH_ITEMS_PER_PAGE",
        "PAGEWATCH_PAGES_PER_BATCH",
        "PAGEWATCH_REFRESH_MS",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("PAGEWATCH_MAX_RETRIES", "0");
    cmd
}

/// Twenty attempts on CC pair 1, ids 1..=20, even ids failed, newer ids started later.
fn fixture() -> FixtureData {
    let attempts: Vec<Value> = (1..=20)
        .map(|id: i64| {
            let started = format!("2024-05-01T00:{id:02}:00Z");
            json!({
                "id": id,
                "status": if id % 2 == 0 { "failed" } else { "success" },
                "time_started": started,
                "time_updated": started,
            })
        })
        .collect();
    serde_json::from_value(json!({"index_attempts": {"1": attempts}})).unwrap()
}

/// Serves the fixture on an ephemeral port for the rest of the test process.
fn spawn_backend() -> String {
    let (tx, rx) = mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime =
            tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let state = Arc::new(AppState::new(fixture()));
            axum::serve(listener, create_router(state)).await.unwrap();
        });
    });
    let addr = rx.recv().unwrap();
    format!("http://{addr}")
}

fn item_ids(view: &Value) -> Vec<i64> {
    view["items"].as_array().unwrap().iter().map(|item| item["id"].as_i64().unwrap()).collect()
}

#[test]
fn test_cli_help() {
    pagewatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetch and live-poll paginated admin endpoints"));
}

#[test]
fn test_cli_fetch_help() {
    pagewatch()
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--filter").and(predicate::str::contains("--page")));
}

#[test]
fn test_cli_watch_help() {
    pagewatch()
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--interval-ms")
                .and(predicate::str::contains("--max-updates")),
        );
}

#[test]
fn test_cli_serve_requires_fixture() {
    pagewatch().arg("serve").assert().failure().stderr(predicate::str::contains("--fixture"));
}

#[test]
fn test_cli_serve_missing_fixture_file() {
    pagewatch()
        .args(["serve", "--fixture", "/nonexistent/pagewatch-fixture.json", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read fixture"));
}

#[test]
fn test_cli_fetch_rejects_malformed_filter() {
    pagewatch()
        .args(["fetch", "/api/admin/chat-session-history", "--filter", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn test_cli_fetch_unreachable_backend() {
    pagewatch()
        .env("PAGEWATCH_MAX_RETRIES", "0")
        .args(["--base-url", "http://127.0.0.1:1", "fetch", "/api/admin/chat-session-history"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to fetch"));
}

#[test]
fn test_cli_fetch_filtered_page() {
    let base = spawn_backend();
    let output = pagewatch()
        .args(["--base-url", &base, "fetch", ATTEMPTS, "--page", "2", "--filter", "status=failed"])
        .args(["--items-per-page", "2", "--pages-per-batch", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let view: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["current_page"], 2);
    assert_eq!(view["total_pages"], 5);
    assert_eq!(item_ids(&view), vec![16, 14]);
    assert_eq!(view["is_loading"], false);
    assert!(view["error"].is_null());
}

#[test]
fn test_cli_watch_stops_after_max_updates() {
    let base = spawn_backend();
    let output = pagewatch()
        .args(["--base-url", &base, "watch", ATTEMPTS, "--items-per-page", "3"])
        .args(["--interval-ms", "50", "--max-updates", "1"])
        .timeout(std::time::Duration::from_secs(30))
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let views: Vec<Value> = serde_json::Deserializer::from_slice(&output.stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["current_page"], 1);
    assert_eq!(views[0]["total_pages"], 7);
    assert_eq!(item_ids(&views[0]), vec![20, 19, 18]);
}

#[test]
fn test_cli_default_log_level_hides_debug() {
    let base = spawn_backend();
    pagewatch()
        .args(["--base-url", &base, "fetch", ATTEMPTS])
        .assert()
        .success()
        .stderr(predicate::str::contains("fetched batch").not());
}

#[test]
fn test_cli_rust_log_raises_level() {
    let base = spawn_backend();
    pagewatch()
        .env("RUST_LOG", "debug")
        .args(["--base-url", &base, "fetch", ATTEMPTS])
        .assert()
        .success()
        .stderr(predicate::str::contains("fetched batch"));
}

#[test]
fn test_cli_rust_log_lowers_level() {
    let base = spawn_backend();
    pagewatch()
        .args(["--base-url", &base, "watch", ATTEMPTS, "--interval-ms", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("polling disabled"));

    pagewatch()
        .env("RUST_LOG", "warn")
        .args(["--base-url", &base, "watch", ATTEMPTS, "--interval-ms", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("polling disabled").not());
}
