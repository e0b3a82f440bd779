//! Loki client and mirroring against a local HTTP stub.

use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

use loggify::loki::{ProbeOutcome, PushOutcome};
use loggify::{
    Auth, ConnectionStatus, ContextOptions, Labels, LogOptions, Loggify, LokiClient, LokiConfig,
    PushEntry,
};

use crate::common::{SharedBuf, StubLoki, plain_config};

fn loki_config(port: u16) -> LokiConfig {
    LokiConfig {
        hostname: "http://127.0.0.1".to_string(),
        port: Some(port),
        secure: false,
        auth: Auth::Basic {
            user: "user".to_string(),
            pass: "pass".to_string(),
        },
        labels: Labels::from([("app".to_string(), "billing".to_string())]),
    }
}

#[tokio::test]
async fn probe_ok_marks_connected() {
    let stub = StubLoki::start(200, 204).await;
    let client = LokiClient::new(&loki_config(stub.port)).unwrap();

    let outcome = client.test_connection().await;

    let ProbeOutcome::Connected(info) = outcome else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(info.version, "3.4.2");
    assert_eq!(info.build_user, "root@ci");
    assert_eq!(client.status(), ConnectionStatus::Connected);
    assert_eq!(client.server_info(), Some(info));

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/loki/api/v1/status/buildinfo");
    assert_eq!(requests[0].header("authorization"), Some("Basic dXNlcjpwYXNz"));
}

#[tokio::test]
async fn probe_bad_status_marks_error() {
    let stub = StubLoki::start(503, 204).await;
    let client = LokiClient::new(&loki_config(stub.port)).unwrap();

    let outcome = client.test_connection().await;

    assert_eq!(
        outcome,
        ProbeOutcome::BadResponse {
            status: 503,
            reason: "Service Unavailable".to_string()
        }
    );
    let connection = client.connection();
    assert_eq!(connection.status, ConnectionStatus::Error);
    assert!(connection.message.contains("503 - Service Unavailable"));
    assert!(client.server_info().is_none());
}

#[tokio::test]
async fn probe_unreachable_marks_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = LokiClient::new(&loki_config(port)).unwrap();

    assert!(matches!(client.test_connection().await, ProbeOutcome::Failed(_)));
    let connection = client.connection();
    assert_eq!(connection.status, ConnectionStatus::Error);
    assert!(connection.message.starts_with("Failed connecting to"));
}

#[tokio::test]
async fn push_sends_one_stream_with_merged_labels() {
    let stub = StubLoki::start(200, 204).await;
    let client = LokiClient::new(&loki_config(stub.port)).unwrap();
    assert!(client.test_connection().await.is_connected());

    let labels = Labels::from([
        ("app".to_string(), "override".to_string()),
        ("job".to_string(), "nightly".to_string()),
    ]);
    let entries = vec![
        PushEntry::at("1000000", "plain line"),
        PushEntry::at("2000000", json!({"k": 1})),
    ];

    assert_eq!(client.push(entries, &labels).await, PushOutcome::Pushed);

    let pushes = stub.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].method, "POST");
    assert_eq!(pushes[0].header("content-type"), Some("application/json"));
    assert_eq!(pushes[0].header("authorization"), Some("Basic dXNlcjpwYXNz"));
    assert_eq!(
        pushes[0].json(),
        json!({
            "streams": [{
                "stream": {"app": "override", "job": "nightly"},
                "values": [["1000000", "plain line"], ["2000000", "{\"k\":1}"]]
            }]
        })
    );
}

#[tokio::test]
async fn failed_push_leaves_connection_state() {
    let stub = StubLoki::start(200, 500).await;
    let client = LokiClient::new(&loki_config(stub.port)).unwrap();
    assert!(client.test_connection().await.is_connected());

    let outcome = client.push(vec![PushEntry::new("x")], &Labels::new()).await;

    assert_eq!(
        outcome,
        PushOutcome::BadResponse {
            status: 500,
            reason: "Internal Server Error".to_string()
        }
    );
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn push_waits_for_pending_probe() {
    let stub = StubLoki::start(200, 204).await;
    let client = Arc::new(LokiClient::new(&loki_config(stub.port)).unwrap());
    assert_eq!(client.status(), ConnectionStatus::Connecting);

    let probe = Arc::clone(&client);
    let handle = tokio::spawn(async move { probe.test_connection().await });

    let outcome = client.push(vec![PushEntry::new("after probe")], &Labels::new()).await;

    assert_eq!(outcome, PushOutcome::Pushed);
    assert!(handle.await.unwrap().is_connected());
}

#[tokio::test]
async fn console_lines_are_mirrored() {
    let stub = StubLoki::start(200, 204).await;
    let buf = SharedBuf::default();
    let mut log = Loggify::with_writer(
        loggify::Config {
            loki: Some(loki_config(stub.port)),
            ..plain_config()
        },
        buf.clone(),
    );

    let options = LogOptions::default().context(ContextOptions::new("job-7"));
    log.console("╭ [ansi:red]hello[ansi:reset] world", "info", &options, None);
    log.console("skipped", "info", &LogOptions::default().do_not_push(), None);

    let pushes = stub.wait_for_pushes(1).await;
    let body = pushes[0].json();
    let stream = &body["streams"][0];
    assert_eq!(stream["stream"], json!({"app": "billing", "level": "info", "contextId": "job-7"}));

    let line: serde_json::Value =
        serde_json::from_str(stream["values"][0][1].as_str().unwrap()).unwrap();
    assert_eq!(line, json!({"message": "hello world"}));

    // The do_not_push line never reaches the server.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(stub.pushes().len(), 1);
}

#[tokio::test]
async fn logger_reports_probe_and_push() {
    let stub = StubLoki::start(200, 204).await;
    let buf = SharedBuf::default();
    let mut log = Loggify::with_writer(
        loggify::Config {
            loki: Some(loki_config(stub.port)),
            ..plain_config()
        },
        buf.clone(),
    );

    assert!(log.test_connection().await);
    assert!(
        log.push(vec![PushEntry::new("batch")], &Labels::new(), false)
            .await
    );
    assert!(
        !log.push(Vec::new(), &Labels::new(), false).await,
        "empty batches are refused"
    );

    let out = buf.text();
    assert!(out.contains("GrafanaLoki: Connection successfully tested! v3.4.2(abc123) [2026-01-01]"));
    assert!(out.contains(&format!(
        "GrafanaLoki: Successfully pushed! ==> http://127.0.0.1:{}",
        stub.port
    )));
    assert!(out.contains("GrafanaLoki: Nothing to push! => No records provided in entries!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn binary_mirrors_stdin_batch() {
    let stub = StubLoki::start(200, 204).await;
    let port = stub.port.to_string();

    let assert = tokio::task::spawn_blocking(move || {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("loggify").unwrap();
        cmd.env("XDG_CONFIG_HOME", "/tmp/loggify-test-no-config")
            .args([
                "--color=never",
                "--silent",
                "--no-caller",
                "--no-memory",
                "--no-timestamp",
                "--badge=off",
                "--type=warn",
                "--loki-host=127.0.0.1",
                "--loki-port",
                &port,
                "--loki-label",
                "app=cli",
            ])
            .write_stdin("disk low\n{\"free\": 3}\n")
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::starts_with("disk low\nFound object in message => object:\n"))
        .stdout(predicate::str::contains("GrafanaLoki: Successfully pushed!"));

    let pushes = stub.pushes();
    assert_eq!(pushes.len(), 1);
    let body = pushes[0].json();
    assert_eq!(body["streams"][0]["stream"], json!({"app": "cli", "level": "warn"}));
    let values = body["streams"][0]["values"].as_array().unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0][1], json!("{\"message\":\"disk low\"}"));
    assert_eq!(values[1][1], json!("{\"object\":{\"free\":3}}"));
}
