//! Shared helpers: a capturing writer, a quiet config, and an axum Loki
//! stub on a Tokio listener.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use loggify::cli::ColorMode;
use loggify::{BadgeStyle, Config};
use tokio::net::TcpListener;

pub const BUILD_INFO: &str = r#"{"version":"3.4.2","revision":"abc123","branch":"HEAD","buildUser":"root@ci","buildDate":"2026-01-01","goVersion":"go1.23"}"#;

/// Writer whose bytes stay readable after the logger took ownership.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

/// Uncolored lines with only the message segment.
pub fn plain_config() -> Config {
    Config {
        color_mode: ColorMode::Never,
        badge_style: BadgeStyle::Off,
        timestamp: false,
        caller_info: false,
        memory_usage: false,
        init_silent: true,
        ..Config::default()
    }
}

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Loki stand-in answering the build-info probe and the push endpoint with
/// fixed status codes.
pub struct StubLoki {
    pub port: u16,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

#[derive(Clone)]
struct StubState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    probe_status: StatusCode,
    push_status: StatusCode,
}

impl StubState {
    fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: String) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        self.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: uri.path().to_string(),
            headers,
            body,
        });
    }
}

impl StubLoki {
    pub async fn start(probe_status: u16, push_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            requests: Arc::clone(&requests),
            probe_status: StatusCode::from_u16(probe_status).unwrap(),
            push_status: StatusCode::from_u16(push_status).unwrap(),
        };
        let app = Router::new()
            .route("/loki/api/v1/status/buildinfo", get(build_info))
            .route("/loki/api/v1/push", post(push))
            .with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { port, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == "/loki/api/v1/push")
            .collect()
    }

    /// Wait until at least `count` pushes arrived (up to five seconds).
    pub async fn wait_for_pushes(&self, count: usize) -> Vec<Recorded> {
        for _ in 0..250 {
            let pushes = self.pushes();
            if pushes.len() >= count {
                return pushes;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {count} pushes, got {:?}", self.pushes());
    }
}

async fn build_info(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record(&method, &uri, &headers, String::new());
    if state.probe_status == StatusCode::OK {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            BUILD_INFO,
        )
            .into_response()
    } else {
        state.probe_status.into_response()
    }
}

async fn push(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    state.record(&method, &uri, &headers, body);
    state.push_status
}
