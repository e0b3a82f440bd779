//! Grafana Loki client: connection state, build-info probe, and batched push.
//!
//! The client is shared (`Arc<LokiClient>`) between the logger and the
//! background tasks it spawns. Its connection state sits behind a mutex that
//! is never held across an `.await`.
//!
//! State machine per connection attempt:
//!
//! ```text
//! Uninitialized ──(hostname + port)──▶ Connecting ──probe──▶ Connected
//!                                          │
//!                                          └──probe / wait──▶ Error
//! ```
//!
//! A push that finds the state `Connecting` polls every
//! [`POLL_INTERVAL`] until it changes or [`CONNECT_WAIT`] elapses. A failed
//! push never changes the state; only the probe and the wait timeout do.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LoggifyError;
use crate::host;
use crate::timestamp::epoch_nanos_string;

/// Build-info endpoint used to test the connection.
pub const BUILD_INFO_PATH: &str = "/loki/api/v1/status/buildinfo";

/// Push endpoint.
pub const PUSH_PATH: &str = "/loki/api/v1/push";

/// How long a push waits for a pending connection test.
pub const CONNECT_WAIT: Duration = Duration::from_millis(15_000);

/// How often a waiting push re-checks the connection state.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Label value that expands to this machine's identity.
pub const HOST_THIS: &str = "this";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stream labels. Flat, string-keyed, string-valued.
pub type Labels = BTreeMap<String, String>;

/// Credentials sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    #[default]
    None,
    Basic { user: String, pass: String },
    Bearer {
        #[serde(alias = "bearerToken")]
        token: String,
    },
}

impl Auth {
    /// Value of the `Authorization` header (empty for [`Auth::None`]).
    pub fn header_value(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Basic { user, pass } => {
                format!("Basic {}", BASE64.encode(format!("{user}:{pass}")))
            }
            Self::Bearer { token } => format!("Bearer {token}"),
        }
    }
}

/// Remote sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LokiConfig {
    /// Host name, with or without an `http://` / `https://` prefix.
    pub hostname: String,
    pub port: Option<u16>,
    /// Use `https`.
    #[serde(alias = "isSecure")]
    pub secure: bool,
    pub auth: Auth,
    /// Labels attached to every stream.
    pub labels: Labels,
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Uninitialized,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        })
    }
}

/// Status plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Connection {
    pub status: ConnectionStatus,
    pub message: String,
}

/// Server build metadata reported by the build-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: String,
    pub revision: String,
    pub branch: String,
    pub build_user: String,
    pub build_date: String,
    pub go_version: String,
}

/// One log record to push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEntry {
    /// Nanoseconds since the epoch; defaults to now when `None`.
    pub ts: Option<String>,
    /// Sent verbatim when a string, as compact JSON otherwise.
    pub line: Value,
}

impl PushEntry {
    pub fn new(line: impl Into<Value>) -> Self {
        Self {
            ts: None,
            line: line.into(),
        }
    }

    pub fn at(ts: impl Into<String>, line: impl Into<Value>) -> Self {
        Self {
            ts: Some(ts.into()),
            line: line.into(),
        }
    }
}

/// Result of [`LokiClient::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected(ServerInfo),
    NotInitialized,
    MissingHostname,
    BadResponse { status: u16, reason: String },
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Result of [`LokiClient::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// No usable configuration.
    NotInitialized,
    /// The connection is in the error state; carries its message.
    ConnectionError(String),
    /// The pending connection test did not finish within [`CONNECT_WAIT`].
    TimedOut,
    /// Nothing to push.
    Empty,
    BadResponse { status: u16, reason: String },
    Failed(String),
}

impl PushOutcome {
    pub fn is_pushed(&self) -> bool {
        matches!(self, Self::Pushed)
    }
}

#[derive(Debug, Default)]
struct State {
    connection: Connection,
    server_info: Option<ServerInfo>,
}

#[derive(Serialize)]
struct PushBody<'a> {
    streams: [PushStream<'a>; 1],
}

#[derive(Serialize)]
struct PushStream<'a> {
    stream: &'a Labels,
    values: Vec<[String; 2]>,
}

/// HTTP client for one Loki server.
#[derive(Debug)]
pub struct LokiClient {
    /// `scheme://host:port`
    base_url: String,
    hostname: String,
    authorization: String,
    labels: Labels,
    http: reqwest::Client,
    state: Mutex<State>,
}

impl LokiClient {
    /// Build a client. The state starts as `Connecting` when both hostname
    /// and port are configured, `Uninitialized` otherwise; no request is
    /// made until [`test_connection`](Self::test_connection) or a push.
    pub fn new(config: &LokiConfig) -> Result<Self, LoggifyError> {
        let hostname = strip_scheme(&config.hostname).to_string();
        let scheme = if config.secure { "https" } else { "http" };
        let port = config.port.unwrap_or_default();
        let base_url = format!("{scheme}://{hostname}:{port}");

        let connection = match config.port {
            Some(port) => Connection {
                status: ConnectionStatus::Connecting,
                message: format!("Connecting to \"{scheme}://{hostname}\" via port \"{port}\" ..."),
            },
            None => Connection {
                status: ConnectionStatus::Uninitialized,
                message: "Incomplete connection setup! Require hostname and port!".to_string(),
            },
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            hostname,
            authorization: config.auth.header_value(),
            labels: config.labels.clone(),
            http,
            state: Mutex::new(State {
                connection,
                server_info: None,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connection(&self) -> Connection {
        self.state().connection.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state().connection.status
    }

    /// Build metadata from the last successful probe.
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.state().server_info.clone()
    }

    pub(crate) fn set_connection(&self, status: ConnectionStatus, message: impl Into<String>) {
        let mut state = self.state();
        state.connection = Connection {
            status,
            message: message.into(),
        };
    }

    /// Probe the build-info endpoint and move the state to `Connected` or
    /// `Error`.
    pub async fn test_connection(&self) -> ProbeOutcome {
        if self.status() == ConnectionStatus::Uninitialized {
            return ProbeOutcome::NotInitialized;
        }
        if self.hostname.is_empty() {
            self.set_connection(ConnectionStatus::Error, "Incomplete setup! Missing hostname!");
            return ProbeOutcome::MissingHostname;
        }

        let url = format!("{}{BUILD_INFO_PATH}", self.base_url);
        debug!(url = %url, "testing Loki connection");

        match self.fetch_build_info(&url).await {
            Ok(Ok(info)) => {
                let mut state = self.state();
                state.connection = Connection {
                    status: ConnectionStatus::Connected,
                    message: format!("Connected to \"{url}\"!"),
                };
                state.server_info = Some(info.clone());
                ProbeOutcome::Connected(info)
            }
            Ok(Err((status, reason))) => {
                warn!(url = %url, status, "Loki connection test got a bad response");
                self.set_connection(
                    ConnectionStatus::Error,
                    format!("Bad response connecting to \"{url}\" => {status} - {reason}"),
                );
                ProbeOutcome::BadResponse { status, reason }
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Loki connection test failed");
                self.set_connection(
                    ConnectionStatus::Error,
                    format!("Failed connecting to \"{url}\" => {err}"),
                );
                ProbeOutcome::Failed(err.to_string())
            }
        }
    }

    /// `Ok(Ok(info))` on 200 with a JSON body, `Ok(Err((status, reason)))`
    /// on any other status.
    async fn fetch_build_info(
        &self,
        url: &str,
    ) -> Result<Result<ServerInfo, (u16, String)>, LoggifyError> {
        let response = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(Err(status_parts(status)));
        }
        let info: ServerInfo = response.json().await?;
        Ok(Ok(info))
    }

    /// Push `entries` as one stream labeled with the global labels merged
    /// with `labels` (call labels win).
    pub async fn push(&self, entries: Vec<PushEntry>, labels: &Labels) -> PushOutcome {
        if self.status() == ConnectionStatus::Connecting && !self.wait_for_connection().await {
            return PushOutcome::TimedOut;
        }

        let connection = self.connection();
        match connection.status {
            ConnectionStatus::Uninitialized => return PushOutcome::NotInitialized,
            ConnectionStatus::Error => return PushOutcome::ConnectionError(connection.message),
            ConnectionStatus::Connecting | ConnectionStatus::Connected => {}
        }
        if entries.is_empty() {
            return PushOutcome::Empty;
        }

        let stream = self.merge_labels(labels);
        let body = PushBody {
            streams: [PushStream {
                stream: &stream,
                values: entries.into_iter().map(entry_pair).collect(),
            }],
        };

        let url = format!("{}{PUSH_PATH}", self.base_url);
        debug!(url = %url, values = body.streams[0].values.len(), "pushing to Loki");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, &self.authorization)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => PushOutcome::Pushed,
            Ok(response) => {
                let (status, reason) = status_parts(response.status());
                warn!(url = %url, status, "Loki push got a bad response");
                PushOutcome::BadResponse { status, reason }
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Loki push failed");
                PushOutcome::Failed(err.to_string())
            }
        }
    }

    /// Poll until the state leaves `Connecting`. Returns `false` (and sets
    /// the state to `Error`) when [`CONNECT_WAIT`] runs out first.
    async fn wait_for_connection(&self) -> bool {
        let start = tokio::time::Instant::now();
        while self.status() == ConnectionStatus::Connecting {
            if start.elapsed() >= CONNECT_WAIT {
                self.set_connection(
                    ConnectionStatus::Error,
                    format!("Connection timeout reached connecting to \"{}\"", self.hostname),
                );
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        true
    }

    pub(crate) fn hostname(&self) -> &str {
        &self.hostname
    }

    fn merge_labels(&self, labels: &Labels) -> Labels {
        let mut merged = self.labels.clone();
        merged.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        if merged.get("host").is_some_and(|h| h == HOST_THIS) {
            merged.insert("host".to_string(), host::describe());
        }
        merged
    }
}

fn strip_scheme(hostname: &str) -> &str {
    let trimmed = hostname.trim();
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
}

fn status_parts(status: StatusCode) -> (u16, String) {
    (
        status.as_u16(),
        status.canonical_reason().unwrap_or_default().to_string(),
    )
}

fn entry_pair(entry: PushEntry) -> [String; 2] {
    // An empty timestamp is rejected by Loki; treat it as unset.
    let ts = entry
        .ts
        .filter(|ts| !ts.is_empty())
        .unwrap_or_else(epoch_nanos_string);
    let line = match entry.line {
        Value::String(s) => s,
        other => other.to_string(),
    };
    [ts, line]
}
