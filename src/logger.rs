//! The [`Loggify`] logger: gating, line assembly, context routing, and
//! remote fan-out.
//!
//! # Example
//!
//! ```
//! use loggify::{Config, ContextOptions, LogOptions, Loggify};
//! use loggify::cli::ColorMode;
//!
//! let config = Config {
//!     color_mode: ColorMode::Never,
//!     init_silent: true,
//!     caller_info: false,
//!     memory_usage: false,
//!     timestamp: false,
//!     ..Config::default()
//! };
//! let mut log = Loggify::with_writer(config, std::io::sink());
//!
//! let job = LogOptions::default().context(ContextOptions::new("import"));
//! log.console("reading input", "info", &job, None);
//! log.console("42 rows", "success", &job, None);
//! assert!(log.flush(&"import".into(), false));
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::assets;
use crate::caller::{BacktraceCapture, StackCapture, resolve_caller};
use crate::config::Config;
use crate::context::{self, ContextBuffer, ContextId, ContextMode, DEFAULT_CONTEXT_COLOR, frame_marker};
use crate::formatter;
use crate::level::{LogLevel, LogType};
use crate::loki::{ConnectionStatus, Labels, LokiClient, ProbeOutcome, PushEntry, PushOutcome};
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::object::UNREADABLE;
use crate::style::strip_style_codes;
use crate::timestamp::{epoch_nanos_string, local_clock};

/// The message slot of a log call.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    /// A number, already in display form.
    Number(String),
    /// A structured payload passed where text was expected; it moves to the
    /// object slot.
    Object(Value),
    /// Anything else; carries the kind name for the diagnostic.
    Invalid(&'static str),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

macro_rules! message_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Message {
            fn from(n: $ty) -> Self {
                Self::Number(n.to_string())
            }
        })*
    };
}

message_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Number(n) => Self::Number(n.to_string()),
            Value::Object(_) | Value::Array(_) => Self::Object(value),
            Value::Bool(_) => Self::Invalid("boolean"),
            Value::Null => Self::Invalid("null"),
        }
    }
}

/// Per-call caller overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerOptions {
    /// Stack depth instead of the configured one.
    pub stack_depth: Option<usize>,
    /// Omit the `(Func:…)` part.
    pub hide_function: bool,
}

/// Context membership of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    pub id: ContextId,
    /// Used only when the call creates the context.
    pub title: Option<String>,
    /// Used only when the call creates the context.
    pub mode: Option<ContextMode>,
    /// Frame color for this call; defaults to the context's color.
    pub color: Option<String>,
}

impl ContextOptions {
    pub fn new(id: impl Into<ContextId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            mode: None,
            color: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: ContextMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Timing figures in milliseconds rendered as a `Duration:` prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub duration: Option<f64>,
}

impl Metrics {
    pub fn span(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            duration: None,
        }
    }

    pub fn elapsed(duration: Duration) -> Self {
        Self {
            start: None,
            end: None,
            duration: Some(duration.as_secs_f64() * 1000.0),
        }
    }
}

/// Per-call remote sink options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LokiOptions {
    pub do_not_push: bool,
    /// Replaces the `level` label.
    pub level_overwrite: Option<String>,
    /// Merged over `{level, contextId}`.
    pub labels: Labels,
}

/// Options of a single [`Loggify::console`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogOptions {
    /// Force a timestamp even when disabled globally.
    pub timestamp: bool,
    /// Level override checked against the global level.
    pub log_level: Option<LogLevel>,
    pub caller: CallerOptions,
    pub context: Option<ContextOptions>,
    pub metrics: Option<Metrics>,
    pub loki: LokiOptions,
}

impl LogOptions {
    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    #[must_use]
    pub fn context(mut self, context: ContextOptions) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    #[must_use]
    pub fn do_not_push(mut self) -> Self {
        self.loki.do_not_push = true;
        self
    }
}

/// Console logger with context buffers and optional Loki mirroring.
pub struct Loggify {
    config: Config,
    contexts: ContextBuffer,
    loki: Option<Arc<LokiClient>>,
    sink: Box<dyn Write + Send>,
    stack: Box<dyn StackCapture>,
    memory: Box<dyn MemoryProbe>,
}

impl Loggify {
    /// Logger writing to standard output.
    ///
    /// When a Loki block is configured the client is created and, if a Tokio
    /// runtime is running, its connection test is spawned on it. The init
    /// banner is printed unless `init_silent` is set.
    pub fn new(config: Config) -> Self {
        Self::build(config, Box::new(io::stdout()))
    }

    /// Logger writing to `writer` instead of standard output.
    pub fn with_writer(config: Config, writer: impl Write + Send + 'static) -> Self {
        Self::build(config, Box::new(writer))
    }

    fn build(config: Config, sink: Box<dyn Write + Send>) -> Self {
        let (loki, loki_error) = match config.loki.as_ref().map(LokiClient::new).transpose() {
            Ok(client) => (client.map(Arc::new), None),
            Err(err) => (None, Some(err)),
        };
        let silent = config.init_silent;

        let mut logger = Self {
            config,
            contexts: ContextBuffer::new(),
            loki,
            sink,
            stack: Box::new(BacktraceCapture),
            memory: Box::new(ProcessMemory::new()),
        };

        if let Some(err) = loki_error {
            let options = logger.internal_options(LogLevel::Off, 3);
            logger.console(
                format!("GrafanaLoki: [ansi:red]Initialization failed![ansi:reset] => {err}"),
                LogType::Error,
                &options,
                None,
            );
        }
        if let Some(client) = &logger.loki {
            if client.status() == ConnectionStatus::Connecting {
                spawn_probe(Arc::clone(client));
            }
        }
        if !silent {
            logger.write_banner(3);
        }
        logger
    }

    /// Replace the stack capture used for caller resolution.
    #[must_use]
    pub fn with_stack_capture(mut self, capture: impl StackCapture + 'static) -> Self {
        self.stack = Box::new(capture);
        self
    }

    /// Replace the memory probe.
    #[must_use]
    pub fn with_memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory = Box::new(probe);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log_level(&self) -> LogLevel {
        self.config.log_level
    }

    /// The remote client, when one is configured.
    pub fn loki(&self) -> Option<&Arc<LokiClient>> {
        self.loki.as_ref()
    }

    /// Number of contexts that have not been flushed yet.
    pub fn open_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// A fresh random context id.
    pub fn generate_context_id(&self) -> ContextId {
        ContextId::unique()
    }

    /// Log one message.
    ///
    /// Returns `false` when the call was suppressed by the log level. The
    /// line goes to the sink directly, or into the context named in
    /// `options` until [`flush`](Self::flush).
    #[inline(never)]
    pub fn console(
        &mut self,
        message: impl Into<Message>,
        log_type: impl Into<LogType>,
        options: &LogOptions,
        object: Option<Value>,
    ) -> bool {
        let mut log_type = log_type.into();
        let mut level_override = options.log_level;
        let mut object = object;

        let message = match message.into() {
            Message::Text(text) => text,
            Message::Number(number) => number,
            Message::Object(value) => {
                object = Some(value);
                formatter::FOUND_OBJECT_MESSAGE.to_string()
            }
            Message::Invalid(kind) => {
                log_type = LogType::Error;
                level_override = Some(LogLevel::Off);
                format!(
                    "Invalid data type [ansi:red]\"{kind}\"[ansi:reset] for message! Must be either string, number or object"
                )
            }
        };

        if !self.config.log_level.admits(level_override) {
            return false;
        }

        let context = options.context.as_ref().map(|ctx| {
            let color = ctx
                .color
                .clone()
                .filter(|color| assets::is_color(color))
                .or_else(|| self.contexts.color_of(&ctx.id).map(str::to_string))
                .unwrap_or_else(|| DEFAULT_CONTEXT_COLOR.to_string());
            let mode = ctx.mode.unwrap_or_default();
            let record = self.contexts.ensure(&ctx.id, ctx.title.as_deref(), &color, mode);
            (ctx.id.clone(), frame_marker(record.mode, &color))
        });

        let badge = formatter::badge(self.config.badge_style, &log_type);

        let timestamp = if self.config.timestamp || options.timestamp {
            formatter::timestamp_segment(&local_clock(self.config.timestamp_mode))
        } else {
            String::new()
        };

        let memory = if self.config.memory_usage {
            formatter::memory_segment(&self.memory.snapshot())
        } else {
            String::new()
        };

        let caller = if self.config.caller_info {
            let depth = options.caller.stack_depth.unwrap_or(self.config.caller_depth);
            let location = resolve_caller(self.stack.as_ref(), depth);
            formatter::caller_segment(location.as_ref(), options.caller.hide_function)
        } else {
            String::new()
        };

        let mut text = String::new();
        if !message.is_empty() {
            text = formatter::message_text(&message);
            if let Some(metrics) = options.metrics {
                if let (Some(start), Some(end)) = (metrics.start, metrics.end) {
                    text = formatter::duration_prefix(end - start) + &text;
                }
                if let Some(duration) = metrics.duration {
                    text = formatter::duration_prefix(duration) + &text;
                }
            }

            let line = format!("{badge}{timestamp}{memory}{caller}{text}\n");
            match &context {
                Some((id, frame)) => {
                    self.contexts.append(id, format!("{frame}{line}"));
                }
                None => self.write_out(&line),
            }
        }

        if let Some(value) = &object {
            match &context {
                Some((id, frame)) => {
                    let block = formatter::object_block(value, frame);
                    self.contexts.append(id, block);
                }
                None => {
                    let block = formatter::object_block(value, "");
                    self.write_out(&block);
                }
            }
        }

        if !options.loki.do_not_push {
            self.fan_out(&log_type, &text, object, options, context.as_ref().map(|(id, _)| id));
        }

        true
    }

    /// [`console`](Self::console) with any serializable payload in the
    /// object slot. A payload that fails to serialize is logged as
    /// `"[unreadable]"`.
    #[inline(never)]
    pub fn console_serialize<T: Serialize + ?Sized>(
        &mut self,
        message: impl Into<Message>,
        log_type: impl Into<LogType>,
        options: &LogOptions,
        payload: &T,
    ) -> bool {
        let value = serde_json::to_value(payload).unwrap_or_else(|err| {
            debug!(error = %err, "payload is not serializable");
            Value::String(UNREADABLE.to_string())
        });
        let options = self.deeper(options, 1);
        self.console(message, log_type, &options, Some(value))
    }

    /// Write a context's buffered lines and its footer, then forget it.
    ///
    /// With `discard` the lines are dropped instead. Returns `false` (and
    /// logs an error) when the context does not exist.
    pub fn flush(&mut self, id: &ContextId, discard: bool) -> bool {
        let Some(record) = self.contexts.take(id) else {
            let options = self.internal_options(LogLevel::Off, 1);
            self.console(
                format!("Context ID \"[ansi:yellow]{id}[ansi:reset] does not exist in log buffer!"),
                LogType::Error,
                &options,
                None,
            );
            return false;
        };

        if !discard {
            for line in &record.lines {
                self.write_out(line);
            }
            if let Some(footer) = context::footer(id, &record) {
                self.write_out(&footer);
            }
        }
        true
    }

    /// Change the global level. Returns `false` when it is already set.
    pub fn set_log_level(&mut self, level: LogLevel) -> bool {
        let previous = self.config.log_level;
        if previous == level {
            let options = self.internal_options(LogLevel::Minimal, 1);
            self.console(
                format!("Loggify @LogLevel: already set to \"{level}\""),
                LogType::Warn,
                &options,
                None,
            );
            return false;
        }

        self.config.log_level = level;
        let options = self.internal_options(LogLevel::Off, 1);
        self.console(
            format!(
                "Loggify @LogLevel: \"[ansi:brightBlue]{previous}[ansi:reset]\" => \"[ansi:brightGreen]{level}[ansi:reset]\""
            ),
            LogType::Info,
            &options,
            None,
        );
        true
    }

    /// Print the settings banner. Always visible.
    pub fn log_init(&mut self) {
        self.write_banner(2);
    }

    fn write_banner(&mut self, extra_depth: usize) {
        let options = self.internal_options(LogLevel::Off, extra_depth);
        let config = &self.config;

        let mut lines = vec![
            (
                format!("╭ Loggify v{} loaded [ansi:reset]", env!("CARGO_PKG_VERSION")),
                LogType::Init,
            ),
            (
                format!("├─── Log level: [ansi:magenta]{}[ansi:reset]", config.log_level),
                LogType::None,
            ),
            (
                format!("├─── Log timestamp: [ansi:magenta]{}[ansi:reset]", config.timestamp),
                LogType::None,
            ),
        ];
        if config.timestamp {
            lines.push((
                format!("├─── Timestamp format: [ansi:magenta]{}[ansi:reset]", config.timestamp_mode),
                LogType::None,
            ));
        }
        lines.extend([
            (
                format!("├─── Log type badge: [ansi:magenta]{}[ansi:reset]", config.badge_style),
                LogType::None,
            ),
            (
                format!("├─── Log caller information: [ansi:magenta]{}[ansi:reset]", config.caller_info),
                LogType::None,
            ),
            (
                format!(
                    "├─── Default caller information level: [ansi:magenta]{}[ansi:reset]",
                    config.caller_depth
                ),
                LogType::None,
            ),
            (
                format!("╰─── Log memory usage: [ansi:magenta]{}[ansi:reset]", config.memory_usage),
                LogType::None,
            ),
        ]);

        for (line, log_type) in lines {
            self.console(line, log_type, &options, None);
        }
    }

    /// Probe the Loki server and report the result.
    pub async fn test_connection(&mut self) -> bool {
        let Some(client) = self.loki.clone() else {
            self.diagnostic(
                "GrafanaLoki: [ansi:red]Not initialized![ansi:reset] Cannot test connection!".to_string(),
                LogType::Error,
                Some(LogLevel::Off),
            );
            return false;
        };

        match client.test_connection().await {
            ProbeOutcome::Connected(info) => {
                self.diagnostic(
                    format!(
                        "GrafanaLoki: [ansi:green]Connection successfully tested![ansi:reset] v{}({}) [ansi:gray][{}][ansi:reset]",
                        info.version, info.revision, info.build_date
                    ),
                    LogType::Okay,
                    Some(LogLevel::Minimal),
                );
                true
            }
            ProbeOutcome::NotInitialized => {
                self.diagnostic(
                    "GrafanaLoki: [ansi:red]Not initialized![ansi:reset] Cannot test connection!".to_string(),
                    LogType::Error,
                    Some(LogLevel::Off),
                );
                false
            }
            ProbeOutcome::MissingHostname => false,
            ProbeOutcome::BadResponse { status, reason } => {
                self.diagnostic(
                    format!("GrafanaLoki: [ansi:yellow]Testing connection failed![ansi:reset] => {status} - {reason}"),
                    LogType::Error,
                    Some(LogLevel::Off),
                );
                false
            }
            ProbeOutcome::Failed(err) => {
                self.diagnostic(
                    format!("GrafanaLoki: [ansi:red]Error while testing connection![ansi:reset] => {err}"),
                    LogType::Error,
                    Some(LogLevel::Off),
                );
                false
            }
        }
    }

    /// Push entries to Loki. Unless `silent`, the outcome is reported as a
    /// log line.
    pub async fn push(&mut self, entries: Vec<PushEntry>, labels: &Labels, silent: bool) -> bool {
        let outcome = match self.loki.clone() {
            Some(client) => {
                let outcome = client.push(entries, labels).await;
                if !silent {
                    self.report_push(&client, &outcome);
                }
                outcome
            }
            None => {
                if !silent {
                    self.diagnostic(
                        "GrafanaLoki: [ansi:red]Cannot push![ansi:reset] No connection setup!".to_string(),
                        LogType::Error,
                        None,
                    );
                }
                PushOutcome::NotInitialized
            }
        };
        outcome.is_pushed()
    }

    fn report_push(&mut self, client: &LokiClient, outcome: &PushOutcome) {
        let (message, log_type, level) = match outcome {
            PushOutcome::Pushed => (
                format!("GrafanaLoki: [ansi:green]Successfully pushed![ansi:reset] ==> {}", client.base_url()),
                LogType::Okay,
                Some(LogLevel::Full),
            ),
            PushOutcome::TimedOut => (
                format!(
                    "GrafanaLoki: [ansi:yellow]Connection timeout reached[ansi:reset] connecting to \"{}\"",
                    client.hostname()
                ),
                LogType::Warn,
                None,
            ),
            PushOutcome::NotInitialized => (
                "GrafanaLoki: [ansi:red]Cannot push![ansi:reset] No connection setup!".to_string(),
                LogType::Error,
                None,
            ),
            PushOutcome::ConnectionError(reason) => (
                format!("GrafanaLoki: [ansi:red]Cannot push![ansi:reset] Connection error => {reason}!"),
                LogType::Error,
                None,
            ),
            PushOutcome::Empty => (
                "GrafanaLoki: [ansi:yellow]Nothing to push![ansi:reset] => No records provided in entries!"
                    .to_string(),
                LogType::None,
                None,
            ),
            PushOutcome::BadResponse { status, reason } => (
                format!("GrafanaLoki: [ansi:yellow]Bad response while pushing![ansi:reset] ==> {status} {reason}"),
                LogType::Warn,
                Some(LogLevel::Off),
            ),
            PushOutcome::Failed(err) => (
                format!("GrafanaLoki: [ansi:red]Push failed![ansi:reset] ==> {err}"),
                LogType::Error,
                Some(LogLevel::Off),
            ),
        };
        self.diagnostic(message, log_type, level);
    }

    /// Loki status lines are never mirrored back to Loki.
    fn diagnostic(&mut self, message: String, log_type: LogType, level: Option<LogLevel>) {
        let mut options = self.deeper(&LogOptions::default(), 1).do_not_push();
        options.log_level = level;
        self.console(message, log_type, &options, None);
    }

    fn fan_out(
        &self,
        log_type: &LogType,
        text: &str,
        object: Option<Value>,
        options: &LogOptions,
        context: Option<&ContextId>,
    ) {
        let Some(client) = &self.loki else {
            return;
        };
        if !matches!(
            client.status(),
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            return;
        }

        let mut line = Map::new();
        if !text.is_empty() {
            line.insert("message".to_string(), Value::String(formatter::remote_message(text)));
        }
        if let Some(value) = object {
            line.insert("object".to_string(), value);
        }

        let mut labels = Labels::new();
        match &options.loki.level_overwrite {
            Some(level) => {
                labels.insert("level".to_string(), level.clone());
            }
            None if *log_type != LogType::None => {
                labels.insert("level".to_string(), log_type.to_string());
            }
            None => {}
        }
        if let Some(id) = context {
            labels.insert("contextId".to_string(), id.to_string());
        }
        labels.extend(options.loki.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let entry = PushEntry::at(epoch_nanos_string(), Value::Object(line));
        spawn_push(Arc::clone(client), vec![entry], labels);
    }

    fn write_out(&mut self, text: &str) {
        let result = if self.config.use_color() {
            self.sink.write_all(text.as_bytes())
        } else {
            self.sink.write_all(strip_style_codes(text).as_bytes())
        };
        if let Err(err) = result {
            debug!(error = %err, "log sink write failed");
        }
    }

    /// Options for the logger's own lines, resolving the caller `extra`
    /// frames above `console`.
    fn internal_options(&self, level: LogLevel, extra: usize) -> LogOptions {
        let mut options = self.deeper(&LogOptions::default(), extra);
        options.log_level = Some(level);
        options
    }

    fn deeper(&self, options: &LogOptions, extra: usize) -> LogOptions {
        let mut options = options.clone();
        let base = options.caller.stack_depth.unwrap_or(self.config.caller_depth);
        options.caller.stack_depth = Some(base + extra);
        options
    }
}

fn spawn_probe(client: Arc<LokiClient>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                match client.test_connection().await {
                    ProbeOutcome::Connected(info) => {
                        debug!(version = %info.version, revision = %info.revision, "Loki connection tested");
                    }
                    outcome => warn!(?outcome, "Loki connection test failed"),
                }
            });
        }
        Err(_) => debug!("no Tokio runtime, Loki connection test not started"),
    }
}

fn spawn_push(client: Arc<LokiClient>, entries: Vec<PushEntry>, labels: Labels) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let outcome = client.push(entries, &labels).await;
                if !outcome.is_pushed() {
                    debug!(?outcome, "Loki push dropped");
                }
            });
        }
        Err(_) => debug!("no Tokio runtime, Loki push skipped"),
    }
}
