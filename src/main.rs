use std::io::{self, BufRead, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use loggify::cli::{Cli, ColorMode};
use loggify::config::Config;
use loggify::formatter::remote_message;
use loggify::{ContextOptions, Labels, LogOptions, LogType, Loggify, Message, PushEntry};

fn main() -> ExitCode {
    // Reset SIGPIPE to default behavior so a closed pipe ends the process
    // quietly instead of surfacing write errors.
    reset_sigpipe();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOGGIFY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("loggify: {e}");
            return ExitCode::from(1);
        }
    };
    config.color_mode = if resolve_color_mode(config.color_mode) {
        ColorMode::Always
    } else {
        ColorMode::Never
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("loggify: cannot start runtime: {e}");
            return ExitCode::from(2);
        }
    };

    runtime.block_on(run(&cli, config))
}

async fn run(cli: &Cli, config: Config) -> ExitCode {
    let mirror = config.loki.is_some();
    let mut log = Loggify::new(config);
    let log_type = LogType::parse(&cli.log_type);

    // Lines are mirrored as one batch at the end of input.
    let mut options = LogOptions::default().do_not_push();
    options.log_level = cli.line_level;
    if let Some(ref id) = cli.context {
        let mut context = ContextOptions::new(id.as_str());
        context.title.clone_from(&cli.context_title);
        context.mode = cli.context_mode;
        context.color.clone_from(&cli.context_color);
        options.context = Some(context);
    }

    let mut entries = Vec::new();
    let stdin = io::stdin();
    for line_result in stdin.lock().lines() {
        let line = match line_result {
            Ok(l) => l,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => continue,
            Err(e) => {
                eprintln!("loggify: read error: {e}");
                return ExitCode::from(2);
            }
        };

        let message = parse_message(&line);
        if log.console(message.clone(), log_type.clone(), &options, None) && mirror {
            entries.push(PushEntry::new(remote_line(message)));
        }
    }

    if let Some(ref id) = cli.context {
        log.flush(&id.as_str().into(), cli.discard);
    }

    if mirror && !entries.is_empty() {
        let mut labels = Labels::new();
        if log_type != LogType::None {
            labels.insert("level".to_string(), log_type.to_string());
        }
        if let Some(ref id) = cli.context {
            labels.insert("contextId".to_string(), id.clone());
        }
        if !log.push(entries, &labels, false).await {
            return ExitCode::from(3);
        }
    }

    ExitCode::SUCCESS
}

/// JSON object and array lines are logged as payloads, everything else as text.
fn parse_message(line: &str) -> Message {
    let trimmed = line.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str(trimmed) {
            return Message::Object(value);
        }
    }
    Message::Text(line.to_string())
}

fn remote_line(message: Message) -> Value {
    let mut line = Map::new();
    match message {
        Message::Object(value) => {
            line.insert("object".to_string(), value);
        }
        Message::Text(text) | Message::Number(text) => {
            line.insert("message".to_string(), Value::String(remote_message(&text)));
        }
        Message::Invalid(_) => {}
    }
    Value::Object(line)
}

fn resolve_color_mode(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            let stdout = io::stdout();
            if !stdout.is_terminal() {
                return false;
            }
            if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
                return false;
            }
            if std::env::var("TERM").is_ok_and(|v| v == "dumb") {
                return false;
            }
            true
        }
    }
}

/// Reset SIGPIPE to the default (terminate) behavior.
///
/// Rust ignores SIGPIPE by default to surface `BrokenPipe` I/O errors; for a
/// pipeline tool like `loggify | head` the OS default is the expected one.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}
