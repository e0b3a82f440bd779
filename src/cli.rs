//! Command-line argument definitions for `loggify`.
//!
//! Uses [`clap`] derive macros. Every flag that mirrors a config-file key
//! is optional so [`Config::from_cli`](crate::Config::from_cli) can tell
//! "not given" apart from "given".

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::context::ContextMode;
use crate::level::{BadgeStyle, LogLevel};
use crate::timestamp::TimestampMode;

/// Log standard-input lines through loggify.
///
/// Every input line becomes one log call. With `--context` the lines are
/// buffered and written as one framed block when input ends.
#[derive(Debug, Parser)]
#[command(name = "loggify", version, about, long_about = None)]
pub struct Cli {
    /// Control color output.
    ///
    /// `auto` enables colors only when stdout is a TTY and `NO_COLOR` is unset.
    #[arg(short = 'c', long, value_enum)]
    pub color: Option<ColorMode>,

    /// Global log level (off, minimal, full).
    #[arg(short = 'l', long, value_parser = parse_level_arg)]
    pub level: Option<LogLevel>,

    /// Per-line level override (off, minimal, full).
    #[arg(long, value_parser = parse_level_arg)]
    pub line_level: Option<LogLevel>,

    /// Badge style (off, emoji, tiny, mini, full).
    #[arg(short = 'b', long, value_parser = parse_badge_arg)]
    pub badge: Option<BadgeStyle>,

    /// Log type of every line (`info`, `error`, `custom=[ansi:bgBlue]JOB`, ...).
    #[arg(short = 't', long = "type", default_value = "none")]
    pub log_type: String,

    /// Buffer all lines into this context and flush it at end of input.
    #[arg(short = 'x', long)]
    pub context: Option<String>,

    /// Title shown in the context frame.
    #[arg(long, requires = "context")]
    pub context_title: Option<String>,

    /// Context frame style (full, startEnd, off).
    #[arg(long, requires = "context", value_parser = parse_context_mode_arg)]
    pub context_mode: Option<ContextMode>,

    /// Context frame color (any `[ansi:NAME]` color).
    #[arg(long, requires = "context")]
    pub context_color: Option<String>,

    /// Discard the buffered context instead of writing it.
    #[arg(long, requires = "context")]
    pub discard: bool,

    /// Hide the timestamp segment.
    #[arg(long)]
    pub no_timestamp: bool,

    /// Timestamp format (time, dateTime).
    #[arg(long, value_parser = parse_timestamp_mode_arg)]
    pub timestamp_mode: Option<TimestampMode>,

    /// Hide the caller segment.
    #[arg(long)]
    pub no_caller: bool,

    /// Stack depth of the reported caller.
    #[arg(long)]
    pub caller_depth: Option<usize>,

    /// Hide the memory segment.
    #[arg(long)]
    pub no_memory: bool,

    /// Do not print the init banner.
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Grafana Loki host name; enables mirroring together with `--loki-port`.
    #[arg(long)]
    pub loki_host: Option<String>,

    /// Grafana Loki port.
    #[arg(long)]
    pub loki_port: Option<u16>,

    /// Talk to Grafana Loki over https.
    #[arg(long)]
    pub loki_secure: bool,

    /// Extra Loki stream label as `KEY=VALUE` (repeatable).
    #[arg(long = "loki-label", value_parser = parse_label_arg)]
    pub loki_labels: Vec<(String, String)>,

    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Enable colors only when stdout is a TTY.
    #[default]
    Auto,
    /// Always enable colors.
    Always,
    /// Never enable colors.
    Never,
}

impl ColorMode {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            _ => Self::Auto,
        }
    }
}

fn parse_level_arg(s: &str) -> Result<LogLevel, String> {
    s.parse().map_err(|e: crate::LoggifyError| e.to_string())
}

fn parse_badge_arg(s: &str) -> Result<BadgeStyle, String> {
    s.parse().map_err(|e: crate::LoggifyError| e.to_string())
}

fn parse_context_mode_arg(s: &str) -> Result<ContextMode, String> {
    ContextMode::from_str_loose(s)
        .ok_or_else(|| format!("invalid context mode '{s}': expected one of full, startEnd, off"))
}

fn parse_timestamp_mode_arg(s: &str) -> Result<TimestampMode, String> {
    TimestampMode::from_str_loose(s)
        .ok_or_else(|| format!("invalid timestamp mode '{s}': expected one of time, dateTime"))
}

fn parse_label_arg(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid label '{s}': expected KEY=VALUE")),
    }
}
