//! Configuration management with TOML file support.
//!
//! Merges settings from three sources (highest precedence first):
//! 1. CLI flags
//! 2. Config file (`~/.config/loggify/config.toml` or `$XDG_CONFIG_HOME/loggify/config.toml`)
//! 3. Built-in defaults
//!
//! ```toml
//! color = "auto"
//! log_level = "full"
//! badge = "emoji"
//! memory = true
//! init_silent = false
//!
//! [timestamp]
//! enabled = true
//! mode = "dateTime"
//!
//! [caller]
//! enabled = true
//! depth = 3
//!
//! [loki]
//! hostname = "loki.internal"
//! port = 3100
//! secure = false
//! auth = { type = "basic", user = "svc", pass = "secret" }
//! labels = { app = "billing", host = "this" }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::caller::DEFAULT_DEPTH;
use crate::cli::{Cli, ColorMode};
use crate::error::LoggifyError;
use crate::level::{BadgeStyle, LogLevel};
use crate::loki::LokiConfig;
use crate::timestamp::TimestampMode;

/// Construction options of a [`Loggify`](crate::Loggify) instance.
///
/// Use [`Config::from_cli`] to build from parsed CLI arguments, or
/// [`Config::default`] for built-in defaults (useful in tests and benchmarks).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Color output mode. The library treats `Auto` like `Always`; the
    /// binary resolves `Auto` against its terminal before constructing.
    pub color_mode: ColorMode,
    /// Global verbosity gate.
    pub log_level: LogLevel,
    pub badge_style: BadgeStyle,
    /// Print a timestamp on every line.
    pub timestamp: bool,
    pub timestamp_mode: TimestampMode,
    /// Print the call site on every line.
    pub caller_info: bool,
    /// Stack depth of the call site (see [`crate::caller`]).
    pub caller_depth: usize,
    /// Print process memory figures on every line.
    pub memory_usage: bool,
    /// Skip the init banner.
    pub init_silent: bool,
    /// Remote sink; `None` disables mirroring.
    pub loki: Option<LokiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Auto,
            log_level: LogLevel::Full,
            badge_style: BadgeStyle::Emoji,
            timestamp: true,
            timestamp_mode: TimestampMode::Time,
            caller_info: true,
            caller_depth: DEFAULT_DEPTH,
            memory_usage: true,
            init_silent: false,
            loki: None,
        }
    }
}

impl Config {
    /// Build a [`Config`] from CLI arguments, loading the config file if present.
    ///
    /// Merge precedence: CLI flags > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, LoggifyError> {
        let mut config = Self::default();

        let config_path = cli.config.clone().unwrap_or_else(Self::default_config_path);
        if config_path.exists() {
            let file_config = FileConfig::load(&config_path)?;
            config.apply_file_config(file_config);
        } else if cli.config.is_some() {
            return Err(LoggifyError::Config(format!(
                "config file {} does not exist",
                config_path.display()
            )));
        }

        config.apply_cli(cli);
        Ok(config)
    }

    /// Whether rendered lines keep their control codes.
    pub fn use_color(&self) -> bool {
        self.color_mode != ColorMode::Never
    }

    /// Default config file path: `$XDG_CONFIG_HOME/loggify/config.toml` or `~/.config/loggify/config.toml`.
    fn default_config_path() -> PathBuf {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(xdg).join("loggify").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("loggify")
                .join("config.toml")
        } else {
            PathBuf::from(".config/loggify/config.toml")
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(color) = cli.color {
            self.color_mode = color;
        }
        if let Some(level) = cli.level {
            self.log_level = level;
        }
        if let Some(badge) = cli.badge {
            self.badge_style = badge;
        }
        if cli.no_timestamp {
            self.timestamp = false;
        }
        if let Some(mode) = cli.timestamp_mode {
            self.timestamp_mode = mode;
        }
        if cli.no_caller {
            self.caller_info = false;
        }
        if let Some(depth) = cli.caller_depth {
            self.caller_depth = depth;
        }
        if cli.no_memory {
            self.memory_usage = false;
        }
        if cli.silent {
            self.init_silent = true;
        }

        if cli.loki_host.is_some() || cli.loki_port.is_some() || !cli.loki_labels.is_empty() {
            let loki = self.loki.get_or_insert_with(LokiConfig::default);
            if let Some(ref host) = cli.loki_host {
                loki.hostname.clone_from(host);
            }
            if cli.loki_port.is_some() {
                loki.port = cli.loki_port;
            }
            loki.labels.extend(cli.loki_labels.iter().cloned());
        }
        if cli.loki_secure {
            if let Some(loki) = self.loki.as_mut() {
                loki.secure = true;
            }
        }
    }

    /// Apply settings from a parsed config file.
    fn apply_file_config(&mut self, file: FileConfig) {
        if let Some(color) = file.color {
            self.color_mode = ColorMode::from_str_loose(&color);
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(badge) = file.badge {
            self.badge_style = badge;
        }
        if let Some(memory) = file.memory {
            self.memory_usage = memory;
        }
        if let Some(silent) = file.init_silent {
            self.init_silent = silent;
        }

        if let Some(timestamp) = file.timestamp {
            if let Some(enabled) = timestamp.enabled {
                self.timestamp = enabled;
            }
            if let Some(mode) = timestamp.mode {
                self.timestamp_mode = mode;
            }
        }

        if let Some(caller) = file.caller {
            if let Some(enabled) = caller.enabled {
                self.caller_info = enabled;
            }
            if let Some(depth) = caller.depth {
                self.caller_depth = depth;
            }
        }

        if file.loki.is_some() {
            self.loki = file.loki;
        }
    }
}

/// Config file structure (TOML deserialization).
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    color: Option<String>,
    log_level: Option<LogLevel>,
    badge: Option<BadgeStyle>,
    memory: Option<bool>,
    init_silent: Option<bool>,
    timestamp: Option<TimestampSection>,
    caller: Option<CallerSection>,
    loki: Option<LokiConfig>,
}

#[derive(Debug, Deserialize)]
struct TimestampSection {
    enabled: Option<bool>,
    mode: Option<TimestampMode>,
}

#[derive(Debug, Deserialize)]
struct CallerSection {
    enabled: Option<bool>,
    depth: Option<usize>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, LoggifyError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggifyError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
