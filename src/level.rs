//! Log levels, badge styles, and the log-type attribute table.
//!
//! [`LogLevel`] is the verbosity gate (`off`, `minimal`, `full`).
//! [`LogType`] is the semantic tag of a single call (`info`, `error`, …);
//! each known tag maps to a badge word and a color, unknown tags fall back
//! to a blank badge.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::LoggifyError;

/// Global verbosity gate.
///
/// A call carries an optional override; see [`LogLevel::admits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only calls that explicitly override to `off` pass (errors, banners).
    Off,
    /// Calls overriding to `off` or `minimal` pass.
    Minimal,
    /// Everything passes.
    #[default]
    Full,
}

impl LogLevel {
    /// Whether a call with the given per-call override is admitted under
    /// this global level.
    pub fn admits(self, call_override: Option<Self>) -> bool {
        match self {
            Self::Full => true,
            Self::Minimal => matches!(call_override, Some(Self::Off | Self::Minimal)),
            Self::Off => call_override == Some(Self::Off),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "minimal" => Ok(Self::Minimal),
            "full" => Ok(Self::Full),
            _ => Err(LoggifyError::Config(format!(
                "invalid log level '{s}': expected one of off, minimal, full"
            ))),
        }
    }
}

/// How the type badge at the start of each line is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    Off,
    #[default]
    Emoji,
    Tiny,
    Mini,
    Full,
}

impl BadgeStyle {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Emoji => "emoji",
            Self::Tiny => "tiny",
            Self::Mini => "mini",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for BadgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeStyle {
    type Err = LoggifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "emoji" => Ok(Self::Emoji),
            "tiny" => Ok(Self::Tiny),
            "mini" => Ok(Self::Mini),
            "full" => Ok(Self::Full),
            _ => Err(LoggifyError::Config(format!(
                "invalid badge style '{s}': expected one of off, emoji, tiny, mini, full"
            ))),
        }
    }
}

/// Semantic tag of a log call.
///
/// The known tags form a closed set with fixed badge attributes. Anything
/// else is kept verbatim in [`Other`](Self::Other) (it may still name an
/// emoji, e.g. `rocket`) or, when written as `custom=<tokens><label>`, in
/// [`Custom`](Self::Custom).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LogType {
    #[default]
    None,
    Okay,
    Success,
    Info,
    Debug,
    Warn,
    Warning,
    Error,
    Create,
    Add,
    Remove,
    Metrics,
    Init,
    Finished,
    /// Caller-styled badge, the text after `custom=`.
    Custom(String),
    /// Any other tag name.
    Other(String),
}

/// Badge attributes of a known tag: the `[ansi:…]` color name and the word
/// used by the `full` badge style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeSpec {
    pub color: &'static str,
    pub word: &'static str,
}

impl LogType {
    /// Parse a tag name. Never fails: unknown names become [`Other`](Self::Other).
    pub fn parse(name: &str) -> Self {
        match name {
            "" | "none" => Self::None,
            "okay" => Self::Okay,
            "success" => Self::Success,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "warning" => Self::Warning,
            "error" => Self::Error,
            "create" => Self::Create,
            "add" => Self::Add,
            "remove" => Self::Remove,
            "metrics" => Self::Metrics,
            "init" => Self::Init,
            "finished" => Self::Finished,
            other => match other.strip_prefix("custom=") {
                Some(badge) => Self::Custom(badge.to_string()),
                None => Self::Other(other.to_string()),
            },
        }
    }

    /// The tag name as written by callers; also the emoji lookup key and the
    /// Loki `level` label.
    pub fn name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Okay => "okay",
            Self::Success => "success",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warn => "warn",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Create => "create",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Metrics => "metrics",
            Self::Init => "init",
            Self::Finished => "finished",
            Self::Custom(_) => "custom",
            Self::Other(name) => name,
        }
    }

    /// Badge attributes, or `None` for tags without a fixed badge.
    pub fn badge(&self) -> Option<BadgeSpec> {
        let (color, word) = match self {
            Self::Okay => ("green", "OKAY"),
            Self::Success => ("green", "SUCCESS"),
            Self::Info => ("cyan", "INFO"),
            Self::Debug => ("blue", "DEBUG"),
            Self::Warn | Self::Warning => ("yellow", "WARNING"),
            Self::Error => ("red", "ERROR"),
            Self::Create => ("green", "CREATE"),
            Self::Add => ("green", "Add"),
            Self::Remove => ("brightRed", "REMOVE"),
            Self::Metrics => ("brightMagenta", "METRICS"),
            Self::Init => ("orange", "INIT"),
            Self::Finished => ("gray", "FINISHED"),
            Self::None | Self::Custom(_) | Self::Other(_) => return None,
        };
        Some(BadgeSpec { color, word })
    }
}

impl From<&str> for LogType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for LogType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(badge) => write!(f, "custom={badge}"),
            other => f.write_str(other.name()),
        }
    }
}
