//! `loggify`: styled console logging with deferred context buffers and
//! Grafana Loki mirroring.
//!
//! A [`Loggify`] instance turns a message, a semantic [`LogType`], optional
//! structured data, and per-call [`LogOptions`] into one styled line:
//!
//! ```text
//! ℹ️  ~14:02:11.348~ [3.12MB of 9.50MB|14.21MB] main.rs:42(Func:app::run) Import started
//! ```
//!
//! Messages may embed `[ansi:NAME]` and `[emoji:NAME]` tokens. Lines logged
//! with a context id are buffered and written as one framed block on
//! [`Loggify::flush`]. When a Loki server is configured every line is also
//! pushed to it in the background.
//!
//! # Example
//!
//! ```
//! use loggify::{Config, LogOptions, Loggify};
//! use loggify::cli::ColorMode;
//!
//! let config = Config {
//!     color_mode: ColorMode::Never,
//!     init_silent: true,
//!     ..Config::default()
//! };
//! let mut log = Loggify::with_writer(config, std::io::sink());
//!
//! assert!(log.console("[emoji:rocket] deployed", "success", &LogOptions::default(), None));
//! ```

pub mod assets;
pub mod caller;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod formatter;
pub mod host;
pub mod level;
pub mod logger;
pub mod loki;
pub mod memory;
pub mod object;
pub mod style;
pub mod timestamp;

// Re-export primary API types for convenience.
pub use config::Config;
pub use context::{ContextId, ContextMode, generate_context_id};
pub use error::LoggifyError;
pub use level::{BadgeStyle, LogLevel, LogType};
pub use logger::{CallerOptions, ContextOptions, LogOptions, Loggify, LokiOptions, Message, Metrics};
pub use loki::{Auth, ConnectionStatus, Labels, LokiClient, LokiConfig, PushEntry};
pub use style::{pad_ansi_safe, strip_style_codes, substitute_glyph_tokens, substitute_style_tokens};
pub use timestamp::{TimestampMode, format_duration};
