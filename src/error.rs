//! Error types for `loggify`.
//!
//! Uses [`thiserror`] for ergonomic error derivation. The logging engine
//! itself never surfaces these to callers of [`Loggify::console`]; they
//! travel through config loading, the CLI, and the Loki client internals.
//!
//! [`Loggify::console`]: crate::Loggify::console

use thiserror::Error;

/// Errors that can occur in `loggify`.
///
/// In the binary, [`Config`](Self::Config) and [`Toml`](Self::Toml) map
/// to exit 1.
#[derive(Debug, Error)]
pub enum LoggifyError {
    /// Configuration error (invalid option value, unreadable config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// TOML deserialization error.
    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP transport error talking to the Loki server.
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}
