//! Error types for the trainer core.
//!
//! Almost everything in the core is total: toggles, checks and resets cannot
//! fail. The variants below cover user input that gets rejected and the
//! persistence layer, whose failures are logged and swallowed by callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input is not a 3- or 6-digit hex color
    #[error("invalid hex color: {0:?}")]
    InvalidHexColor(String),

    /// Input is not a `<channel> <value>` setting such as `R 200`
    #[error("invalid channel setting: {0:?}")]
    InvalidChannelSetting(String),

    /// Leaderboard submissions need a name
    #[error("a name is required to log a result")]
    EmptyName,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
