//! Runtime configuration, read from the environment after `.env` is loaded.

use std::path::PathBuf;

use crate::error::{Error, Result};

const TOKEN_VAR: &str = "TELOXIDE_TOKEN";
const DB_PATH_VAR: &str = "BITEBULBS_DB_PATH";
const DATA_DIR_VAR: &str = "BITEBULBS_DATA_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file holding per-chat dialogue state
    pub db_path: String,
    /// Directory for the leaderboard file
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // teloxide reads the token itself, we only make sure it is there
        match lookup(TOKEN_VAR) {
            Some(token) if !token.trim().is_empty() => {}
            _ => return Err(Error::Config(format!("{} is not set", TOKEN_VAR))),
        }

        let db_path = lookup(DB_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "db.sqlite".to_string());
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Ok(Self { db_path, data_dir })
    }
}
