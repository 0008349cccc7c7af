//! Quiz results logged on this bot, newest first.
//!
//! Every chat keeps its own list, so one learner never sees or clears
//! another's entries. A list lives under one key as a JSON array. The
//! in-memory copy is authoritative: a failed write is logged and the list
//! keeps working.

pub mod export;
pub mod storage;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quiz::QuizResult;
use storage::KeyValueStore;

pub const LEADERBOARD_KEY: &str = "bitebulbs_leaderboard_v1";
pub const LEADERBOARD_CAPACITY: usize = 200;

/// Storage key of the list belonging to `scope` (a chat id).
pub fn scoped_key(scope: i64) -> String {
    format!("{}_{}", LEADERBOARD_KEY, scope)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub score: u32,
    pub total: u32,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "durationSec")]
    pub duration_secs: u64,
}

impl LeaderboardEntry {
    /// Builds an entry from a finished quiz. The name is required, a blank
    /// email is dropped.
    pub fn new(name: &str, email: Option<&str>, result: QuizResult, timestamp: i64) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            email,
            score: result.score,
            total: result.total,
            timestamp,
            duration_secs: result.duration_secs,
        })
    }
}

pub struct LeaderboardStore<S: KeyValueStore> {
    storage: S,
    key: String,
    entries: Vec<LeaderboardEntry>,
}

impl<S: KeyValueStore> LeaderboardStore<S> {
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            key: key.into(),
            entries: Vec::new(),
        };
        store.entries = store.load();
        log::info!(
            "Leaderboard {} loaded with {} entries",
            store.key,
            store.entries.len()
        );
        store
    }

    /// Reads the persisted list. Missing or malformed data reads as empty.
    pub fn load(&self) -> Vec<LeaderboardEntry> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                log::warn!("Could not read leaderboard: {}", err);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Ignoring malformed leaderboard data: {}", err);
                Vec::new()
            }
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn append(&mut self, entry: LeaderboardEntry) {
        log::info!(
            "Logging result for {}: {}/{}",
            entry.name,
            entry.score,
            entry.total
        );
        self.entries.insert(0, entry);
        self.entries.truncate(LEADERBOARD_CAPACITY);
        self.persist();
    }

    /// Empties the list and drops its stored copy. Asking the user first is
    /// up to the caller.
    pub fn clear(&mut self) {
        log::info!("Clearing leaderboard {} ({} entries)", self.key, self.entries.len());
        self.entries.clear();
        if let Err(err) = self.storage.remove(&self.key) {
            log::warn!("Could not remove leaderboard {}: {}", self.key, err);
        }
    }

    pub fn export_csv(&self) -> String {
        export::to_csv(&self.entries)
    }

    fn persist(&mut self) {
        let written = serde_json::to_string(&self.entries)
            .map_err(Error::from)
            .and_then(|json| self.storage.set(&self.key, &json));
        if let Err(err) = written {
            log::warn!("Could not save leaderboard {}: {}", self.key, err);
        }
    }
}

/// One [`LeaderboardStore`] per chat, opened on first use over a shared backend.
pub struct Leaderboards<S: KeyValueStore + Clone> {
    storage: S,
    stores: HashMap<i64, LeaderboardStore<S>>,
}

impl<S: KeyValueStore + Clone> Leaderboards<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            stores: HashMap::new(),
        }
    }

    pub fn for_scope(&mut self, scope: i64) -> &mut LeaderboardStore<S> {
        let storage = &self.storage;
        self.stores
            .entry(scope)
            .or_insert_with(|| LeaderboardStore::open(storage.clone(), scoped_key(scope)))
    }
}
