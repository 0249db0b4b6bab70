use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;

pub const CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "datetime")]
    pub date: String,
    pub score: u32,
}

impl ScoreRecord {
    pub fn new(date: impl Into<String>, score: u32) -> Self {
        Self {
            date: date.into(),
            score,
        }
    }

    /// Record dated today, e.g. "Mon Oct 19 2026".
    pub fn today(score: u32) -> Self {
        Self::new(chrono::Local::now().format("%a %b %d %Y").to_string(), score)
    }
}

/// Up to [`CAPACITY`] records, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    records: Vec<ScoreRecord>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert `rec`, keeping descending order and the capacity.
    ///
    /// A new score goes ahead of existing records with an equal score.
    /// Returns `false` when the list is left untouched (a zero score, or a
    /// score too low for a full board).
    pub fn insert(&mut self, rec: ScoreRecord) -> bool {
        if rec.score == 0 {
            return false;
        }
        match self.records.iter().position(|r| r.score <= rec.score) {
            Some(i) => self.records.insert(i, rec),
            None if self.records.len() < CAPACITY => self.records.push(rec),
            None => return false,
        }
        self.records.truncate(CAPACITY);
        true
    }
}

/// Mapping from a session key to its leaderboard.
pub trait ScoreStore {
    /// Current list for `key`; unreadable or absent data reads as empty.
    fn load(&self, key: &str) -> Leaderboard;

    /// Persist `rec` under `key`. Returns whether the list changed.
    fn save(&mut self, key: &str, rec: ScoreRecord) -> Result<bool, StoreError>;
}

/// Keeps everything in memory; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    boards: BTreeMap<String, Leaderboard>,
}

impl ScoreStore for MemoryStore {
    fn load(&self, key: &str) -> Leaderboard {
        self.boards.get(key).cloned().unwrap_or_default()
    }

    fn save(&mut self, key: &str, rec: ScoreRecord) -> Result<bool, StoreError> {
        Ok(self.boards.entry(key.to_owned()).or_default().insert(rec))
    }
}

/// JSON object file: `{ "<key>": [{"datetime": .., "score": ..}, ..] }`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, Leaderboard> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read score store");
                return BTreeMap::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(all) => all,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "score store is corrupt, ignoring it");
                BTreeMap::new()
            }
        }
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self, key: &str) -> Leaderboard {
        self.read_all().remove(key).unwrap_or_default()
    }

    fn save(&mut self, key: &str, rec: ScoreRecord) -> Result<bool, StoreError> {
        if rec.score == 0 {
            return Ok(false);
        }
        let mut all = self.read_all();
        let changed = all.entry(key.to_owned()).or_default().insert(rec);
        if changed {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        }
        Ok(changed)
    }
}
