//! Persisted input-line history.
//!
//! A bounded, deduplicated, most-recent-first ring of previously submitted
//! lines. The backing store is a minimal key-value abstraction so the ring
//! works the same over a JSON file on disk or an in-memory map in tests.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

const HISTORY_KEY: &str = "command_history";
const MAX_HISTORY: usize = 100;

/// Minimal storage backend: string keys, string values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One file per key under the platform data directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nullchat");
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;
        let path = self.path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// The history ring itself. Read once at construction, written on every push.
pub struct CommandHistory<S: KeyValueStore> {
    store: S,
    entries: Vec<String>,
}

impl<S: KeyValueStore> CommandHistory<S> {
    pub fn load(store: S) -> Self {
        let entries = store
            .get(HISTORY_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default();
        Self { store, entries }
    }

    /// Record a submitted line. Blank or single-character lines are ignored.
    /// A line equal to an existing entry moves to the front instead of
    /// duplicating; the ring is then truncated to its maximum size.
    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() || line.chars().count() < 2 {
            return;
        }
        self.entries.retain(|e| e != line);
        self.entries.insert(0, line.to_string());
        self.entries.truncate(MAX_HISTORY);
        self.persist();
    }

    /// All entries, most recent first. Recall walks this by index.
    pub fn all(&self) -> &[String] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("Failed to clear command history: {e:#}");
        }
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => {
                if let Err(e) = self.store.set(HISTORY_KEY, &raw) {
                    warn!("Failed to persist command history: {e:#}");
                }
            }
            Err(e) => warn!("Failed to encode command history: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> CommandHistory<MemoryStore> {
        CommandHistory::load(MemoryStore::default())
    }

    #[test]
    fn most_recent_first() {
        let mut h = ring();
        h.push("first");
        h.push("second");
        assert_eq!(h.all(), ["second", "first"]);
    }

    #[test]
    fn blank_and_short_lines_ignored() {
        let mut h = ring();
        h.push("");
        h.push("   ");
        h.push("x");
        assert!(h.is_empty());
    }

    #[test]
    fn duplicate_moves_to_front_without_growing() {
        let mut h = ring();
        h.push("alpha");
        h.push("beta");
        h.push("alpha");
        assert_eq!(h.all(), ["alpha", "beta"]);
    }

    #[test]
    fn capped_at_one_hundred() {
        let mut h = ring();
        for i in 0..101 {
            h.push(&format!("line {i}"));
        }
        assert_eq!(h.len(), 100);
        assert_eq!(h.entry(0), Some("line 100"));
        // The oldest push fell off.
        assert!(!h.all().iter().any(|e| e == "line 0"));
    }

    #[test]
    fn survives_reload_through_store() {
        let mut store = MemoryStore::default();
        {
            let mut h = CommandHistory::load(MemoryStore::default());
            h.push("kept");
            // Copy what the first ring persisted into the shared store.
            store
                .set(HISTORY_KEY, &serde_json::to_string(h.all()).unwrap())
                .unwrap();
        }
        let h = CommandHistory::load(store);
        assert_eq!(h.all(), ["kept"]);
    }

    #[test]
    fn corrupt_persisted_history_loads_empty() {
        let mut store = MemoryStore::default();
        store.set(HISTORY_KEY, "not json").unwrap();
        let h = CommandHistory::load(store);
        assert!(h.is_empty());
    }
}
