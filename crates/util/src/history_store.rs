//! Run-history persistence for executed launcher commands.
//!
//! This module exposes an abstraction for storing and retrieving history
//! entries, along with a JSON-backed implementation (tilde expansion, config
//! directory fallback, environment override) and an in-memory variant for tests.
//!
//! Entries are kept oldest-first with at most one entry per
//! `(handler, value)` identity; recording an existing identity moves it to
//! the end.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use runbar_types::{CommandHandler, HistoryEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable controlling the history file location.
pub const HISTORY_PATH_ENV: &str = "RUNBAR_HISTORY_PATH";

/// Default filename for the persisted history store.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Maximum number of entries retained by the store.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Errors surfaced by history store operations.
#[derive(Debug, Error)]
pub enum HistoryStoreError {
    /// I/O failure while reading or writing the history file.
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryFile {
    #[serde(default)]
    command_history: Vec<HistoryEntry>,
}

impl HistoryFile {
    fn position_of(&self, handler: &CommandHandler, value: &str) -> Option<usize> {
        self.command_history
            .iter()
            .position(|entry| entry.handler == *handler && entry.value == value)
    }

    fn upsert(&mut self, entry: HistoryEntry, limit: usize) {
        if let Some(position) = self.position_of(&entry.handler, &entry.value) {
            self.command_history.remove(position);
        }
        self.command_history.push(entry);
        self.truncate(limit);
    }

    /// Drop the oldest entries until at most `limit` remain.
    fn truncate(&mut self, limit: usize) {
        let overflow = self.command_history.len().saturating_sub(limit);
        if overflow > 0 {
            self.command_history.drain(..overflow);
        }
    }

    fn remove(&mut self, handler: &CommandHandler, value: &str) -> bool {
        match self.position_of(handler, value) {
            Some(position) => {
                self.command_history.remove(position);
                true
            }
            None => false,
        }
    }

    fn remove_handler(&mut self, handler: &CommandHandler) -> usize {
        let before = self.command_history.len();
        self.command_history.retain(|entry| entry.handler != *handler);
        before - self.command_history.len()
    }
}

/// Shared trait implemented by history persistence backends.
pub trait HistoryStore: Send + Sync {
    /// All entries, oldest first.
    fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryStoreError>;

    /// Append an entry, replacing any existing entry with the same identity.
    fn record(&self, entry: HistoryEntry) -> Result<(), HistoryStoreError>;

    /// Remove the entry with the given identity. Returns whether one existed.
    fn remove(&self, handler: &CommandHandler, value: &str) -> Result<bool, HistoryStoreError>;

    /// Remove every entry using `handler`, returning how many were dropped.
    fn remove_handler(&self, handler: &CommandHandler) -> Result<usize, HistoryStoreError>;

    fn clear(&self) -> Result<(), HistoryStoreError>;
}

/// JSON-backed history store persisted on disk.
pub struct JsonHistoryStore {
    path: PathBuf,
    entries: Mutex<HistoryFile>,
    max_entries: usize,
}

impl JsonHistoryStore {
    /// Create a new store at the provided path (or the default path when omitted).
    pub fn new<P: Into<Option<PathBuf>>>(path: P, max_entries: usize) -> Result<Self, HistoryStoreError> {
        let resolved_path = match path.into() {
            Some(path) => expand_tilde(&path.to_string_lossy()),
            None => default_history_path(),
        };

        let file = load_history_file(&resolved_path)?;
        debug!(path = %resolved_path.display(), entries = file.command_history.len(), "loaded command history");
        Ok(Self {
            path: resolved_path,
            entries: Mutex::new(file),
            max_entries,
        })
    }

    /// Initialize a store using the default settings.
    pub fn with_defaults() -> Result<Self, HistoryStoreError> {
        Self::new(None::<PathBuf>, DEFAULT_HISTORY_LIMIT)
    }

    /// Access the underlying history path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_locked(&self, history_file: &HistoryFile) -> Result<(), HistoryStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(history_file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
        let entries = self.entries.lock().expect("history lock poisoned");
        Ok(entries.command_history.clone())
    }

    fn record(&self, entry: HistoryEntry) -> Result<(), HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        entries.upsert(entry, self.max_entries);
        self.save_locked(&entries)
    }

    fn remove(&self, handler: &CommandHandler, value: &str) -> Result<bool, HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        let removed = entries.remove(handler, value);
        if removed {
            self.save_locked(&entries)?;
        }
        Ok(removed)
    }

    fn remove_handler(&self, handler: &CommandHandler) -> Result<usize, HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        let removed = entries.remove_handler(handler);
        if removed > 0 {
            self.save_locked(&entries)?;
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        entries.command_history.clear();
        self.save_locked(&entries)
    }
}

/// In-memory history store primarily used for unit testing.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<HistoryFile>,
}

impl InMemoryHistoryStore {
    /// Create an empty in-memory history store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn entries(&self) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
        let entries = self.entries.lock().expect("history lock poisoned");
        Ok(entries.command_history.clone())
    }

    fn record(&self, entry: HistoryEntry) -> Result<(), HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        entries.upsert(entry, DEFAULT_HISTORY_LIMIT);
        Ok(())
    }

    fn remove(&self, handler: &CommandHandler, value: &str) -> Result<bool, HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        Ok(entries.remove(handler, value))
    }

    fn remove_handler(&self, handler: &CommandHandler) -> Result<usize, HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        Ok(entries.remove_handler(handler))
    }

    fn clear(&self) -> Result<(), HistoryStoreError> {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        entries.command_history.clear();
        Ok(())
    }
}

fn default_history_path() -> PathBuf {
    if let Ok(path) = env::var(HISTORY_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runbar")
        .join(HISTORY_FILE_NAME)
}

fn load_history_file(path: &Path) -> Result<HistoryFile, HistoryStoreError> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<HistoryFile>(&content) {
            Ok(file) => Ok(file),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Failed to parse history file; starting empty");
                Ok(HistoryFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(HistoryFile::default()),
        Err(error) => Err(HistoryStoreError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use runbar_types::{CommandHandler, ExecutableCommand};
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn entry(label: &str, value: &str, handler: CommandHandler) -> HistoryEntry {
        let command = ExecutableCommand::builder(label, value, handler).build().unwrap();
        HistoryEntry::from_command(&command, Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn in_memory_store_moves_rerun_entry_to_end() {
        let store = InMemoryHistoryStore::new();
        store.record(entry("Safari", "safari", CommandHandler::App)).unwrap();
        store.record(entry("Mail", "mail", CommandHandler::App)).unwrap();
        store.record(entry("Safari", "safari", CommandHandler::App)).unwrap();

        let values: Vec<String> = store.entries().unwrap().into_iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec!["mail", "safari"]);
    }

    #[test]
    fn identity_includes_handler() {
        let store = InMemoryHistoryStore::new();
        store.record(entry("x", "same", CommandHandler::Url)).unwrap();
        store.record(entry("x", "same", CommandHandler::CopyToClipboard)).unwrap();
        assert_eq!(store.entries().unwrap().len(), 2);

        assert!(store.remove(&CommandHandler::Url, "same").unwrap());
        let remaining = store.entries().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].handler, CommandHandler::CopyToClipboard);
    }

    #[test]
    fn json_store_persists_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonHistoryStore::new(Some(path.clone()), 10).unwrap();
        store.record(entry("Safari", "safari", CommandHandler::App)).unwrap();

        drop(store);
        let store_reloaded = JsonHistoryStore::new(Some(path), 10).unwrap();
        let entries = store_reloaded.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_label, "Safari");
    }

    #[test]
    fn json_store_truncates_oldest_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonHistoryStore::new(Some(path.clone()), 2).unwrap();

        for index in 0..3 {
            store
                .record(entry("site", &format!("https://{index}.example.com"), CommandHandler::Url))
                .unwrap();
        }

        drop(store);
        let store_reloaded = JsonHistoryStore::new(Some(path), 2).unwrap();
        let values: Vec<String> = store_reloaded.entries().unwrap().into_iter().map(|entry| entry.value).collect();
        assert_eq!(values, vec!["https://1.example.com", "https://2.example.com"]);
    }

    #[test]
    fn remove_handler_drops_matching_entries() {
        let store = InMemoryHistoryStore::new();
        store.record(entry("a", "a.md", CommandHandler::OpenNote)).unwrap();
        store.record(entry("b", "b", CommandHandler::App)).unwrap();
        store.record(entry("c", "c.md", CommandHandler::OpenNote)).unwrap();

        assert_eq!(store.remove_handler(&CommandHandler::OpenNote).unwrap(), 2);
        assert_eq!(store.entries().unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn default_path_honors_env_override() {
        let override_path = "~/custom/history.json";
        temp_env::with_var(HISTORY_PATH_ENV, Some(override_path), || {
            let path = default_history_path();
            assert_eq!(path, expand_tilde(override_path));
        });
    }

    #[test]
    fn invalid_json_returns_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonHistoryStore::new(Some(path), 10).unwrap();
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn concurrent_writes_keep_single_entry_per_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = Arc::new(JsonHistoryStore::new(Some(path), 10).unwrap());
        let mut handles = Vec::new();
        for _ in 0..5 {
            let handle_store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                handle_store.record(entry("Safari", "safari", CommandHandler::App)).unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.entries().unwrap().len(), 1);
    }
}
