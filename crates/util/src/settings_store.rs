//! User settings persistence for the launcher core.
//!
//! Settings live in a small JSON file in the standard configuration directory
//! (`~/.config/runbar/settings.json` on most platforms). Missing or malformed
//! files fall back to [`Settings::default`]; callers receive cheap snapshots
//! that stay immutable for the duration of a build cycle.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use runbar_types::Settings;
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "RUNBAR_SETTINGS_PATH";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Error surfaced when reading or writing settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Thread-safe settings store backed by a JSON file.
#[derive(Debug, Default)]
pub struct UserSettings {
    path: PathBuf,
    payload: Mutex<Settings>,
    persist_to_disk: bool,
}

impl UserSettings {
    /// Load settings from the default location (honoring [`SETTINGS_PATH_ENV`]).
    pub fn new() -> Result<Self, SettingsError> {
        Self::at(default_settings_path())
    }

    /// Load settings from an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let resolved_path = path.into();
        let payload = load_payload(&resolved_path)?;
        Ok(Self {
            path: resolved_path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self::from_settings(Settings::default())
    }

    /// In-memory store seeded with the provided settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(settings),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        self.payload.lock().expect("settings lock poisoned").clone()
    }

    /// Apply `change` and persist the result.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings, SettingsError> {
        let mut payload = self.payload.lock().expect("settings lock poisoned");
        change(&mut payload);
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(payload.clone())
    }

    /// Flip incognito mode, returning the new value.
    pub fn toggle_incognito(&self) -> Result<bool, SettingsError> {
        let updated = self.update(|settings| settings.incognito_enabled = !settings.incognito_enabled)?;
        Ok(updated.incognito_enabled)
    }

    fn save_locked(&self, payload: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runbar")
        .join(SETTINGS_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<Settings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(Settings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}
