//! Persisted [`PronounSettings`].
//!
//! Settings live as pretty-printed JSON at `<config dir>/pronouns/settings.json`
//! unless `PRONOUNS_SETTINGS_PATH` points elsewhere. A missing file means
//! defaults; one that fails to parse is logged and replaced by defaults on next save.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dirs_next::config_dir;
use pronouns_types::PronounSettings;
use thiserror::Error;
use tracing::warn;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "PRONOUNS_SETTINGS_PATH";

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
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    payload: Mutex<PronounSettings>,
    persist_to_disk: bool,
}

impl SettingsStore {
    /// Open the store at the default location (honoring [`SETTINGS_PATH_ENV`]).
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_path(default_settings_path())
    }

    /// Open the store at an explicit path.
    pub fn with_path(path: PathBuf) -> Result<Self, SettingsError> {
        let payload = load_payload(&path)?;
        Ok(Self {
            path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PronounSettings::default()),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> PronounSettings {
        self.payload.lock().expect("settings lock poisoned").clone()
    }

    /// Mutate the settings in place and persist the result.
    pub fn update<F>(&self, apply: F) -> Result<PronounSettings, SettingsError>
    where
        F: FnOnce(&mut PronounSettings),
    {
        let mut payload = self.payload.lock().expect("settings lock poisoned");
        apply(&mut payload);
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(payload.clone())
    }

    fn save_locked(&self, payload: &PronounSettings) -> Result<(), SettingsError> {
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
        .join("pronouns")
        .join(SETTINGS_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PronounSettings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(PronounSettings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PronounSettings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}
