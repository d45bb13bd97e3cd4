//! User settings, stored as `settings.json` in the data directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::LanguagePair;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LINGO_DATA_DIR";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_known_language")]
    pub known_language: String,
    #[serde(default = "default_learning_language")]
    pub learning_language: String,
    /// Show the learning side first during study
    #[serde(default)]
    pub show_learning_first: bool,
    /// Delay before a card restored by undo loses its restoring flag
    #[serde(default = "default_restore_delay_ms")]
    pub restore_delay_ms: u64,
}

fn default_known_language() -> String {
    "English".to_string()
}

fn default_learning_language() -> String {
    "Ukrainian".to_string()
}

fn default_restore_delay_ms() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            known_language: default_known_language(),
            learning_language: default_learning_language(),
            show_learning_first: false,
            restore_delay_ms: default_restore_delay_ms(),
        }
    }
}

impl Settings {
    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(self.known_language.clone(), self.learning_language.clone())
    }
}

/// Resolve the data directory: explicit path, then `LINGO_DATA_DIR`, then the platform default
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::data_local_dir()
        .map(|p| p.join("lingo"))
        .ok_or(SettingsError::DataDirNotFound)
}

/// Loads and saves [`Settings`]
pub struct SettingsStorage {
    path: PathBuf,
}

impl SettingsStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SETTINGS_FILE),
        }
    }

    /// Load settings, falling back to defaults when the file does not exist yet
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        log::debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}
