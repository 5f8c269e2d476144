//! User configuration and preferences

use crate::error::{Result, TidyError};
use crate::organizer::DEFAULT_SKIP_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 100 MiB, the threshold the scan uses unless told otherwise
pub const DEFAULT_MIN_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_TOP_K: usize = 25;

/// Directory names that are never descended into by default
pub fn default_excluded_names() -> Vec<String> {
    let mut names = vec!["Windows", "ProgramData", "AppData"];
    if cfg!(unix) {
        names.extend(["proc", "sys", "dev", "run"]);
    }
    names.into_iter().map(String::from).collect()
}

pub fn default_scan_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDefaults {
    pub root: PathBuf,
    pub min_size_bytes: u64,
    pub top_k: usize,
    pub excluded_names: Vec<String>,
    /// Wall-clock budget in seconds (None = unlimited)
    pub time_budget_secs: Option<u64>,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            root: default_scan_root(),
            min_size_bytes: DEFAULT_MIN_SIZE,
            top_k: DEFAULT_TOP_K,
            excluded_names: default_excluded_names(),
            time_budget_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerDefaults {
    /// Directory to organize (None = the user's desktop)
    pub source_dir: Option<PathBuf>,
    pub skip_extensions: Vec<String>,
    /// Undo journal location (None = platform data dir)
    pub journal_path: Option<PathBuf>,
}

impl Default for OrganizerDefaults {
    fn default() -> Self {
        Self {
            source_dir: None,
            skip_extensions: DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            journal_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub scan: ScanDefaults,
    pub organizer: OrganizerDefaults,
    /// Send deletions to the trash instead of removing them for good
    pub delete_to_trash: bool,
}

impl UserConfig {
    /// Get the config file path (~/.config/tidydesk/config.json)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tidydesk").join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or_else(|| {
            TidyError::ConfigError("Could not determine config directory".to_string())
        })?;
        Self::load_from(&path)
    }

    /// Load config from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            TidyError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        serde_json::from_str(&contents)
            .map_err(|e| TidyError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    /// Save config to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TidyError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            TidyError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            TidyError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Directory the organizer works on
    pub fn organizer_source(&self) -> Option<PathBuf> {
        self.organizer
            .source_dir
            .clone()
            .or_else(dirs::desktop_dir)
    }
}
