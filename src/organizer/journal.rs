//! On-disk undo journal for the organizer

use crate::error::OrganizeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const JOURNAL_VERSION: u32 = 1;

/// One move performed by the organizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub original: PathBuf,
    pub destination: PathBuf,
    pub moved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    version: u32,
    entries: Vec<UndoEntry>,
}

/// JSON file holding the history of the latest organize run
#[derive(Debug, Clone)]
pub struct UndoJournal {
    path: PathBuf,
}

impl UndoJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default journal location (~/.local/share/tidydesk/undo.json on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("tidydesk").join("undo.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored history. A missing journal is an empty history.
    pub fn load(&self) -> Result<Vec<UndoEntry>, OrganizeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| OrganizeError::Journal(format!("Failed to read journal: {}", e)))?;

        let file: JournalFile = serde_json::from_str(&contents)
            .map_err(|e| OrganizeError::Journal(format!("Failed to parse journal: {}", e)))?;

        if file.version != JOURNAL_VERSION {
            return Err(OrganizeError::Journal(format!(
                "Unsupported journal version {}",
                file.version
            )));
        }

        Ok(file.entries)
    }

    pub fn save(&self, entries: &[UndoEntry]) -> Result<(), OrganizeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                OrganizeError::Journal(format!("Failed to create journal directory: {}", e))
            })?;
        }

        let file = JournalFile {
            version: JOURNAL_VERSION,
            entries: entries.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| OrganizeError::Journal(format!("Failed to serialize journal: {}", e)))?;

        fs::write(&self.path, contents)
            .map_err(|e| OrganizeError::Journal(format!("Failed to write journal: {}", e)))
    }
}
