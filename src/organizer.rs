//! Desktop organizer: sorts loose files into category folders and can put
//! them back.

pub mod category;
pub mod journal;

pub use category::Category;
pub use journal::{UndoEntry, UndoJournal};

use crate::error::OrganizeError;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions left in place by default (desktop shortcuts)
pub const DEFAULT_SKIP_EXTENSIONS: &[&str] = &["lnk", "desktop"];

/// A move the organizer would perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub category: Category,
}

/// Moves files into per-category subfolders and keeps an undo history.
///
/// Only the latest organize run can be undone: each run starts a fresh
/// history. With a journal attached the history survives process restarts.
#[derive(Debug)]
pub struct DirectoryOrganizer {
    skip_extensions: Vec<String>,
    journal: Option<UndoJournal>,
    history: Vec<UndoEntry>,
}

impl Default for DirectoryOrganizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryOrganizer {
    /// Creates an organizer that keeps its history in memory only
    pub fn new() -> Self {
        Self {
            skip_extensions: DEFAULT_SKIP_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            journal: None,
            history: Vec::new(),
        }
    }

    /// Creates an organizer backed by a journal, loading any stored history
    pub fn with_journal(journal: UndoJournal) -> Result<Self, OrganizeError> {
        let history = journal.load()?;
        Ok(Self {
            journal: Some(journal),
            history,
            ..Self::new()
        })
    }

    /// Replaces the list of extensions that are never moved
    #[must_use]
    pub fn with_skip_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_extensions = extensions
            .into_iter()
            .map(|s| s.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn history(&self) -> &[UndoEntry] {
        &self.history
    }

    /// Lists the moves `organize` would perform, without touching anything.
    ///
    /// Only regular files directly inside `source_dir` are considered.
    /// Directories, symlinks, files without an extension and skipped
    /// extensions stay where they are.
    pub fn plan(&self, source_dir: &Path) -> Result<Vec<PlannedMove>, OrganizeError> {
        if !source_dir.is_dir() {
            return Err(OrganizeError::NotADirectory(source_dir.to_path_buf()));
        }

        let entries = fs::read_dir(source_dir).map_err(|source| OrganizeError::ReadDir {
            path: source_dir.to_path_buf(),
            source,
        })?;

        let mut planned = Vec::new();

        for entry_result in entries {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };

            match entry.file_type() {
                Ok(ft) if ft.is_file() => {}
                _ => continue,
            }

            let path = entry.path();
            let ext = match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if !ext.is_empty() => ext.to_lowercase(),
                _ => continue,
            };

            if self.skip_extensions.contains(&ext) {
                continue;
            }

            planned.push(PlannedMove {
                category: Category::from_extension(&ext),
                source: path,
            });
        }

        planned.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(planned)
    }

    /// Moves every eligible file of `source_dir` into its category folder.
    ///
    /// Returns how many files were moved. A file that cannot be moved is
    /// logged and left in place.
    pub fn organize(&mut self, source_dir: &Path) -> Result<usize, OrganizeError> {
        let planned = self.plan(source_dir)?;

        if !self.history.is_empty() {
            debug!(
                entries = self.history.len(),
                "discarding history of previous run"
            );
        }
        self.history.clear();

        for item in planned {
            let dest_dir = source_dir.join(item.category.folder_name());
            if let Err(e) = fs::create_dir_all(&dest_dir) {
                warn!(dir = %dest_dir.display(), error = %e, "cannot create category folder");
                continue;
            }

            let file_name = match item.source.file_name() {
                Some(name) => name.to_os_string(),
                None => continue,
            };
            let destination = unique_destination(&dest_dir, Path::new(&file_name));

            if let Err(e) = fs::rename(&item.source, &destination) {
                warn!(file = %item.source.display(), error = %e, "failed to move file");
                continue;
            }

            debug!(
                from = %item.source.display(),
                to = %destination.display(),
                "moved"
            );
            self.history.push(UndoEntry {
                original: item.source,
                destination,
                moved_at: Utc::now(),
            });
        }

        self.persist()?;

        let moved = self.history.len();
        info!(dir = %source_dir.display(), moved, "organize finished");
        Ok(moved)
    }

    /// Reverts the latest organize run, newest move first.
    ///
    /// Returns how many files were restored. Entries whose file has vanished,
    /// or whose original location is occupied again, are skipped.
    pub fn undo(&mut self) -> Result<usize, OrganizeError> {
        let mut restored = 0;

        for entry in self.history.iter().rev() {
            if !entry.destination.exists() {
                warn!(file = %entry.destination.display(), "moved file no longer exists");
                continue;
            }
            if entry.original.exists() {
                warn!(file = %entry.original.display(), "original location is occupied");
                continue;
            }
            if let Some(parent) = entry.original.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!(dir = %parent.display(), error = %e, "cannot recreate folder");
                    continue;
                }
            }

            match fs::rename(&entry.destination, &entry.original) {
                Ok(()) => restored += 1,
                Err(e) => {
                    warn!(file = %entry.destination.display(), error = %e, "failed to restore file")
                }
            }
        }

        self.history.clear();
        self.persist()?;

        info!(restored, "undo finished");
        Ok(restored)
    }

    fn persist(&self) -> Result<(), OrganizeError> {
        match &self.journal {
            Some(journal) => journal.save(&self.history),
            None => Ok(()),
        }
    }
}

/// Picks a free path for `file_name` inside `dir`, appending ` (n)` to the
/// stem when the name is taken.
pub fn unique_destination(dir: &Path, file_name: &Path) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{} ({}){}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
