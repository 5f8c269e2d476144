//! Tidydesk - desktop tidying and large-file hunting
//!
//! This crate provides the core of the Tidydesk tool: a background scanner
//! that finds the largest files below a directory while pruning excluded
//! directories, a desktop organizer with undo, and the file actions that go
//! with scan results.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_actions;
pub mod logging;
pub mod organizer;
pub mod scan;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use error::{DeleteError, OrganizeError, Result, RevealError, ScanError, TidyError};
pub use file_actions::{delete_file, reveal_in_file_manager, DeleteMode};
pub use organizer::{Category, DirectoryOrganizer, UndoEntry, UndoJournal};
pub use scan::{
    walk_largest, CancelFlag, FileCandidate, LargeFileScanner, ScanCompletion, ScanHandle,
    ScanRequest, ScanResult, ScanState, ScanStats,
};
