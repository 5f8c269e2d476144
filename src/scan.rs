//! Large-file scanning: request and result types, plus the walker, the top-K
//! accumulator and the asynchronous session that drives them.

pub mod session;
pub mod top_k;
pub mod walker;

use crate::error::ScanError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use session::{LargeFileScanner, ScanCompletion, ScanHandle, ScanId, ScanState};
pub use top_k::TopK;
pub use walker::walk_largest;

/// Parameters of one scan. Immutable once built.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    root: PathBuf,
    min_size_bytes: u64,
    excluded_names: BTreeSet<String>,
    top_k: usize,
    time_budget: Option<Duration>,
}

impl ScanRequest {
    /// Builds a request, rejecting `top_k == 0`.
    ///
    /// `excluded_names` are matched against a single path segment (a
    /// directory's base name), never against a full path.
    pub fn new<I, S>(
        root: impl Into<PathBuf>,
        min_size_bytes: u64,
        excluded_names: I,
        top_k: usize,
    ) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if top_k == 0 {
            return Err(ScanError::InvalidRequest(
                "top_k must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            root: root.into(),
            min_size_bytes,
            excluded_names: excluded_names.into_iter().map(Into::into).collect(),
            top_k,
            time_budget: None,
        })
    }

    /// Sets a wall-clock budget for the walk
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_bytes
    }

    pub fn excluded_names(&self) -> &BTreeSet<String> {
        &self.excluded_names
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Whether a directory with this base name must be pruned
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_names.contains(name)
    }
}

/// A file that passed the size threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCandidate {
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl FileCandidate {
    /// Size in mebibytes, rounded to two decimals
    pub fn size_mb(&self) -> f64 {
        (self.size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Counters collected during a walk. Skipped entries are tallied here instead
/// of being reported one by one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub dirs_visited: u64,
    pub dirs_pruned: u64,
    pub files_examined: u64,
    pub symlinks_skipped: u64,
    pub candidates_found: u64,
    pub skipped_permission_denied: u64,
    pub skipped_not_found: u64,
    pub skipped_special: u64,
    pub skipped_other: u64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl ScanStats {
    pub fn skipped_total(&self) -> u64 {
        self.skipped_permission_denied
            + self.skipped_not_found
            + self.skipped_special
            + self.skipped_other
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Ranked output of a finished scan, largest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub files: Vec<FileCandidate>,
    pub stats: ScanStats,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Cooperative cancellation flag shared between a handle and its walk
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
