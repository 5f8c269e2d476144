use super::{CancelFlag, FileCandidate, ScanRequest, ScanResult, ScanStats, TopK};
use crate::error::ScanError;
use std::fs::{self, DirEntry, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, trace};

/// Why a single entry was left out of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PermissionDenied,
    /// Disappeared between listing and stat
    NotFound,
    /// FIFO, socket, device or anything else that is not a regular file
    SpecialFile,
    Other,
}

impl SkipReason {
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => SkipReason::PermissionDenied,
            io::ErrorKind::NotFound => SkipReason::NotFound,
            _ => SkipReason::Other,
        }
    }
}

fn record_skip(stats: &mut ScanStats, reason: SkipReason, path: Option<&Path>) {
    match reason {
        SkipReason::PermissionDenied => stats.skipped_permission_denied += 1,
        SkipReason::NotFound => stats.skipped_not_found += 1,
        SkipReason::SpecialFile => stats.skipped_special += 1,
        SkipReason::Other => stats.skipped_other += 1,
    }
    trace!(path = ?path, ?reason, "skipping entry");
}

/// Resolves the scan root to an absolute directory
fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let unavailable = |source: io::Error| ScanError::RootUnavailable {
        path: root.to_path_buf(),
        source,
    };

    let resolved = fs::canonicalize(root).map_err(unavailable)?;
    let metadata = fs::metadata(&resolved).map_err(unavailable)?;
    if !metadata.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    Ok(resolved)
}

fn check_interrupt(cancel: &CancelFlag, deadline: Option<Instant>) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        return Err(ScanError::Cancelled);
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(ScanError::TimedOut);
    }
    Ok(())
}

/// Walks `request.root()` and returns its largest files.
///
/// Blocking; run it off the foreground thread. Each directory's children are
/// checked by name as the directory is listed, and an excluded child is
/// dropped before it is ever opened, so nothing inside it is listed or
/// stat'ed. Symlinks are neither followed nor sized. Errors on individual
/// entries are tallied in [`ScanStats`] and the walk carries on; only an
/// unusable root, cancellation or an exhausted time budget end it early.
pub fn walk_largest(request: &ScanRequest, cancel: &CancelFlag) -> Result<ScanResult, ScanError> {
    walk_with(request, cancel, |dir| fs::read_dir(dir))
}

/// Depth-first walk over an explicit stack of directories still to list.
///
/// `open_dir` is the only place a directory gets opened.
fn walk_with<F>(
    request: &ScanRequest,
    cancel: &CancelFlag,
    mut open_dir: F,
) -> Result<ScanResult, ScanError>
where
    F: FnMut(&Path) -> io::Result<ReadDir>,
{
    let started = Instant::now();
    let deadline = request.time_budget().map(|budget| started + budget);

    let root = resolve_root(request.root())?;
    let root_listing = open_dir(&root).map_err(|source| ScanError::RootUnavailable {
        path: request.root().to_path_buf(),
        source,
    })?;
    debug!(
        root = %root.display(),
        min_size = request.min_size_bytes(),
        top_k = request.top_k(),
        excluded = ?request.excluded_names(),
        "walk started"
    );

    let mut stats = ScanStats {
        dirs_visited: 1,
        ..ScanStats::default()
    };
    let mut top = TopK::new(request.top_k());
    let mut pending: Vec<PathBuf> = Vec::new();
    let mut current: Option<ReadDir> = Some(root_listing);

    loop {
        check_interrupt(cancel, deadline)?;

        if current.is_none() {
            let Some(dir) = pending.pop() else {
                break;
            };
            match open_dir(&dir) {
                Ok(listing) => {
                    stats.dirs_visited += 1;
                    current = Some(listing);
                }
                Err(err) => record_skip(&mut stats, SkipReason::from_io(&err), Some(&dir)),
            }
            continue;
        }

        let entry = match current.as_mut().and_then(|listing| listing.next()) {
            None => {
                current = None;
                continue;
            }
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                record_skip(&mut stats, SkipReason::from_io(&err), None);
                continue;
            }
        };

        visit_entry(entry, request, &mut stats, &mut top, &mut pending);
    }

    stats.elapsed = started.elapsed();

    let files: Vec<FileCandidate> = top.into_sorted_vec();
    debug!(
        files = files.len(),
        examined = stats.files_examined,
        skipped = stats.skipped_total(),
        "walk finished"
    );

    Ok(ScanResult { files, stats })
}

/// Handles one listed child: queue it, prune it, skip it or size it
fn visit_entry(
    entry: DirEntry,
    request: &ScanRequest,
    stats: &mut ScanStats,
    top: &mut TopK,
    pending: &mut Vec<PathBuf>,
) {
    let file_type = match entry.file_type() {
        Ok(ft) => ft,
        Err(err) => {
            record_skip(stats, SkipReason::from_io(&err), Some(entry.path().as_path()));
            return;
        }
    };

    if file_type.is_dir() {
        let excluded = entry
            .file_name()
            .to_str()
            .is_some_and(|name| request.is_excluded(name));
        if excluded {
            stats.dirs_pruned += 1;
            trace!(path = %entry.path().display(), "pruned excluded directory");
        } else {
            pending.push(entry.path());
        }
        return;
    }
    if file_type.is_symlink() {
        stats.symlinks_skipped += 1;
        return;
    }

    stats.files_examined += 1;

    // Not a symlink, so this is the entry's own metadata
    let metadata = match entry.metadata() {
        Ok(m) => m,
        Err(err) => {
            record_skip(stats, SkipReason::from_io(&err), Some(entry.path().as_path()));
            return;
        }
    };

    if !metadata.is_file() {
        record_skip(stats, SkipReason::SpecialFile, Some(entry.path().as_path()));
        return;
    }

    let size = metadata.len();
    if size > request.min_size_bytes() {
        stats.candidates_found += 1;
        top.offer(size, entry.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    const MB: u64 = 1024 * 1024;

    /// Creates a sparse file of the given logical size
    fn sparse(path: &Path, size: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().set_len(size).unwrap();
    }

    fn request(root: &Path, min: u64, excluded: &[&str], top_k: usize) -> ScanRequest {
        ScanRequest::new(root, min, excluded.iter().copied(), top_k).unwrap()
    }

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .files
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    mod ranking_tests {
        use super::*;

        #[test]
        fn test_threshold_and_top_k_scenario() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("a.bin"), 50 * MB);
            sparse(&dir.path().join("b.bin"), 150 * MB);
            sparse(&dir.path().join("nested/c.bin"), 300 * MB);
            sparse(&dir.path().join("nested/deeper/d.bin"), 120 * MB);

            let result =
                walk_largest(&request(dir.path(), 100 * MB, &[], 2), &CancelFlag::new()).unwrap();

            assert_eq!(file_names(&result), vec!["c.bin", "b.bin"]);
            assert_eq!(result.files[0].size_bytes, 300 * MB);
            assert_eq!(result.files[1].size_bytes, 150 * MB);
            assert_eq!(result.stats.candidates_found, 3);
            assert_eq!(result.stats.files_examined, 4);
        }

        #[test]
        fn test_length_is_min_of_k_and_qualifying() {
            let dir = TempDir::new().unwrap();
            for i in 0..4u64 {
                sparse(&dir.path().join(format!("f{}.bin", i)), (i + 1) * 1000);
            }

            let few = walk_largest(&request(dir.path(), 0, &[], 10), &CancelFlag::new()).unwrap();
            assert_eq!(few.len(), 4);

            let capped = walk_largest(&request(dir.path(), 0, &[], 3), &CancelFlag::new()).unwrap();
            assert_eq!(capped.len(), 3);
        }

        #[test]
        fn test_results_sorted_descending() {
            let dir = TempDir::new().unwrap();
            for (i, size) in [7u64, 3, 9, 1, 5, 8, 2].iter().enumerate() {
                sparse(&dir.path().join(format!("d{}/f{}.bin", i % 3, i)), size * 1000);
            }

            let result = walk_largest(&request(dir.path(), 0, &[], 5), &CancelFlag::new()).unwrap();

            assert_eq!(result.len(), 5);
            assert!(result
                .files
                .windows(2)
                .all(|w| w[0].size_bytes >= w[1].size_bytes));
            assert_eq!(result.files[0].size_bytes, 9000);
        }

        #[test]
        fn test_threshold_is_strict() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("exact.bin"), 1000);
            sparse(&dir.path().join("over.bin"), 1001);

            let result = walk_largest(&request(dir.path(), 1000, &[], 5), &CancelFlag::new()).unwrap();
            assert_eq!(file_names(&result), vec!["over.bin"]);
        }

        #[test]
        fn test_empty_files_never_qualify() {
            let dir = TempDir::new().unwrap();
            File::create(dir.path().join("empty")).unwrap();

            let result = walk_largest(&request(dir.path(), 0, &[], 5), &CancelFlag::new()).unwrap();
            assert!(result.is_empty());
            assert_eq!(result.stats.files_examined, 1);
        }

        #[test]
        fn test_paths_are_absolute() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("x/y.bin"), 10);

            let result = walk_largest(&request(dir.path(), 0, &[], 1), &CancelFlag::new()).unwrap();
            assert!(result.files[0].path.is_absolute());
            assert!(result.files[0].path.exists());
        }
    }

    mod exclusion_tests {
        use super::*;

        #[test]
        fn test_excluded_directory_hides_largest_file() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("AppData/huge.bin"), 500 * MB);
            sparse(&dir.path().join("Videos/movie.bin"), 200 * MB);

            let result = walk_largest(
                &request(dir.path(), 100 * MB, &["AppData"], 5),
                &CancelFlag::new(),
            )
            .unwrap();

            assert_eq!(file_names(&result), vec!["movie.bin"]);
            assert_eq!(result.stats.dirs_pruned, 1);
        }

        #[test]
        fn test_excluded_name_matches_at_any_depth() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("users/alice/AppData/Local/cache.bin"), 900);
            sparse(&dir.path().join("users/alice/Documents/report.bin"), 300);
            sparse(&dir.path().join("Windows/System32/kernel.bin"), 800);

            let result = walk_largest(
                &request(dir.path(), 0, &["AppData", "Windows"], 10),
                &CancelFlag::new(),
            )
            .unwrap();

            assert_eq!(file_names(&result), vec!["report.bin"]);
            assert_eq!(result.stats.dirs_pruned, 2);
            // Nothing below the pruned directories is even counted.
            assert_eq!(result.stats.files_examined, 1);
        }

        #[test]
        fn test_exclusion_applies_to_directories_only() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("AppData"), 400);

            let result =
                walk_largest(&request(dir.path(), 0, &["AppData"], 5), &CancelFlag::new()).unwrap();
            assert_eq!(file_names(&result), vec!["AppData"]);
        }

        #[test]
        fn test_root_is_never_pruned_by_name() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().join("AppData");
            sparse(&root.join("inside.bin"), 10);

            let result = walk_largest(&request(&root, 0, &["AppData"], 5), &CancelFlag::new()).unwrap();
            assert_eq!(file_names(&result), vec!["inside.bin"]);
        }

        #[test]
        fn test_excluded_directory_is_never_opened() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("AppData/Local/cache.bin"), 900);
            sparse(&dir.path().join("docs/AppData/nested.bin"), 700);
            sparse(&dir.path().join("ok.bin"), 10);

            let mut opened = Vec::new();
            let result = walk_with(
                &request(dir.path(), 0, &["AppData"], 5),
                &CancelFlag::new(),
                |path| {
                    opened.push(path.to_path_buf());
                    fs::read_dir(path)
                },
            )
            .unwrap();

            assert_eq!(file_names(&result), vec!["ok.bin"]);
            assert_eq!(result.stats.dirs_pruned, 2);
            // Only the root and `docs` were listed.
            assert_eq!(opened.len(), 2);
            assert!(opened
                .iter()
                .all(|p| !p.components().any(|c| c.as_os_str() == "AppData")));
        }

        #[test]
        fn test_exclusion_is_case_sensitive() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("appdata/file.bin"), 10);

            let result =
                walk_largest(&request(dir.path(), 0, &["AppData"], 5), &CancelFlag::new()).unwrap();
            assert_eq!(result.len(), 1);
        }
    }

    #[cfg(unix)]
    mod special_entry_tests {
        use super::*;
        use std::os::unix::fs::{symlink, PermissionsExt};
        use std::os::unix::net::UnixListener;

        #[test]
        fn test_symlinks_are_never_reported() {
            let dir = TempDir::new().unwrap();
            let real = dir.path().join("real.bin");
            sparse(&real, 5000);
            sparse(&dir.path().join("target_dir/inner.bin"), 4000);
            symlink(&real, dir.path().join("link.bin")).unwrap();
            symlink(dir.path().join("target_dir"), dir.path().join("dir_link")).unwrap();

            let result = walk_largest(&request(dir.path(), 0, &[], 10), &CancelFlag::new()).unwrap();

            assert_eq!(file_names(&result), vec!["real.bin", "inner.bin"]);
            assert_eq!(result.stats.symlinks_skipped, 2);
        }

        #[test]
        fn test_broken_symlink_is_skipped() {
            let dir = TempDir::new().unwrap();
            symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();
            sparse(&dir.path().join("ok.bin"), 10);

            let result = walk_largest(&request(dir.path(), 0, &[], 10), &CancelFlag::new()).unwrap();
            assert_eq!(file_names(&result), vec!["ok.bin"]);
        }

        #[test]
        fn test_socket_is_skipped_as_special_file() {
            let dir = TempDir::new().unwrap();
            let _listener = UnixListener::bind(dir.path().join("sock")).unwrap();
            sparse(&dir.path().join("ok.bin"), 10);

            let result = walk_largest(&request(dir.path(), 0, &[], 10), &CancelFlag::new()).unwrap();

            assert_eq!(file_names(&result), vec!["ok.bin"]);
            assert_eq!(result.stats.skipped_special, 1);
        }

        #[test]
        fn test_unreadable_directory_does_not_abort_scan() {
            let dir = TempDir::new().unwrap();
            let locked = dir.path().join("locked");
            sparse(&locked.join("secret.bin"), 50);
            sparse(&dir.path().join("a.bin"), 300);
            sparse(&dir.path().join("b/c.bin"), 200);
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

            let result = walk_largest(&request(dir.path(), 100, &[], 10), &CancelFlag::new());

            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

            let result = result.unwrap();
            assert_eq!(file_names(&result), vec!["a.bin", "c.bin"]);
        }
    }

    mod failure_tests {
        use super::*;

        #[test]
        fn test_missing_root_is_unavailable() {
            let err = walk_largest(
                &request(Path::new("/nonexistent/root/12345"), 0, &[], 1),
                &CancelFlag::new(),
            )
            .unwrap_err();
            assert!(matches!(err, ScanError::RootUnavailable { .. }));
        }

        #[test]
        fn test_file_root_is_unavailable() {
            let dir = TempDir::new().unwrap();
            let file = dir.path().join("plain.txt");
            fs::write(&file, b"data").unwrap();

            let err = walk_largest(&request(&file, 0, &[], 1), &CancelFlag::new()).unwrap_err();
            assert!(matches!(err, ScanError::RootUnavailable { .. }));
        }

        #[test]
        fn test_cancelled_walk_returns_no_result() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("a.bin"), 10);

            let cancel = CancelFlag::new();
            cancel.cancel();

            let err = walk_largest(&request(dir.path(), 0, &[], 1), &cancel).unwrap_err();
            assert!(err.is_cancelled());
        }

        #[test]
        fn test_cancel_stops_walk_in_progress() {
            let dir = TempDir::new().unwrap();
            for i in 0..20 {
                sparse(&dir.path().join(format!("d{:02}/f.bin", i)), 100);
            }

            let cancel = CancelFlag::new();
            let mut opened = 0;
            let outcome = walk_with(&request(dir.path(), 0, &[], 5), &cancel, |path| {
                opened += 1;
                if opened == 5 {
                    cancel.cancel();
                }
                fs::read_dir(path)
            });

            assert!(outcome.unwrap_err().is_cancelled());
            // The flag is seen before the next directory is opened.
            assert_eq!(opened, 5);
        }

        #[test]
        fn test_exhausted_budget_times_out() {
            let dir = TempDir::new().unwrap();
            sparse(&dir.path().join("a.bin"), 10);

            let req = request(dir.path(), 0, &[], 1).with_time_budget(Duration::ZERO);
            let err = walk_largest(&req, &CancelFlag::new()).unwrap_err();
            assert!(matches!(err, ScanError::TimedOut));
        }

        #[test]
        fn test_skip_reason_classification() {
            let denied = io::Error::from(io::ErrorKind::PermissionDenied);
            let gone = io::Error::from(io::ErrorKind::NotFound);
            let other = io::Error::from(io::ErrorKind::InvalidData);

            assert_eq!(SkipReason::from_io(&denied), SkipReason::PermissionDenied);
            assert_eq!(SkipReason::from_io(&gone), SkipReason::NotFound);
            assert_eq!(SkipReason::from_io(&other), SkipReason::Other);
        }
    }
}
