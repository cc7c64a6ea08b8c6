//! Directory traversal and file selection.
//!
//! Uses the `ignore` crate's walker with every gitignore and hidden-file
//! filter turned off: the only things pruned are the directories named by
//! the [`ExclusionSet`](crate::filter::ExclusionSet) and any explicit skip
//! paths (the snapshot output directory).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ignore::WalkBuilder;
use log::{debug, info, warn};
use thiserror::Error;

use crate::filter::{FileClass, FileRules};
use crate::stats::RunStatistics;

/// Errors that stop a scan before it starts.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for a scan.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Directories pruned silently, without touching `skipped_dirs`.
    pub skip_paths: Vec<PathBuf>,
}

impl WalkOptions {
    /// Add a directory to prune without counting it.
    pub fn skip(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }
}

/// A file selected for the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFile {
    /// Path as produced by the walk (rooted at the scan root).
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative: PathBuf,
    /// Fenced-block language tag.
    pub language: &'static str,
}

/// Files in discovery order plus the counters gathered on the way.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<IncludedFile>,
    pub stats: RunStatistics,
}

/// Scan `root` with default options.
///
/// # Examples
///
/// ```no_run
/// use codesnap::filter::FileRules;
/// use codesnap::walker::scan;
/// use std::path::Path;
///
/// let result = scan(Path::new("."), &FileRules::default()).unwrap();
/// for file in &result.files {
///     println!("{} ({})", file.relative.display(), file.language);
/// }
/// ```
pub fn scan(root: &Path, rules: &FileRules) -> Result<ScanResult, WalkError> {
    scan_with_options(root, rules, &WalkOptions::default())
}

/// Scan `root`, visiting directories top-down.
///
/// Within a directory, files come before subdirectories; otherwise the
/// order is whatever the filesystem enumerates. No further sorting is
/// applied, so the returned order is the table-of-contents order.
pub fn scan_with_options(
    root: &Path,
    rules: &FileRules,
    options: &WalkOptions,
) -> Result<ScanResult, WalkError> {
    let metadata = root.metadata().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WalkError::NotFound {
                path: root.to_path_buf(),
            }
        } else {
            WalkError::Io {
                path: root.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !metadata.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let pruned = Arc::new(AtomicUsize::new(0));

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.is_dir().cmp(&b.is_dir()));

    {
        let exclusions = rules.exclusions.clone();
        let skip_paths = options.skip_paths.clone();
        let pruned = Arc::clone(&pruned);

        // Never called for the root itself.
        builder.filter_entry(move |entry| {
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            if skip_paths.iter().any(|p| p == entry.path()) {
                debug!("skipping output directory {}", entry.path().display());
                return false;
            }
            if exclusions.contains_name(&entry.file_name().to_string_lossy()) {
                debug!("pruning {}", entry.path().display());
                pruned.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            true
        });
    }

    let mut result = ScanResult::default();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walk error: {}", e);
                result.stats.errors += 1;
                continue;
            }
        };

        let is_file = match entry.file_type() {
            Some(ft) if ft.is_file() => true,
            Some(ft) if ft.is_symlink() => entry.path().is_file(),
            _ => false,
        };
        if !is_file {
            continue;
        }

        let path = entry.into_path();
        let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();

        match rules.classify(&relative) {
            FileClass::Included => {
                debug!("including {}", relative.display());
                result.stats.processed_files += 1;
                result.files.push(IncludedFile {
                    language: rules.language_for(&relative),
                    path,
                    relative,
                });
            }
            FileClass::Ignored => {
                debug!("ignoring {}", relative.display());
                result.stats.ignored_files += 1;
            }
            FileClass::NotText => {}
        }
    }

    result.stats.skipped_dirs = pruned.load(Ordering::Relaxed);

    info!(
        "scanned {}: {} included, {} ignored, {} directories skipped",
        root.display(),
        result.stats.processed_files,
        result.stats.ignored_files,
        result.stats.skipped_dirs
    );

    Ok(result)
}
