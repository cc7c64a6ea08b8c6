//! Fluent builder tying scan, assembly and reporting together.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::errors::SnapshotError;
use crate::filter::FileRules;
use crate::output::assemble;
use crate::report::{report, Report};
use crate::tokens::{TiktokenTokenizer, Tokenizer, DEFAULT_MODEL};
use crate::walker::{scan_with_options, ScanResult, WalkOptions};

/// Directory, under the source root, that receives snapshots.
pub const OUTPUT_DIR_NAME: &str = "Concatenated";

/// Builder for a single snapshot run.
///
/// # Examples
///
/// ```no_run
/// use codesnap::builder::Snapshot;
///
/// let report = Snapshot::new("./my-project")
///     .model("gpt-4o")
///     .run()
///     .unwrap();
///
/// println!("{}", report);
/// ```
pub struct Snapshot {
    root: PathBuf,
    rules: FileRules,
    model: String,
    output_dir: Option<PathBuf>,
    selection: Option<Vec<PathBuf>>,
    tokenizer: Box<dyn Tokenizer>,
}

impl Snapshot {
    /// Create a builder for the given source folder.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rules: FileRules::default(),
            model: DEFAULT_MODEL.to_string(),
            output_dir: None,
            selection: None,
            tokenizer: Box::new(TiktokenTokenizer::default()),
        }
    }

    /// Replace the selection tables.
    pub fn rules(mut self, rules: FileRules) -> Self {
        self.rules = rules;
        self
    }

    /// Model whose tokenizer estimates the token count.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Write snapshots here instead of `<root>/Concatenated`.
    ///
    /// Relative paths are resolved against the source root.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Only snapshot these files, given relative to the source root.
    ///
    /// The tree is still scanned and every selected file must pass the
    /// usual rules; excluded or non-text selections are dropped. Files
    /// that are not selected are left out without being counted.
    pub fn select<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.selection = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Use a different token counter.
    pub fn tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Run the snapshot, timestamped now.
    pub fn run(self) -> Result<Report, SnapshotError> {
        self.run_at(Local::now())
    }

    /// Run the snapshot with an explicit generation time.
    pub fn run_at(self, generated_at: DateTime<Local>) -> Result<Report, SnapshotError> {
        let root = resolve_root(&self.root)?;

        let output_dir = match &self.output_dir {
            Some(dir) => root.join(dir),
            None => root.join(OUTPUT_DIR_NAME),
        };
        let output_path = output_dir.join(output_file_name(&root, generated_at));

        let options = WalkOptions::default().skip(&output_dir);
        let mut scan = scan_with_options(&root, &self.rules, &options)?;

        if let Some(selection) = &self.selection {
            apply_selection(&mut scan, selection);
        }

        let mut stats = scan.stats;
        stats += assemble(&scan.files, &root, &output_path, generated_at)?;

        info!("snapshot written to {}", output_path.display());

        report(&output_path, stats, self.tokenizer.as_ref(), &self.model)
    }
}

/// `<folder name>_<YYYYMMDD_HHMMSS>.md`
pub fn output_file_name(root: &Path, generated_at: DateTime<Local>) -> String {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    format!("{}_{}.md", name, generated_at.format("%Y%m%d_%H%M%S"))
}

/// Keep only the selected files, in scan order.
fn apply_selection(scan: &mut ScanResult, selection: &[PathBuf]) {
    scan.files.retain(|file| selection.iter().any(|p| p == &file.relative));

    for path in selection {
        if !scan.files.iter().any(|f| &f.relative == path) {
            warn!("selected file {} is not part of the snapshot", path.display());
        }
    }

    debug!("{} of {} files selected", scan.files.len(), scan.stats.processed_files);
    scan.stats.processed_files = scan.files.len();
}

/// Absolute, lexically normalized source root.
///
/// Symlinks are not resolved, so the header and the output path name the
/// folder the way the caller did. `..` pops the previous component.
fn resolve_root(root: &Path) -> Result<PathBuf, SnapshotError> {
    let absolute = std::path::absolute(root).map_err(|source| SnapshotError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }

    let metadata = fs::metadata(&resolved).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SnapshotError::SourceNotFound(root.to_path_buf())
        } else {
            SnapshotError::Io {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_dir() {
        return Err(SnapshotError::NotADirectory(root.to_path_buf()));
    }
    Ok(resolved)
}
