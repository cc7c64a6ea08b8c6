//! Snapshot document assembly.
//!
//! Writes the Markdown snapshot: a header with the generation time and
//! source path, a table of contents, then one fenced block per file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{info, warn};
use thiserror::Error;

use crate::filter::{is_directive_file, is_env_file};
use crate::stats::RunStatistics;
use crate::walker::IncludedFile;

/// Errors that can occur while writing the snapshot.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Replacement for masked `.env` values.
pub const MASK: &str = "X-X-X";

const TITLE: &str = "# Codebase Snapshot";
const DIRECTIVE_NOTE: &str = "### This file describes the overall scope and intent of the codebase";
const ENCODING_ERROR: &str = "[Unable to read file: encoding error]\n";

/// Create `output_path` (and its parent directory) and write the snapshot.
///
/// Returns the statistics delta for the assembly pass: only `errors` is
/// ever non-zero. Per-file read failures are written inline and counted;
/// only failures on the output itself are returned as errors.
pub fn assemble(
    files: &[IncludedFile],
    source_root: &Path,
    output_path: &Path,
    generated_at: DateTime<Local>,
) -> Result<RunStatistics, OutputError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_err = |source| OutputError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    let file = File::create(output_path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    let delta = write_document(&mut out, files, source_root, generated_at).map_err(write_err)?;
    out.flush().map_err(write_err)?;

    info!(
        "wrote {} files to {} ({} read errors)",
        files.len(),
        output_path.display(),
        delta.errors
    );

    Ok(delta)
}

/// Write the whole snapshot document to `out`.
pub fn write_document<W: Write>(
    out: &mut W,
    files: &[IncludedFile],
    source_root: &Path,
    generated_at: DateTime<Local>,
) -> io::Result<RunStatistics> {
    write!(out, "{TITLE}\n\n")?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    write!(out, "Source: {}\n\n", source_root.display())?;

    out.write_all(b"## Table of Contents\n\n")?;
    for file in files {
        writeln!(out, "- {}", file.relative.display())?;
    }
    out.write_all(b"\n---\n\n")?;

    let mut errors = 0;
    for file in files {
        if !write_file_block(out, file)? {
            errors += 1;
        }
    }

    Ok(RunStatistics::errors(errors))
}

/// Write one file's section. Returns `false` if its content was unreadable.
fn write_file_block<W: Write>(out: &mut W, file: &IncludedFile) -> io::Result<bool> {
    if is_directive_file(&file.path) {
        write!(out, "## File: {} (Cursorrules)\n\n", file.relative.display())?;
        writeln!(out, "{DIRECTIVE_NOTE}")?;
    } else {
        write!(out, "## File: {}\n\n", file.relative.display())?;
    }

    writeln!(out, "```{}", file.language)?;

    let readable = match read_content(&file.path) {
        FileContent::Text(content) => {
            let content = if is_env_file(&file.path) {
                mask_env_content(&content)
            } else {
                content
            };
            out.write_all(content.as_bytes())?;
            true
        }
        FileContent::NotUtf8 => {
            warn!("{}: not valid UTF-8", file.path.display());
            out.write_all(ENCODING_ERROR.as_bytes())?;
            false
        }
        FileContent::Unreadable(e) => {
            warn!("{}: {}", file.path.display(), e);
            writeln!(out, "[Error reading file: {e}]")?;
            false
        }
    };

    out.write_all(b"\n```\n\n")?;
    out.write_all(b"---\n\n")?;

    Ok(readable)
}

enum FileContent {
    Text(String),
    NotUtf8,
    Unreadable(io::Error),
}

fn read_content(path: &Path) -> FileContent {
    match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => FileContent::Text(normalize_newlines(text)),
            Err(_) => FileContent::NotUtf8,
        },
        Err(e) => FileContent::Unreadable(e),
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Mask every value in `KEY=VALUE` lines, keeping the key.
///
/// Lines starting with `#` and lines without `=` pass through unchanged.
///
/// # Examples
///
/// ```
/// use codesnap::output::mask_env_content;
///
/// let masked = mask_env_content("API_KEY=hunter2\n# note=kept\nplain");
/// assert_eq!(masked, "API_KEY=X-X-X\n# note=kept\nplain");
/// ```
pub fn mask_env_content(content: &str) -> String {
    content
        .split('\n')
        .map(|line| match line.split_once('=') {
            Some((key, _)) if !line.starts_with('#') => format!("{key}={MASK}"),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn included(dir: &TempDir, relative: &str, contents: &[u8], language: &'static str) -> IncludedFile {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        IncludedFile {
            path,
            relative: PathBuf::from(relative),
            language,
        }
    }

    fn render(files: &[IncludedFile], root: &Path) -> (String, RunStatistics) {
        let mut buf = Vec::new();
        let delta = write_document(&mut buf, files, root, fixed_time()).unwrap();
        (String::from_utf8(buf).unwrap(), delta)
    }

    #[test]
    fn test_mask_env_content() {
        assert_eq!(
            mask_env_content("SECRET=abc123\n#comment\nFOO=bar"),
            "SECRET=X-X-X\n#comment\nFOO=X-X-X"
        );
        assert_eq!(mask_env_content("URL=a=b=c"), "URL=X-X-X");
        assert_eq!(mask_env_content("#KEY=value"), "#KEY=value");
        assert_eq!(mask_env_content(" # KEY=value"), " # KEY=X-X-X");
        assert_eq!(mask_env_content("export"), "export");
        assert_eq!(mask_env_content("A=1\n"), "A=X-X-X\n");
        assert_eq!(mask_env_content(""), "");
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n".to_string()), "a\nb\nc\n");
        assert_eq!(normalize_newlines("plain".to_string()), "plain");
    }

    #[test]
    fn test_header_and_empty_toc() {
        let (doc, delta) = render(&[], Path::new("/work/project"));

        assert_eq!(
            doc,
            "# Codebase Snapshot\n\n\
             Generated: 2024-01-02 03:04:05\n\
             Source: /work/project\n\n\
             ## Table of Contents\n\n\
             \n---\n\n"
        );
        assert_eq!(delta, RunStatistics::default());
    }

    #[test]
    fn test_file_block_format() {
        let dir = TempDir::new().unwrap();
        let files = vec![included(&dir, "src/app.py", b"x=1", "python")];

        let (doc, delta) = render(&files, dir.path());

        assert!(doc.contains("## Table of Contents\n\n- src/app.py\n\n---\n\n"));
        assert!(doc.ends_with("## File: src/app.py\n\n```python\nx=1\n```\n\n---\n\n"));
        assert_eq!(delta.errors, 0);
    }

    #[test]
    fn test_env_file_masked() {
        let dir = TempDir::new().unwrap();
        let files = vec![included(&dir, ".env", b"SECRET=abc123\n#comment\nFOO=bar", "text")];

        let (doc, _) = render(&files, dir.path());

        assert!(doc.contains("```text\nSECRET=X-X-X\n#comment\nFOO=X-X-X\n```"));
        assert!(!doc.contains("abc123"));
    }

    #[test]
    fn test_non_env_file_not_masked() {
        let dir = TempDir::new().unwrap();
        let files = vec![included(&dir, "settings.ini", b"PASSWORD=open", "text")];

        let (doc, _) = render(&files, dir.path());

        assert!(doc.contains("PASSWORD=open"));
    }

    #[test]
    fn test_directive_file_annotated() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            included(&dir, ".cursorrules", b"Be terse.", "text"),
            included(&dir, ".gitignore", b"target/", "text"),
        ];

        let (doc, _) = render(&files, dir.path());

        assert!(doc.contains(
            "## File: .cursorrules (Cursorrules)\n\n\
             ### This file describes the overall scope and intent of the codebase\n\
             ```text\nBe terse.\n```"
        ));
        assert!(doc.contains("## File: .gitignore\n\n```text\ntarget/\n```"));
        assert_eq!(doc.matches("(Cursorrules)").count(), 1);
    }

    #[test]
    fn test_invalid_utf8_recorded_inline() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            included(&dir, "bad.txt", &[0xff, 0xfe, 0x00, 0x41], "text"),
            included(&dir, "good.txt", b"fine", "text"),
        ];

        let (doc, delta) = render(&files, dir.path());

        assert!(doc.contains("```text\n[Unable to read file: encoding error]\n\n```"));
        assert!(doc.contains("```text\nfine\n```"));
        assert_eq!(delta.errors, 1);
    }

    #[test]
    fn test_missing_file_recorded_inline() {
        let dir = TempDir::new().unwrap();
        let files = vec![IncludedFile {
            path: dir.path().join("gone.rs"),
            relative: PathBuf::from("gone.rs"),
            language: "rust",
        }];

        let (doc, delta) = render(&files, dir.path());

        assert!(doc.contains("```rust\n[Error reading file: "));
        assert_eq!(delta.errors, 1);
    }

    #[test]
    fn test_toc_matches_body_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            included(&dir, "b.rs", b"b", "rust"),
            included(&dir, "a/a.rs", b"a", "rust"),
            included(&dir, "c.md", b"c", "text"),
        ];

        let (doc, _) = render(&files, dir.path());

        let toc: Vec<&str> = doc
            .lines()
            .filter_map(|l| l.strip_prefix("- "))
            .collect();
        let body: Vec<&str> = doc
            .lines()
            .filter_map(|l| l.strip_prefix("## File: "))
            .collect();

        assert_eq!(toc, vec!["b.rs", "a/a.rs", "c.md"]);
        assert_eq!(toc, body);
    }

    #[test]
    fn test_assemble_creates_directory() {
        let dir = TempDir::new().unwrap();
        let files = vec![included(&dir, "main.rs", b"fn main() {}", "rust")];
        let output_path = dir.path().join("Concatenated").join("snap.md");

        let delta = assemble(&files, dir.path(), &output_path, fixed_time()).unwrap();

        let doc = fs::read_to_string(&output_path).unwrap();
        assert!(doc.starts_with("# Codebase Snapshot\n\n"));
        assert!(doc.contains("```rust\nfn main() {}\n```"));
        assert_eq!(delta.errors, 0);
    }

    #[test]
    fn test_assemble_overwrites() {
        let dir = TempDir::new().unwrap();
        let output_path = dir.path().join("snap.md");
        fs::write(&output_path, "stale contents that are long enough to notice").unwrap();

        assemble(&[], dir.path(), &output_path, fixed_time()).unwrap();

        let doc = fs::read_to_string(&output_path).unwrap();
        assert!(!doc.contains("stale"));
    }
}
