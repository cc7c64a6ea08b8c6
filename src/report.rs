//! End-of-run summary.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::errors::SnapshotError;
use crate::stats::RunStatistics;
use crate::tokens::Tokenizer;

/// Final counters plus the token estimate for the written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub stats: RunStatistics,
    pub total_tokens: usize,
    pub output_path: PathBuf,
}

/// Re-read the document at `output_path` and estimate its token count.
pub fn report(
    output_path: &Path,
    stats: RunStatistics,
    tokenizer: &dyn Tokenizer,
    model: &str,
) -> Result<Report, SnapshotError> {
    let text = fs::read_to_string(output_path).map_err(|source| SnapshotError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;

    let total_tokens = tokenizer.count_tokens(&text, model);
    info!("{} tokens ({})", total_tokens, model);

    Ok(Report {
        stats,
        total_tokens,
        output_path: output_path.to_path_buf(),
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Process Complete!")?;
        writeln!(f, "Files processed: {}", self.stats.processed_files)?;
        writeln!(f, "Files ignored: {}", self.stats.ignored_files)?;
        writeln!(f, "Directories skipped: {}", self.stats.skipped_dirs)?;
        writeln!(f, "Errors encountered: {}", self.stats.errors)?;
        writeln!(f, "Total Tokens: {}", format_number(self.total_tokens))?;
        writeln!(f)?;
        write!(f, "Output saved to: {}", self.output_path.display())
    }
}

/// Format a number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
