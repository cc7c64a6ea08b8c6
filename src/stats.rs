//! Run counters.

use std::ops::AddAssign;

/// Counters collected while scanning and assembling a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Files written into the snapshot.
    pub processed_files: usize,
    /// Lockfiles and files under excluded directories.
    pub ignored_files: usize,
    /// Excluded directories pruned from the walk (not their contents).
    pub skipped_dirs: usize,
    /// Files or directories that could not be read.
    pub errors: usize,
}

impl RunStatistics {
    /// Delta carrying only an error count.
    pub fn errors(errors: usize) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, other: Self) {
        self.processed_files += other.processed_files;
        self.ignored_files += other.ignored_files;
        self.skipped_dirs += other.skipped_dirs;
        self.errors += other.errors;
    }
}
