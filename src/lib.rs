//! codesnap - Concatenate a codebase into one Markdown snapshot for LLMs.
//!
//! codesnap walks a source tree, keeps text-like source files while pruning
//! dependency and build directories, writes them into a single document
//! with a table of contents and language-tagged code fences, and estimates
//! how many tokens that document costs.
//!
//! # Quick Start
//!
//! ```no_run
//! use codesnap::builder::Snapshot;
//!
//! let report = Snapshot::new("./my-project").run().unwrap();
//!
//! println!("{} files, {} tokens", report.stats.processed_files, report.total_tokens);
//! println!("written to {}", report.output_path.display());
//! ```
//!
//! # Modules
//!
//! - [`filter`] - Exclusion set, text extensions, language tags
//! - [`walker`] - Directory traversal and file selection
//! - [`output`] - Snapshot document assembly and `.env` masking
//! - [`tokens`] - Token counting for LLM context budgets
//! - [`report`] - End-of-run summary
//! - [`builder`] - Fluent API running the whole pipeline

pub mod filter;
pub mod stats;
pub mod errors;
pub mod walker;
pub mod output;
pub mod tokens;
pub mod report;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::{Snapshot, OUTPUT_DIR_NAME};
pub use errors::SnapshotError;
pub use filter::{ExclusionSet, FileClass, FileRules};
pub use output::{mask_env_content, OutputError};
pub use report::Report;
pub use stats::RunStatistics;
pub use tokens::{Encoding, TiktokenTokenizer, Tokenizer};
pub use walker::{scan, IncludedFile, ScanResult, WalkError};
