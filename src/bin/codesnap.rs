//! codesnap CLI - Snapshot a codebase into a single Markdown file.

use std::path::PathBuf;

use clap::Parser;
use codesnap::builder::Snapshot;
use codesnap::errors::SnapshotError;
use codesnap::tokens::{Encoding, TiktokenTokenizer};
use log::warn;

/// Environment variable naming the tokenizer model.
const MODEL_ENV: &str = "CODESNAP_MODEL";
/// Environment variable naming the encoding used for unknown models.
const ENCODING_ENV: &str = "CODESNAP_ENCODING";

#[derive(Parser)]
#[command(name = "codesnap")]
#[command(about = "Concatenate code files into a single markdown file for AI analysis.")]
struct Cli {
    /// Path to the source folder containing the codebase
    source_folder: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SnapshotError> {
    let mut snapshot =
        Snapshot::new(cli.source_folder).tokenizer(TiktokenTokenizer::new(fallback_encoding()));
    if let Ok(model) = std::env::var(MODEL_ENV) {
        snapshot = snapshot.model(model);
    }

    println!("Scanning files...");
    let report = snapshot.run()?;

    println!();
    println!("{}", report);
    Ok(())
}

fn fallback_encoding() -> Encoding {
    match std::env::var(ENCODING_ENV) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("{}: {}, using {}", ENCODING_ENV, e, Encoding::default());
            Encoding::default()
        }),
        Err(_) => Encoding::default(),
    }
}
