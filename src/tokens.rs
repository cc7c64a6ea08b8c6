//! Token estimation for LLM context budgets.
//!
//! The reporter only needs "text + model in, count out", so tokenization
//! sits behind the [`Tokenizer`] trait. [`TiktokenTokenizer`] is the real
//! implementation; tests can plug in anything cheaper.

use std::sync::OnceLock;

use log::{debug, warn};
use tiktoken_rs::tokenizer::get_tokenizer;
use tiktoken_rs::CoreBPE;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Counts tokens in a piece of text for a given model.
pub trait Tokenizer {
    /// Never fails: implementations fall back rather than erroring.
    fn count_tokens(&self, text: &str, model: &str) -> usize;
}

/// A tiktoken encoding.
///
/// Known models resolve to one of these; unknown models use the
/// tokenizer's configured fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    #[default]
    Cl100kBase,
    /// o200k_base: GPT-4o
    O200kBase,
    /// p50k_base: Codex, text-davinci-002/003
    P50kBase,
    /// p50k_edit: edit models
    P50kEdit,
    /// r50k_base: GPT-3, GPT-2
    R50kBase,
}

impl Encoding {
    /// Encoding tiktoken associates with `model`, if any.
    pub fn for_model(model: &str) -> Option<Self> {
        use tiktoken_rs::tokenizer::Tokenizer as Bpe;

        get_tokenizer(model).map(|bpe| match bpe {
            Bpe::Cl100kBase => Encoding::Cl100kBase,
            Bpe::O200kBase => Encoding::O200kBase,
            Bpe::P50kBase => Encoding::P50kBase,
            Bpe::P50kEdit => Encoding::P50kEdit,
            Bpe::R50kBase | Bpe::Gpt2 => Encoding::R50kBase,
        })
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
            Encoding::P50kBase => write!(f, "p50k_base"),
            Encoding::P50kEdit => write!(f, "p50k_edit"),
            Encoding::R50kBase => write!(f, "r50k_base"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            "p50k" | "p50k_base" => Ok(Encoding::P50kBase),
            "p50k_edit" => Ok(Encoding::P50kEdit),
            "r50k" | "r50k_base" | "gpt2" => Ok(Encoding::R50kBase),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

// Cached tokenizers - initialized once per encoding
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static P50K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static P50K_EDIT: OnceLock<Option<CoreBPE>> = OnceLock::new();
static R50K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoding_bpe(encoding: Encoding) -> Option<&'static CoreBPE> {
    match encoding {
        Encoding::Cl100kBase => CL100K
            .get_or_init(|| tiktoken_rs::cl100k_base().ok())
            .as_ref(),
        Encoding::O200kBase => O200K
            .get_or_init(|| tiktoken_rs::o200k_base().ok())
            .as_ref(),
        Encoding::P50kBase => P50K
            .get_or_init(|| tiktoken_rs::p50k_base().ok())
            .as_ref(),
        Encoding::P50kEdit => P50K_EDIT
            .get_or_init(|| tiktoken_rs::p50k_edit().ok())
            .as_ref(),
        Encoding::R50kBase => R50K
            .get_or_init(|| tiktoken_rs::r50k_base().ok())
            .as_ref(),
    }
}

/// Fallback heuristic: ~4 characters per token.
fn heuristic_count(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Tokenizer backed by tiktoken-rs.
///
/// # Examples
///
/// ```
/// use codesnap::tokens::{TiktokenTokenizer, Tokenizer, DEFAULT_MODEL};
///
/// let tokenizer = TiktokenTokenizer::default();
/// assert!(tokenizer.count_tokens("Hello, world!", DEFAULT_MODEL) > 0);
/// // Unknown models fall back instead of failing
/// assert!(tokenizer.count_tokens("Hello, world!", "no-such-model") > 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TiktokenTokenizer {
    fallback: Encoding,
}

impl TiktokenTokenizer {
    /// Create a tokenizer that uses `fallback` for unknown models.
    pub fn new(fallback: Encoding) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> Encoding {
        self.fallback
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str, model: &str) -> usize {
        let encoding = Encoding::for_model(model).unwrap_or_else(|| {
            debug!("no tokenizer for {}, using {}", model, self.fallback);
            self.fallback
        });

        match encoding_bpe(encoding) {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => {
                warn!("{} unavailable, estimating tokens from length", encoding);
                heuristic_count(text)
            }
        }
    }
}
