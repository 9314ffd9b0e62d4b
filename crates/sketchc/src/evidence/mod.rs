//! Evidence encoders: each kind extracts string tokens from a raw program
//! record, builds (or loads) a vocabulary, and wrangles per-program token
//! collections into fixed-width numeric rows.

use serde::{Deserialize, Serialize};

use crate::corpus::ProgramRecord;
use crate::vocab::Vocabulary;

pub mod apicalls;
pub mod doctext;
pub mod keywords;
pub mod stopwords;
pub mod types;

pub use apicalls::ApiCallsEvidence;
pub use doctext::DocTextEvidence;
pub use keywords::KeywordsEvidence;
pub use types::TypesEvidence;

pub const APICALLS: &str = "apicalls";
pub const TYPES: &str = "types";
pub const KEYWORDS: &str = "keywords";
pub const DOCTEXT: &str = "doctext";

/// Per-kind configuration. `max_words` and `embedding_file` only apply to the
/// doc-text kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    pub name: String,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_file: Option<std::path::PathBuf>,
}

fn default_max_words() -> usize {
    20
}

impl EvidenceConfig {
    pub fn named(name: &str) -> Self {
        EvidenceConfig {
            name: name.to_string(),
            max_words: default_max_words(),
            embedding_file: None,
        }
    }
}

/// Capability set shared by every evidence kind.
///
/// `build_vocab` runs exactly once, over the full corpus, before any call to
/// `wrangle`; the vocabulary is read-only afterwards. Unknown tokens during
/// wrangling are dropped, not errors.
pub trait Evidence: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Token collection for one raw program record.
    fn extract(&self, record: &ProgramRecord) -> Vec<String>;

    /// Build the frequency-ranked vocabulary from the extracted collections
    /// of every retained data point. Kinds with an externally loaded
    /// vocabulary ignore this.
    fn build_vocab(&mut self, collections: &[&Vec<String>]);

    /// Fixed-width numeric row for one token collection.
    fn wrangle(&self, tokens: &[String]) -> Vec<i32>;

    /// Width of every wrangled row.
    fn width(&self) -> usize;

    fn vocab(&self) -> &Vocabulary;

    fn restore_vocab(&mut self, vocab: Vocabulary);
}

/// Instantiate encoders from a configuration list. Unknown names are a
/// configuration error; the doc-text embedding file is loaded eagerly here.
pub fn from_config(configs: &[EvidenceConfig]) -> anyhow::Result<Vec<Box<dyn Evidence>>> {
    let mut out: Vec<Box<dyn Evidence>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config.name.as_str() {
            APICALLS => out.push(Box::new(ApiCallsEvidence::new())),
            TYPES => out.push(Box::new(TypesEvidence::new())),
            KEYWORDS => out.push(Box::new(KeywordsEvidence::new())),
            DOCTEXT => {
                let mut ev = DocTextEvidence::new(config.max_words);
                if let Some(path) = &config.embedding_file {
                    ev.load_embeddings(path)?;
                }
                out.push(Box::new(ev));
            }
            other => anyhow::bail!("invalid evidence name: {other:?}"),
        }
    }
    Ok(out)
}

/// Stable order-preserving dedup shared by the set-valued kinds.
pub(crate) fn dedup_keep_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if seen.insert(token.clone()) {
            out.push(token);
        }
    }
    out
}

/// Presence row over the vocabulary for a set-valued evidence kind; unknown
/// tokens are silently dropped.
pub(crate) fn presence_row(vocab: &Vocabulary, tokens: &[String]) -> Vec<i32> {
    let mut row = vec![0i32; vocab.len()];
    for token in tokens {
        if let Some(id) = vocab.id(token) {
            row[id] = 1;
        }
    }
    row
}
