use std::path::Path;

use anyhow::{Context, Result};

use crate::corpus::ProgramRecord;
use crate::vocab::Vocabulary;

use super::stopwords::is_stop_word;
use super::{Evidence, DOCTEXT};

/// Token id of the unknown-word slot in an embedding vocabulary.
pub const UNK_TOKEN: &str = "<unk>";

/// Order-reversed documentation words per program, encoded against an
/// externally loaded embedding vocabulary rather than a corpus-built one.
///
/// The wrangled row is `max_words` ids (zero-padded) followed by the actual
/// word count.
#[derive(Debug, Clone)]
pub struct DocTextEvidence {
    max_words: usize,
    vocab: Vocabulary,
}

impl DocTextEvidence {
    pub fn new(max_words: usize) -> Self {
        DocTextEvidence {
            max_words,
            vocab: Vocabulary::from_tokens(vec![UNK_TOKEN.to_string()]),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Load the pre-built embedding vocabulary: one `word v1 v2 ...` row per
    /// line. Only the words matter here; `<unk>` is prepended at id 0.
    pub fn load_embeddings(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read embedding file: {}", path.display()))?;
        let mut tokens = vec![UNK_TOKEN.to_string()];
        for line in text.lines() {
            if let Some(word) = line.split_whitespace().next() {
                tokens.push(word.to_string());
            }
        }
        self.vocab = Vocabulary::from_tokens(tokens);
        Ok(())
    }
}

impl Evidence for DocTextEvidence {
    fn name(&self) -> &'static str {
        DOCTEXT
    }

    /// Whitespace-split words of the documentation field, order-reversed.
    fn extract(&self, record: &ProgramRecord) -> Vec<String> {
        match &record.doc {
            Some(doc) => doc.split_whitespace().rev().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// The vocabulary is loaded, not learned.
    fn build_vocab(&mut self, _collections: &[&Vec<String>]) {}

    fn wrangle(&self, tokens: &[String]) -> Vec<i32> {
        let mut row = vec![0i32; self.max_words + 1];
        let mut cursor = 0usize;
        for word in tokens {
            if cursor >= self.max_words {
                break;
            }
            if is_stop_word(word) {
                continue;
            }
            if let Some(id) = self.vocab.id(word) {
                row[cursor] = id as i32;
                cursor += 1;
            }
        }
        row[self.max_words] = cursor as i32;
        row
    }

    fn width(&self) -> usize {
        self.max_words + 1
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn restore_vocab(&mut self, vocab: Vocabulary) {
        self.vocab = vocab;
    }
}
