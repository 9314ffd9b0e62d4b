use std::collections::HashMap;

/// Synthetic zero-frequency token present in every built vocabulary.
///
/// It seeds the counts so that a vocabulary is never empty, even for corpora
/// lacking a given evidence kind entirely.
pub const ZERO_FREQ_TOKEN: &str = "C0";

/// Bijective token-to-id mapping, ordered by descending corpus frequency with
/// ties broken by first-seen order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    /// Count every occurrence, add the zero-frequency sentinel, and assign
    /// dense ids in descending-count order (stable on ties).
    pub fn build<I>(occurrences: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut counts: HashMap<String, u64> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for token in occurrences {
            let token = token.as_ref();
            match counts.get_mut(token) {
                Some(n) => *n += 1,
                None => {
                    counts.insert(token.to_string(), 1);
                    first_seen.push(token.to_string());
                }
            }
        }
        if !counts.contains_key(ZERO_FREQ_TOKEN) {
            counts.insert(ZERO_FREQ_TOKEN.to_string(), 1);
            first_seen.push(ZERO_FREQ_TOKEN.to_string());
        }

        // Stable sort keeps first-seen order among equal counts.
        let mut tokens = first_seen;
        tokens.sort_by_key(|t| std::cmp::Reverse(counts[t]));
        Self::from_tokens(tokens)
    }

    /// Reconstruct a vocabulary from its ordered token list (the snapshot
    /// form): position in the list is the id.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let ids = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Vocabulary { tokens, ids }
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.ids.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    /// Ordered token list; sufficient to reconstruct the vocabulary.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
