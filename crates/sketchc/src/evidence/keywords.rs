use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{gather_calls, CallNode};
use crate::corpus::ProgramRecord;
use crate::vocab::Vocabulary;

use super::apicalls::{call_name, strip_predicate};
use super::stopwords::is_stop_word;
use super::types::types_from_call;
use super::{dedup_keep_order, presence_row, Evidence, KEYWORDS};

/// Deduplicated, lower-cased, stop-word-filtered keyword set per program,
/// derived from qualified name segments, camel-split call names and
/// camel-split type names.
#[derive(Debug, Clone, Default)]
pub struct KeywordsEvidence {
    vocab: Vocabulary,
}

impl KeywordsEvidence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evidence for KeywordsEvidence {
    fn name(&self) -> &'static str {
        KEYWORDS
    }

    fn extract(&self, record: &ProgramRecord) -> Vec<String> {
        if let Some(keywords) = &record.keywords {
            return dedup_keep_order(keywords.iter().map(|k| k.to_lowercase()).collect());
        }
        let Ok(Some(nodes)) = record.root_nodes() else {
            return Vec::new();
        };
        dedup_keep_order(
            gather_calls(nodes)
                .iter()
                .flat_map(|call| keywords_from_call(call))
                .collect(),
        )
    }

    fn build_vocab(&mut self, collections: &[&Vec<String>]) {
        self.vocab = Vocabulary::build(collections.iter().flat_map(|c| c.iter()));
    }

    /// Stop words are dropped again here: record-level keyword fields are not
    /// pre-filtered.
    fn wrangle(&self, tokens: &[String]) -> Vec<i32> {
        let kept: Vec<String> = tokens
            .iter()
            .filter(|t| !is_stop_word(t))
            .cloned()
            .collect();
        presence_row(&self.vocab, &kept)
    }

    fn width(&self) -> usize {
        self.vocab.len()
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn restore_vocab(&mut self, vocab: Vocabulary) {
        self.vocab = vocab;
    }
}

/// Split a camel-case identifier: a boundary goes before an internal
/// uppercase run and before an uppercase letter following a lowercase letter
/// or digit.
pub fn split_camel(s: &str) -> Vec<String> {
    static UC_RUN: OnceLock<Regex> = OnceLock::new();
    static LC_UC: OnceLock<Regex> = OnceLock::new();
    let uc_run = UC_RUN.get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("camel regex"));
    let lc_uc = LC_UC.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel regex"));

    let s = uc_run.replace_all(s, "$1#$2");
    let s = lc_uc.replace_all(&s, "$1#$2");
    s.split('#').map(str::to_string).collect()
}

/// Keyword set of one call node: dot-qualified signature segments (minus the
/// `java`/`javax` roots), the camel-split call name, and camel-split type
/// names — lower-cased, stop-filtered, deduplicated.
pub fn keywords_from_call(call: &CallNode) -> Vec<String> {
    static GENERICS: OnceLock<Regex> = OnceLock::new();
    let generics = GENERICS.get_or_init(|| Regex::new(r"<.*>").expect("generics regex"));

    let sig = strip_predicate(&call.call);
    let qualified = sig.split('(').next().unwrap_or(sig);
    let qualified = generics.replace_all(qualified, "");

    let mut words: Vec<String> = Vec::new();
    for segment in qualified.split('.') {
        if segment == "java" || segment == "javax" {
            continue;
        }
        words.extend(split_camel(segment));
    }
    if let Some(name) = call_name(call) {
        words.extend(split_camel(&name));
    }
    for ty in types_from_call(call) {
        words.extend(split_camel(&ty));
    }

    dedup_keep_order(
        words
            .into_iter()
            .map(|w| w.to_lowercase())
            .filter(|w| !w.is_empty() && !is_stop_word(w))
            .collect(),
    )
}
