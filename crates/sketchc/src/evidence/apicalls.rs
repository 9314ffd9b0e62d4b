use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{gather_calls, CallNode};
use crate::corpus::ProgramRecord;
use crate::vocab::Vocabulary;

use super::{dedup_keep_order, presence_row, Evidence, APICALLS};

/// Deduplicated set of API call names per program.
#[derive(Debug, Clone, Default)]
pub struct ApiCallsEvidence {
    vocab: Vocabulary,
}

impl ApiCallsEvidence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evidence for ApiCallsEvidence {
    fn name(&self) -> &'static str {
        APICALLS
    }

    fn extract(&self, record: &ProgramRecord) -> Vec<String> {
        if let Some(apicalls) = &record.apicalls {
            return dedup_keep_order(apicalls.clone());
        }
        let Ok(Some(nodes)) = record.root_nodes() else {
            return Vec::new();
        };
        dedup_keep_order(
            gather_calls(nodes)
                .iter()
                .filter_map(|call| call_name(call))
                .collect(),
        )
    }

    fn build_vocab(&mut self, collections: &[&Vec<String>]) {
        self.vocab = Vocabulary::build(collections.iter().flat_map(|c| c.iter()));
    }

    fn wrangle(&self, tokens: &[String]) -> Vec<i32> {
        presence_row(&self.vocab, tokens)
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

/// API call name of a call node: the last dot-qualified segment of the
/// signature before the argument list, generics stripped. Names starting with
/// an uppercase letter are constructors by Java convention and yield nothing.
pub fn call_name(call: &CallNode) -> Option<String> {
    let sig = strip_predicate(&call.call);
    let before_args = sig.split('(').next().unwrap_or(sig);
    let name = before_args.rsplit('.').next().unwrap_or(before_args);
    let name = name.split('<').next().unwrap_or(name);
    if name.chars().next()?.is_lowercase() {
        Some(name.to_string())
    } else {
        None
    }
}

/// Strip a leading `$...$` predicate wrapper from a signature.
pub(crate) fn strip_predicate(sig: &str) -> &str {
    static PREDICATE: OnceLock<Regex> = OnceLock::new();
    let re = PREDICATE.get_or_init(|| Regex::new(r"^\$.*\$").expect("predicate regex"));
    match re.find(sig) {
        Some(m) => &sig[m.end()..],
        None => sig,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(sig: &str) -> CallNode {
        CallNode {
            call: sig.to_string(),
            throws: Vec::new(),
            returns: None,
        }
    }

    #[test]
    fn takes_last_segment_before_args() {
        assert_eq!(
            call_name(&call("java.io.BufferedReader.readLine()")),
            Some("readLine".to_string())
        );
    }

    #[test]
    fn drops_constructor_names() {
        assert_eq!(call_name(&call("java.io.BufferedReader()")), None);
    }

    #[test]
    fn strips_predicate_and_generics() {
        assert_eq!(
            call_name(&call("$pred$java.util.List<java.lang.String>.add(java.lang.String)")),
            Some("add".to_string())
        );
    }
}
