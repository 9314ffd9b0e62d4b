use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{gather_calls, CallNode};
use crate::corpus::ProgramRecord;
use crate::vocab::Vocabulary;

use super::{dedup_keep_order, presence_row, Evidence, TYPES};

/// Deduplicated set of type names per program, extracted from fully-qualified
/// type strings in call signatures, throws clauses and return types.
#[derive(Debug, Clone, Default)]
pub struct TypesEvidence {
    vocab: Vocabulary,
}

impl TypesEvidence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evidence for TypesEvidence {
    fn name(&self) -> &'static str {
        TYPES
    }

    fn extract(&self, record: &ProgramRecord) -> Vec<String> {
        if let Some(types) = &record.types {
            return dedup_keep_order(types.clone());
        }
        let Ok(Some(nodes)) = record.root_nodes() else {
            return Vec::new();
        };
        dedup_keep_order(
            gather_calls(nodes)
                .iter()
                .flat_map(|call| types_from_call(call))
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

const PRIMITIVES: &[(&str, &str)] = &[
    ("byte", "Byte"),
    ("short", "Short"),
    ("int", "Integer"),
    ("long", "Long"),
    ("float", "Float"),
    ("double", "Double"),
    ("boolean", "Boolean"),
    ("char", "Character"),
];

/// Type names in one fully-qualified string: the innermost capitalized
/// segment of each `java.*`/`javax.*` qualified name, plus the boxed form of
/// any primitive keyword appearing as a whole word.
pub fn type_names(s: &str) -> Vec<String> {
    static QUALIFIED: OnceLock<Regex> = OnceLock::new();
    let re = QUALIFIED
        .get_or_init(|| Regex::new(r"java[x]?\.(\w*)\.(\w*)(\.([A-Z]\w*))*").expect("type regex"));

    let mut out = Vec::new();
    for caps in re.captures_iter(s) {
        // The repeated group keeps its last match: the innermost nested class
        // name wins over the outer one.
        let name = caps
            .get(4)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name {
            out.push(name);
        }
    }
    for ((_, boxed), re) in PRIMITIVES.iter().zip(primitive_regexes()) {
        if re.is_match(s) {
            out.push(boxed.to_string());
        }
    }
    dedup_keep_order(out)
}

fn primitive_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        PRIMITIVES
            .iter()
            .map(|(kw, _)| Regex::new(&format!(r"\b{kw}\b")).expect("primitive regex"))
            .collect()
    })
}

/// Types referenced by one call node: its signature, every throws clause and
/// the return type.
pub fn types_from_call(call: &CallNode) -> Vec<String> {
    let mut out = type_names(&call.call);
    for throw in &call.throws {
        out.extend(type_names(throw));
    }
    if let Some(returns) = &call.returns {
        out.extend(type_names(returns));
    }
    dedup_keep_order(out)
}
