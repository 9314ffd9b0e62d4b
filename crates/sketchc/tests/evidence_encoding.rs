use serde_json::json;

use sketchc::corpus::ProgramRecord;
use sketchc::evidence::{self, Evidence, EvidenceConfig};
use sketchc::vocab::ZERO_FREQ_TOKEN;

use sketch_program::{call_full, program};

fn record(value: serde_json::Value) -> ProgramRecord {
    serde_json::from_value(value).expect("record JSON must parse")
}

fn build(kind: &str, records: &[ProgramRecord]) -> (Box<dyn Evidence>, Vec<Vec<String>>) {
    let mut encoders =
        evidence::from_config(&[EvidenceConfig::named(kind)]).expect("known evidence kind");
    let mut encoder = encoders.remove(0);
    let collections: Vec<Vec<String>> = records.iter().map(|r| encoder.extract(r)).collect();
    let refs: Vec<&Vec<String>> = collections.iter().collect();
    encoder.build_vocab(&refs);
    (encoder, collections)
}

#[test]
fn rejects_unknown_evidence_name() {
    let err = evidence::from_config(&[EvidenceConfig::named("callgraph")])
        .expect_err("unknown kind must fail");
    assert!(err.to_string().contains("callgraph"), "unexpected: {err}");
}

#[test]
fn apicalls_vocab_is_frequency_ranked() {
    let records: Vec<ProgramRecord> = vec![
        record(json!({"apicalls": ["read", "close"]})),
        record(json!({"apicalls": ["read"]})),
        record(json!({"apicalls": ["read", "open"]})),
        record(json!({"apicalls": ["open"]})),
    ];
    let (encoder, _) = build("apicalls", &records);
    assert_eq!(
        encoder.vocab().tokens(),
        ["read", "open", "close", ZERO_FREQ_TOKEN]
    );
}

#[test]
fn apicalls_wrangle_marks_presence_and_drops_unknowns() {
    let records: Vec<ProgramRecord> = vec![
        record(json!({"apicalls": ["read", "close"]})),
        record(json!({"apicalls": ["read"]})),
    ];
    let (encoder, _) = build("apicalls", &records);
    // Vocabulary: [read, close, C0].
    assert_eq!(encoder.width(), 3);
    let row = encoder.wrangle(&["close".to_string(), "never_seen".to_string()]);
    assert_eq!(row, [0, 1, 0]);
}

#[test]
fn apicalls_derive_from_ast_when_field_is_absent() {
    let rec = record(program(vec![
        call_full("java.io.BufferedReader.readLine()", &[], None),
        call_full("java.io.BufferedReader()", &[], None),
    ]));
    let (_, collections) = build("apicalls", std::slice::from_ref(&rec));
    // The constructor-style name is dropped by the lowercase convention.
    assert_eq!(collections[0], ["readLine"]);
}

#[test]
fn types_derive_from_signature_throws_and_returns() {
    let rec = record(program(vec![call_full(
        "java.io.BufferedReader.readLine()",
        &["java.io.IOException"],
        Some("java.lang.String"),
    )]));
    let (_, collections) = build("types", std::slice::from_ref(&rec));
    assert_eq!(
        collections[0],
        ["BufferedReader", "IOException", "String"]
    );
}

#[test]
fn types_field_wins_over_derivation() {
    let mut value = program(vec![call_full("java.util.List.clear()", &[], None)]);
    value["types"] = json!(["Widget", "Widget", "Gadget"]);
    let rec = record(value);
    let (_, collections) = build("types", std::slice::from_ref(&rec));
    assert_eq!(collections[0], ["Widget", "Gadget"]);
}

#[test]
fn keywords_are_lowercased_and_stop_filtered() {
    let rec = record(program(vec![call_full(
        "java.io.BufferedReader.readLine()",
        &[],
        None,
    )]));
    let (encoder, collections) = build("keywords", std::slice::from_ref(&rec));
    for expected in ["io", "buffered", "reader", "read", "line"] {
        assert!(
            collections[0].iter().any(|k| k == expected),
            "missing {expected:?} in {:?}",
            collections[0]
        );
    }
    // Stop words never make it into a wrangled row even if handed in.
    let row = encoder.wrangle(&["the".to_string(), "line".to_string()]);
    let line_id = encoder.vocab().id("line").expect("line is in vocab");
    assert_eq!(row.iter().sum::<i32>(), 1);
    assert_eq!(row[line_id], 1);
}

#[test]
fn doctext_uses_loaded_embedding_vocab() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("embeddings.txt");
    std::fs::write(&path, "stream 0.1 0.2\nline 0.3 0.4\n").expect("write embeddings");

    let mut encoders = evidence::from_config(&[EvidenceConfig {
        name: "doctext".to_string(),
        max_words: 3,
        embedding_file: Some(path),
    }])
    .expect("doctext config");
    let encoder = encoders.remove(0);

    // <unk> takes id 0; file words follow in order.
    assert_eq!(encoder.vocab().tokens(), ["<unk>", "stream", "line"]);

    let rec = record(json!({"doc": "reads a line from the stream"}));
    let tokens = encoder.extract(&rec);
    assert_eq!(tokens, ["stream", "the", "from", "line", "a", "reads"]);

    // "the"/"a" are stop words, "from"/"reads" are out of vocabulary.
    assert_eq!(encoder.wrangle(&tokens), [1, 2, 0, 2]);
}
