use std::collections::BTreeMap;
use std::path::Path as FsPath;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use sketchc_contracts::{
    CALLMAP_SCHEMA_VERSION, ENCODER_SNAPSHOT_SCHEMA_VERSION, SKETCH_CORPUS_SCHEMA_VERSION,
};

use crate::ast::{gather_calls, CallNode};
use crate::batch::{Batch, BatchIterator};
use crate::corpus::Corpus;
use crate::evidence::{self, Evidence, EvidenceConfig};
use crate::paths::{extract_paths, Path, PathStep, SUBTREE_LABEL};
use crate::util::sha256_hex;
use crate::validate::validate_sketch_paths;
use crate::vocab::Vocabulary;

/// Everything the compilation contract depends on, including the shuffle
/// seed: two runs with equal config and corpus produce identical batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Paths must be strictly shorter than this before the root step is
    /// prepended.
    pub max_ast_depth: usize,
    pub batch_size: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub evidence: Vec<EvidenceConfig>,
}

fn default_seed() -> u64 {
    12
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerErrorKind {
    /// The corpus does not conform to the expected schema.
    Schema,
    /// The configuration cannot produce a dataset.
    Config,
    Io,
    Internal,
    /// The batch iterator was stepped past its end without a reset.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub kind: CompilerErrorKind,
    pub message: String,
}

impl CompilerError {
    pub fn new(kind: CompilerErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            CompilerErrorKind::Schema => "schema",
            CompilerErrorKind::Config => "config",
            CompilerErrorKind::Io => "io",
            CompilerErrorKind::Internal => "internal",
            CompilerErrorKind::Exhausted => "exhausted",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl std::error::Error for CompilerError {}

/// One training example: one labeled path through one program, with that
/// program's evidence token collections. Multiple data points share a
/// `prog_id` when a program yields multiple valid paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    pub prog_id: usize,
    pub evidence: Vec<Vec<String>>,
    pub path: Path,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Programs carrying an AST, whether or not they survived validation.
    pub programs_seen: usize,
    /// Programs dropped by a recoverable validation failure.
    pub programs_ignored: usize,
    /// Retained data points after truncation to a batch-size multiple.
    pub data_points: usize,
}

/// The frozen output of a compilation run: immutable batches plus the
/// vocabularies and call cache needed to interpret or reproduce them.
#[derive(Debug)]
pub struct CompiledCorpus {
    pub config: CompilerConfig,
    pub decoder_vocab: Vocabulary,
    pub encoders: Vec<Box<dyn Evidence>>,
    pub callmap: BTreeMap<String, CallNode>,
    pub stats: CompileStats,
    batches: Vec<Batch>,
}

impl CompiledCorpus {
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn batches(&self) -> BatchIterator<'_> {
        BatchIterator::new(&self.batches)
    }

    pub fn callmap_artifact(&self) -> CallmapArtifact {
        CallmapArtifact {
            schema_version: CALLMAP_SCHEMA_VERSION.to_string(),
            calls: self.callmap.clone(),
        }
    }

    /// Stable content hash of the callmap artifact, for external tooling to
    /// detect changes without re-reading the whole file.
    pub fn callmap_fingerprint(&self) -> Result<String, CompilerError> {
        let bytes = to_json_bytes(&self.callmap_artifact())?;
        Ok(sha256_hex(&bytes))
    }

    pub fn write_callmap(&self, path: &FsPath) -> Result<(), CompilerError> {
        write_json(path, &self.callmap_artifact())
    }

    pub fn snapshot(&self) -> EncoderSnapshot {
        EncoderSnapshot {
            schema_version: ENCODER_SNAPSHOT_SCHEMA_VERSION.to_string(),
            config: self.config.clone(),
            decoder_tokens: self.decoder_vocab.tokens().to_vec(),
            evidence: self
                .encoders
                .iter()
                .map(|ev| EvidenceVocabSnapshot {
                    name: ev.name().to_string(),
                    tokens: ev.vocab().tokens().to_vec(),
                })
                .collect(),
        }
    }

    pub fn write_snapshot(&self, path: &FsPath) -> Result<(), CompilerError> {
        write_json(path, &self.snapshot())
    }
}

/// Deduplicated registry of every distinct call identity observed across the
/// corpus, keyed by signature; persisted for external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallmapArtifact {
    pub schema_version: String,
    pub calls: BTreeMap<String, CallNode>,
}

pub fn read_callmap(path: &FsPath) -> Result<CallmapArtifact, CompilerError> {
    read_json(path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceVocabSnapshot {
    pub name: String,
    pub tokens: Vec<String>,
}

/// Enough state to reconstruct every encoder (and the decoder vocabulary)
/// deterministically without the training corpus, for inference-time reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderSnapshot {
    pub schema_version: String,
    pub config: CompilerConfig,
    pub decoder_tokens: Vec<String>,
    pub evidence: Vec<EvidenceVocabSnapshot>,
}

pub fn read_snapshot(path: &FsPath) -> Result<EncoderSnapshot, CompilerError> {
    read_json(path)
}

/// Rebuild the decoder vocabulary and all evidence encoders from a snapshot.
pub fn encoders_from_snapshot(
    snapshot: &EncoderSnapshot,
) -> Result<(Vocabulary, Vec<Box<dyn Evidence>>), CompilerError> {
    if snapshot.schema_version != ENCODER_SNAPSHOT_SCHEMA_VERSION {
        return Err(CompilerError::new(
            CompilerErrorKind::Schema,
            format!(
                "unsupported snapshot schema_version: {:?} (expected {:?})",
                snapshot.schema_version, ENCODER_SNAPSHOT_SCHEMA_VERSION
            ),
        ));
    }
    let mut encoders = build_encoders(&snapshot.config.evidence)?;
    if encoders.len() != snapshot.evidence.len() {
        return Err(CompilerError::new(
            CompilerErrorKind::Schema,
            format!(
                "snapshot lists {} evidence vocabularies for {} configured kinds",
                snapshot.evidence.len(),
                encoders.len()
            ),
        ));
    }
    for (encoder, saved) in encoders.iter_mut().zip(&snapshot.evidence) {
        if encoder.name() != saved.name {
            return Err(CompilerError::new(
                CompilerErrorKind::Schema,
                format!(
                    "snapshot evidence order mismatch: expected {:?}, found {:?}",
                    encoder.name(),
                    saved.name
                ),
            ));
        }
        encoder.restore_vocab(Vocabulary::from_tokens(saved.tokens.clone()));
    }
    Ok((Vocabulary::from_tokens(snapshot.decoder_tokens.clone()), encoders))
}

pub fn compile_corpus_file(
    path: &FsPath,
    config: &CompilerConfig,
) -> Result<CompiledCorpus, CompilerError> {
    let corpus = Corpus::load(path)
        .map_err(|e| CompilerError::new(CompilerErrorKind::Io, format!("{e:#}")))?;
    compile_corpus(&corpus, config)
}

/// Run the full scan: extract evidence and paths per program, validate, drop
/// and count rejected programs, explode survivors into data points, shuffle
/// with the configured seed, truncate to a batch-size multiple, build every
/// vocabulary, and wrangle the result into batches.
pub fn compile_corpus(
    corpus: &Corpus,
    config: &CompilerConfig,
) -> Result<CompiledCorpus, CompilerError> {
    if config.batch_size == 0 {
        return Err(CompilerError::new(
            CompilerErrorKind::Config,
            "batch_size must be positive".to_string(),
        ));
    }
    if config.max_ast_depth < 2 {
        return Err(CompilerError::new(
            CompilerErrorKind::Config,
            format!(
                "max_ast_depth must be at least 2, got {}",
                config.max_ast_depth
            ),
        ));
    }
    // An absent version is accepted for hand-written corpora; a present one
    // must match.
    if let Some(version) = &corpus.schema_version {
        if version != SKETCH_CORPUS_SCHEMA_VERSION {
            return Err(CompilerError::new(
                CompilerErrorKind::Schema,
                format!(
                    "unsupported corpus schema_version: {version:?} (expected {:?})",
                    SKETCH_CORPUS_SCHEMA_VERSION
                ),
            ));
        }
    }
    let mut encoders = build_encoders(&config.evidence)?;

    let mut data_points: Vec<DataPoint> = Vec::new();
    let mut callmap: BTreeMap<String, CallNode> = BTreeMap::new();
    let mut seen = 0usize;
    let mut ignored = 0usize;
    let mut surviving = 0usize;

    for record in &corpus.programs {
        let root = record
            .root_nodes()
            .map_err(|msg| CompilerError::new(CompilerErrorKind::Schema, msg))?;
        let Some(nodes) = root else {
            // Records without an AST are silently skipped.
            continue;
        };
        seen += 1;

        let evidence_tokens: Vec<Vec<String>> =
            encoders.iter().map(|ev| ev.extract(record)).collect();
        let paths = extract_paths(nodes)
            .map_err(|msg| CompilerError::new(CompilerErrorKind::Schema, msg))?;
        if let Err(err) = validate_sketch_paths(nodes, &paths, config.max_ast_depth) {
            if err.is_recoverable() {
                // Validity is decided per whole program: one bad path drops
                // all of them.
                ignored += 1;
                continue;
            }
            return Err(CompilerError::new(
                CompilerErrorKind::Schema,
                err.to_string(),
            ));
        }

        for path in paths {
            let mut full = Path::with_capacity(path.len() + 1);
            full.push(PathStep::child(SUBTREE_LABEL));
            full.extend(path);
            data_points.push(DataPoint {
                prog_id: surviving,
                evidence: evidence_tokens.clone(),
                path: full,
            });
        }
        for call in gather_calls(nodes) {
            if !callmap.contains_key(&call.call) {
                callmap.insert(call.call.clone(), call.clone());
            }
        }
        surviving += 1;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    data_points.shuffle(&mut rng);

    let num_batches = data_points.len() / config.batch_size;
    if num_batches == 0 {
        return Err(CompilerError::new(
            CompilerErrorKind::Config,
            format!(
                "not enough data: {} data points for batch size {}",
                data_points.len(),
                config.batch_size
            ),
        ));
    }
    data_points.truncate(num_batches * config.batch_size);

    let decoder_vocab = Vocabulary::build(
        data_points
            .iter()
            .flat_map(|dp| dp.path.iter().map(|step| step.label.as_str())),
    );
    for (k, encoder) in encoders.iter_mut().enumerate() {
        let collections: Vec<&Vec<String>> =
            data_points.iter().map(|dp| &dp.evidence[k]).collect();
        encoder.build_vocab(&collections);
    }

    let mut batches = Vec::with_capacity(num_batches);
    for chunk in data_points.chunks(config.batch_size) {
        batches.push(wrangle_batch(chunk, config, &decoder_vocab, &encoders)?);
    }

    let stats = CompileStats {
        programs_seen: seen,
        programs_ignored: ignored,
        data_points: data_points.len(),
    };
    Ok(CompiledCorpus {
        config: config.clone(),
        decoder_vocab,
        encoders,
        callmap,
        stats,
        batches,
    })
}

fn wrangle_batch(
    chunk: &[DataPoint],
    config: &CompilerConfig,
    decoder_vocab: &Vocabulary,
    encoders: &[Box<dyn Evidence>],
) -> Result<Batch, CompilerError> {
    let depth = config.max_ast_depth;
    let mut batch = Batch {
        prog_ids: Vec::with_capacity(chunk.len()),
        nodes: Vec::with_capacity(chunk.len()),
        edges: Vec::with_capacity(chunk.len()),
        targets: Vec::with_capacity(chunk.len()),
        evidence: vec![Vec::with_capacity(chunk.len()); encoders.len()],
    };
    for dp in chunk {
        let mut node_row = vec![0i32; depth];
        let mut edge_row = vec![false; depth];
        for (d, step) in dp.path.iter().enumerate() {
            let id = decoder_vocab.id(&step.label).ok_or_else(|| {
                CompilerError::new(
                    CompilerErrorKind::Internal,
                    format!("label missing from decoder vocabulary: {:?}", step.label),
                )
            })?;
            node_row[d] = id as i32;
            edge_row[d] = step.edge.is_child();
        }
        // Target = node sequence shifted left by one; the final column stays
        // zero.
        let len = dp.path.len();
        let mut target_row = vec![0i32; depth];
        target_row[..len - 1].copy_from_slice(&node_row[1..len]);

        batch.prog_ids.push(dp.prog_id as i32);
        batch.nodes.push(node_row);
        batch.edges.push(edge_row);
        batch.targets.push(target_row);
        for (k, encoder) in encoders.iter().enumerate() {
            batch.evidence[k].push(encoder.wrangle(&dp.evidence[k]));
        }
    }
    Ok(batch)
}

fn build_encoders(configs: &[EvidenceConfig]) -> Result<Vec<Box<dyn Evidence>>, CompilerError> {
    evidence::from_config(configs)
        .map_err(|e| CompilerError::new(CompilerErrorKind::Config, format!("{e:#}")))
}

fn to_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CompilerError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| CompilerError::new(CompilerErrorKind::Internal, format!("encode JSON: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_json<T: Serialize>(path: &FsPath, value: &T) -> Result<(), CompilerError> {
    let bytes = to_json_bytes(value)?;
    std::fs::write(path, &bytes).map_err(|e| {
        CompilerError::new(
            CompilerErrorKind::Io,
            format!("write {}: {e}", path.display()),
        )
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &FsPath) -> Result<T, CompilerError> {
    let bytes = std::fs::read(path).map_err(|e| {
        CompilerError::new(
            CompilerErrorKind::Io,
            format!("read {}: {e}", path.display()),
        )
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        CompilerError::new(
            CompilerErrorKind::Schema,
            format!("parse {}: {e}", path.display()),
        )
    })
}
