//! Pinned schema identifiers for every artifact the corpus compiler reads or
//! writes: the input corpus, the persisted callmap cache, and the encoder
//! snapshot. Each identifier carries its own semver; bump it whenever the
//! corresponding JSON shape changes.

pub const SKETCH_CORPUS_SCHEMA_VERSION: &str = "sketchc.corpus@0.1.0";
pub const CALLMAP_SCHEMA_VERSION: &str = "sketchc.callmap@0.1.0";
pub const ENCODER_SNAPSHOT_SCHEMA_VERSION: &str = "sketchc.encoders@0.1.0";
