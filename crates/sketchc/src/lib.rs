//! Compiles a corpus of control-flow-annotated program sketches into
//! fixed-shape, numerically encoded training batches.
//!
//! The pipeline is: parse the corpus ([`corpus`]), enumerate every labeled
//! control-flow path per sketch ([`paths`]), reject sketches that cannot be
//! represented by a fixed-depth decoder ([`validate`]), build frequency-ranked
//! vocabularies and wrangle evidence into numeric rows ([`vocab`],
//! [`evidence`]), then shuffle deterministically and split into batches
//! ([`compile`], [`batch`]).

pub mod ast;
pub mod batch;
pub mod compile;
pub mod corpus;
pub mod evidence;
pub mod paths;
pub mod validate;
pub mod vocab;

mod util;
