use crate::ast::AstNode;
use crate::paths::{Path, BRANCH_LABEL, EXCEPT_LABEL, LOOP_LABEL};

/// Outcome of the structural training-data checks.
///
/// `PathTooLong` and `InvalidSketch` are recoverable: the compiler drops the
/// offending program, counts it, and moves on. `UnexpectedNode` signals a
/// corpus-schema violation and aborts compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// A path exceeds the decoder depth, or repeats a compound kind.
    PathTooLong,
    /// Two structurally identical calls appear consecutively.
    InvalidSketch,
    /// A node kind that must not occur at this position.
    UnexpectedNode(String),
}

impl SketchError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            SketchError::PathTooLong | SketchError::InvalidSketch => true,
            SketchError::UnexpectedNode(_) => false,
        }
    }
}

impl std::fmt::Display for SketchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SketchError::PathTooLong => write!(f, "path too long for the configured depth"),
            SketchError::InvalidSketch => write!(f, "invalid sketch: repeated consecutive call"),
            SketchError::UnexpectedNode(what) => write!(f, "unexpected node: {what}"),
        }
    }
}

impl std::error::Error for SketchError {}

/// Decide whether a sketch and its extracted paths are usable training data:
/// no call repeated in immediate succession anywhere in the tree, no path at
/// or beyond `max_ast_depth` steps, and no compound kind occurring twice on a
/// single path.
pub fn validate_sketch_paths(
    nodes: &[AstNode],
    paths: &[Path],
    max_ast_depth: usize,
) -> Result<(), SketchError> {
    check_call_repeats(nodes)?;
    for path in paths {
        if path.len() >= max_ast_depth {
            return Err(SketchError::PathTooLong);
        }
        // A compound kind repeated along one path cannot be represented by
        // the fixed-depth decoder either, so it maps to the same error.
        for tag in [BRANCH_LABEL, LOOP_LABEL, EXCEPT_LABEL] {
            if path.iter().filter(|step| step.label == tag).count() > 1 {
                return Err(SketchError::PathTooLong);
            }
        }
    }
    Ok(())
}

/// Whole-tree check: within any single node sequence, at any nesting level,
/// no two structurally identical call nodes may appear consecutively.
pub fn check_call_repeats(nodes: &[AstNode]) -> Result<(), SketchError> {
    for pair in nodes.windows(2) {
        if matches!(pair[1], AstNode::Call(_)) && pair[1] == pair[0] {
            return Err(SketchError::InvalidSketch);
        }
    }
    for node in nodes {
        match node {
            AstNode::Call(_) => {}
            AstNode::Branch {
                cond,
                then_nodes,
                else_nodes,
            } => {
                check_call_repeats(cond)?;
                check_call_repeats(then_nodes)?;
                check_call_repeats(else_nodes)?;
            }
            AstNode::Except {
                try_nodes,
                catch_nodes,
            } => {
                check_call_repeats(try_nodes)?;
                check_call_repeats(catch_nodes)?;
            }
            AstNode::Loop { cond, body } => {
                check_call_repeats(cond)?;
                check_call_repeats(body)?;
            }
            AstNode::SubTree { .. } => {
                return Err(SketchError::UnexpectedNode(
                    "subtree below the sketch root".to_string(),
                ));
            }
        }
    }
    Ok(())
}
