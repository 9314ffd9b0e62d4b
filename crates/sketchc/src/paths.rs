use crate::ast::AstNode;

pub const SUBTREE_LABEL: &str = "subtree";
pub const BRANCH_LABEL: &str = "branch";
pub const EXCEPT_LABEL: &str = "except";
pub const LOOP_LABEL: &str = "loop";
pub const STOP_LABEL: &str = "stop";

/// Whether a path step descends into a nested block or continues at the same
/// nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabel {
    Child,
    Sibling,
}

impl EdgeLabel {
    pub fn is_child(self) -> bool {
        matches!(self, EdgeLabel::Child)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub label: String,
    pub edge: EdgeLabel,
}

impl PathStep {
    pub fn child(label: impl Into<String>) -> Self {
        PathStep {
            label: label.into(),
            edge: EdgeLabel::Child,
        }
    }

    pub fn sibling(label: impl Into<String>) -> Self {
        PathStep {
            label: label.into(),
            edge: EdgeLabel::Sibling,
        }
    }
}

/// One linearized route through a sketch's control flow.
pub type Path = Vec<PathStep>;

/// Enumerate every control-flow route through `nodes` as a labeled path.
///
/// Each returned path ends with a single `(stop, Sibling)` terminal step.
/// For every compound node, the horizontal paths (skipping the node) are
/// enumerated before the vertical paths (entering it); callers and tests rely
/// on this ordering.
///
/// A `subtree` node below the root is a corpus-schema violation and yields an
/// error describing it.
pub fn extract_paths(nodes: &[AstNode]) -> Result<Vec<Path>, String> {
    let mut paths = extract_from(nodes, 0)?;
    for path in &mut paths {
        path.push(PathStep::sibling(STOP_LABEL));
    }
    Ok(paths)
}

/// Recursive core. Returned paths carry no terminal step; the public entry
/// appends exactly one per finished path.
fn extract_from(nodes: &[AstNode], idx: usize) -> Result<Vec<Path>, String> {
    // Maximal leading run of calls, each a sibling step.
    let mut cons_calls: Path = Vec::new();
    let mut i = idx;
    while let Some(AstNode::Call(call)) = nodes.get(i) {
        cons_calls.push(PathStep::sibling(call.call.clone()));
        i += 1;
    }
    if i == nodes.len() {
        return Ok(vec![cons_calls]);
    }

    let (tag, vertical_tails) = match &nodes[i] {
        AstNode::Call(_) => unreachable!("leading call run consumed above"),
        AstNode::SubTree { .. } => {
            return Err("subtree node is only valid at the sketch root".to_string());
        }
        AstNode::Branch {
            cond,
            then_nodes,
            else_nodes,
        } => {
            let cond_path = single_cond_path(cond)?;
            let then_paths = extract_from(then_nodes, 0)?;
            let else_paths = extract_from(else_nodes, 0)?;
            // Every else path continues the first then path; remaining then
            // paths stand alone.
            let mut combined: Vec<Path> = else_paths
                .into_iter()
                .map(|p| concat(&then_paths[0], p))
                .collect();
            combined.extend(then_paths.into_iter().skip(1));
            let tails = combined
                .into_iter()
                .map(|p| concat(&cond_path, p))
                .collect();
            (BRANCH_LABEL, tails)
        }
        AstNode::Except {
            try_nodes,
            catch_nodes,
        } => {
            let try_paths = extract_from(try_nodes, 0)?;
            let catch_paths = extract_from(catch_nodes, 0)?;
            let mut combined: Vec<Path> = catch_paths
                .into_iter()
                .map(|p| concat(&try_paths[0], p))
                .collect();
            combined.extend(try_paths.into_iter().skip(1));
            (EXCEPT_LABEL, combined)
        }
        AstNode::Loop { cond, body } => {
            let cond_path = single_cond_path(cond)?;
            let tails = extract_from(body, 0)?
                .into_iter()
                .map(|p| concat(&cond_path, p))
                .collect();
            (LOOP_LABEL, tails)
        }
    };

    // Horizontal paths (skip the compound node) come before vertical paths
    // (enter it).
    let continuation = extract_from(nodes, i + 1)?;
    let mut out = Vec::with_capacity(continuation.len() + vertical_tails.len());
    for tail in continuation {
        let mut path = cons_calls.clone();
        path.push(PathStep::sibling(tag));
        path.extend(tail);
        out.push(path);
    }
    for tail in vertical_tails {
        let mut path = cons_calls.clone();
        path.push(PathStep::child(tag));
        path.extend(tail);
        out.push(path);
    }
    Ok(out)
}

/// A condition block is straight-line by construction: it must yield exactly
/// one path. That is an input invariant, so it is asserted rather than
/// silently truncated.
fn single_cond_path(cond: &[AstNode]) -> Result<Path, String> {
    let mut paths = extract_from(cond, 0)?;
    assert!(
        paths.len() == 1,
        "condition block must not contain compound control flow ({} paths)",
        paths.len()
    );
    Ok(paths.remove(0))
}

fn concat(prefix: &Path, tail: Path) -> Path {
    let mut out = prefix.clone();
    out.extend(tail);
    out
}
