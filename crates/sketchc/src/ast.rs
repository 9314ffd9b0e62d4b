use serde::{Deserialize, Serialize};

/// A single API call with its signature and optional exception/return types.
///
/// Structural equality is what the repeated-call validator compares, so every
/// field participates in `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    pub call: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

/// One node of a program sketch.
///
/// The JSON form is internally tagged by `"node"`; an unrecognized tag fails
/// deserialization, which the compiler treats as a fatal corpus-schema
/// violation rather than a bad-but-parseable program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum AstNode {
    Call(CallNode),
    Branch {
        #[serde(default)]
        cond: Vec<AstNode>,
        #[serde(default, rename = "then")]
        then_nodes: Vec<AstNode>,
        #[serde(default, rename = "else")]
        else_nodes: Vec<AstNode>,
    },
    Except {
        #[serde(default, rename = "try")]
        try_nodes: Vec<AstNode>,
        #[serde(default, rename = "catch")]
        catch_nodes: Vec<AstNode>,
    },
    Loop {
        #[serde(default)]
        cond: Vec<AstNode>,
        #[serde(default)]
        body: Vec<AstNode>,
    },
    SubTree {
        #[serde(default)]
        nodes: Vec<AstNode>,
    },
}

/// Collect every call node in the tree, in traversal order.
///
/// The order is stable (depth-first, condition before body) so that callmap
/// insertion and evidence derivation are deterministic.
pub fn gather_calls<'a>(nodes: &'a [AstNode]) -> Vec<&'a CallNode> {
    let mut out = Vec::new();
    gather_into(nodes, &mut out);
    out
}

fn gather_into<'a>(nodes: &'a [AstNode], out: &mut Vec<&'a CallNode>) {
    for node in nodes {
        match node {
            AstNode::Call(call) => out.push(call),
            AstNode::Branch {
                cond,
                then_nodes,
                else_nodes,
            } => {
                gather_into(cond, out);
                gather_into(then_nodes, out);
                gather_into(else_nodes, out);
            }
            AstNode::Except {
                try_nodes,
                catch_nodes,
            } => {
                gather_into(try_nodes, out);
                gather_into(catch_nodes, out);
            }
            AstNode::Loop { cond, body } => {
                gather_into(cond, out);
                gather_into(body, out);
            }
            AstNode::SubTree { nodes } => gather_into(nodes, out),
        }
    }
}
