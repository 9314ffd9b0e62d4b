use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ast::AstNode;

/// One raw program record. Every field is optional; a record without an AST
/// is skipped by the compiler, and absent evidence fields are derived from
/// the AST's call nodes where possible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<AstNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apicalls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl ProgramRecord {
    /// The root node sequence, if this record carries an AST rooted at a
    /// subtree node. A root of any other kind is a schema violation.
    pub fn root_nodes(&self) -> Result<Option<&[AstNode]>, String> {
        match &self.ast {
            None => Ok(None),
            Some(AstNode::SubTree { nodes }) => Ok(Some(nodes)),
            Some(other) => Err(format!(
                "sketch root must be a subtree node, got {}",
                node_kind(other)
            )),
        }
    }
}

fn node_kind(node: &AstNode) -> &'static str {
    match node {
        AstNode::Call(_) => "call",
        AstNode::Branch { .. } => "branch",
        AstNode::Except { .. } => "except",
        AstNode::Loop { .. } => "loop",
        AstNode::SubTree { .. } => "subtree",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub programs: Vec<ProgramRecord>,
}

impl Corpus {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("parse corpus JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read corpus file: {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse corpus file: {}", path.display()))
    }
}
