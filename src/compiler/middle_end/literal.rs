//! Conversion of value nodes into `Literal`s

use crate::compiler::frontend::ast::{Node, NodeKind, SyntaxTree};
use crate::compiler::middle_end::struct_decoder::decode_struct;
use crate::error::{CompilerError, Result};
use crate::types::Literal;

/// Convert a typed value node (the child of a `value` node) into a `Literal`.
///
/// Booleans are lenient: only the exact text `true` is true. Node kinds with
/// no literal meaning fall back to their raw source text.
pub fn parse_literal(tree: &SyntaxTree, node: &Node) -> Result<Literal> {
    match node.kind() {
        NodeKind::String => Ok(Literal::String(tree.unquoted(node).to_string())),
        NodeKind::Int => {
            let text = tree.text(node);
            text.parse::<i64>()
                .map(Literal::Integer)
                .map_err(|e| malformed_number(tree, node, e.to_string()))
        }
        NodeKind::Float => {
            let text = tree.text(node);
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|e| malformed_number(tree, node, e.to_string()))
        }
        NodeKind::Bool => Ok(Literal::Boolean(tree.text(node) == "true")),
        NodeKind::Struct => decode_struct(tree, node).map(Literal::Struct),
        NodeKind::Identifier
        | NodeKind::Method
        | NodeKind::Key
        | NodeKind::Value
        | NodeKind::Import
        | NodeKind::Route
        | NodeKind::SourceFile => Ok(Literal::String(tree.text(node).to_string())),
    }
}

fn malformed_number(tree: &SyntaxTree, node: &Node, reason: String) -> CompilerError {
    CompilerError::MalformedNumber {
        file: tree.file().to_string(),
        line: node.start_line(),
        text: tree.text(node).to_string(),
        reason,
    }
}
