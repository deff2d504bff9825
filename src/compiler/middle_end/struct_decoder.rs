//! Decoding of struct literal nodes into ordered key/value mappings

use crate::compiler::frontend::ast::{Node, NodeKind, SyntaxTree};
use crate::compiler::middle_end::literal::parse_literal;
use crate::error::{CompilerError, Result};
use crate::types::StructLiteral;

/// Walk a `struct` node's `key`/`value` children into a `StructLiteral`.
///
/// Keys and values are paired by position. A node whose key and value counts
/// disagree is rejected with `KeyValueMismatch`. No per-key validation happens
/// here; callers decide what each key may hold.
pub fn decode_struct(tree: &SyntaxTree, node: &Node) -> Result<StructLiteral> {
    let mut keys: Vec<(String, usize)> = Vec::new();
    let mut values = Vec::new();

    for child in node.named_children() {
        match child.kind() {
            NodeKind::Key => keys.push((key_text(tree, child).to_string(), child.start_line())),
            NodeKind::Value => {
                // a value without an inner node contributes nothing and surfaces as a mismatch
                if let Some(inner) = child.named_child(0) {
                    values.push(parse_literal(tree, inner)?);
                }
            }
            _ => {}
        }
    }

    if keys.len() != values.len() {
        return Err(CompilerError::KeyValueMismatch {
            file: tree.file().to_string(),
            line: node.start_line(),
            keys: keys.len(),
            values: values.len(),
        });
    }

    let mut decoded = StructLiteral::new();
    for ((key, line), value) in keys.into_iter().zip(values) {
        if let Some(previous) = decoded.insert(key.clone(), value, line) {
            log::warn!(
                "{}:{}: duplicate key \"{}\" replaces the earlier value {}",
                tree.file(),
                line,
                key,
                previous
            );
        }
    }

    Ok(decoded)
}

/// Key text: the unquoted string child for quoted keys, the raw word otherwise
fn key_text<'t>(tree: &'t SyntaxTree, key: &Node) -> &'t str {
    match key.named_child(0) {
        Some(quoted) if quoted.kind() == NodeKind::String => tree.unquoted(quoted),
        _ => tree.text(key),
    }
}
