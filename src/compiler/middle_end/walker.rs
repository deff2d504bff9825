//! Depth-first traversal of a syntax tree, dispatching on node kind

use crate::compiler::frontend::ast::{Node, NodeKind, SyntaxTree};
use crate::compiler::middle_end::resolver::SourceGraph;
use crate::compiler::middle_end::route_assembler::assemble_route;
use crate::error::{CompilerError, Result};
use crate::types::RouteTable;
use std::path::Path;

pub struct AstWalker<'g> {
    graph: &'g mut SourceGraph,
    file: &'g Path,
}

impl<'g> AstWalker<'g> {
    /// `file` is the canonical path of the tree being walked
    pub fn new(graph: &'g mut SourceGraph, file: &'g Path) -> Self {
        Self { graph, file }
    }

    /// Visit `node` in document order, appending routes to `table`.
    /// Imports are handed to the source graph; every other kind recurses.
    pub fn walk(&mut self, tree: &SyntaxTree, node: &Node, table: &mut RouteTable) -> Result<()> {
        match node.kind() {
            NodeKind::Import => {
                let path_node = node.named_child(0).ok_or_else(|| {
                    CompilerError::grammar(tree.file(), node.start_line(), "Import without a path")
                })?;
                self.graph.import(self.file, tree.unquoted(path_node), table)
            }
            NodeKind::Route => {
                let route = assemble_route(tree, node)?;
                if table
                    .iter()
                    .any(|r| r.path() == route.path() && r.method() == route.method())
                {
                    log::warn!(
                        "{}:{}: {} {} is already defined; the earlier definition is served",
                        tree.file(),
                        node.start_line(),
                        route.method(),
                        route.path()
                    );
                }
                log::debug!("Compiled route: {} {} -> {}", route.method(), route.path(), route.status());
                table.push(route);
                Ok(())
            }
            NodeKind::SourceFile
            | NodeKind::Method
            | NodeKind::Struct
            | NodeKind::Key
            | NodeKind::Value
            | NodeKind::String
            | NodeKind::Int
            | NodeKind::Float
            | NodeKind::Bool
            | NodeKind::Identifier => {
                for child in node.named_children() {
                    self.walk(tree, child, table)?;
                }
                Ok(())
            }
        }
    }
}
