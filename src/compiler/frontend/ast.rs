//! Syntax tree produced by the Tera grammar
//!
//! The tree is concrete rather than abstract: every node keeps its byte range
//! into the source buffer and the 1-based line it starts on, and values are
//! recovered by slicing the source. Only named nodes are kept, so punctuation
//! never shows up as a child.

use std::fmt;
use std::ops::Range;

/// Closed set of grammar node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    Import,
    Route,
    Method,
    Struct,
    Key,
    Value,
    String,
    Int,
    Float,
    Bool,
    Identifier,
}

impl NodeKind {
    /// Grammar name of the node kind
    pub fn grammar_name(self) -> &'static str {
        match self {
            NodeKind::SourceFile => "source_file",
            NodeKind::Import => "import",
            NodeKind::Route => "route",
            NodeKind::Method => "method",
            NodeKind::Struct => "struct",
            NodeKind::Key => "key",
            NodeKind::Value => "value",
            NodeKind::String => "string",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Bool => "bool",
            NodeKind::Identifier => "identifier",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grammar_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    range: Range<usize>,
    line: usize,
    children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, range: Range<usize>, line: usize, children: Vec<Node>) -> Self {
        Self {
            kind,
            range,
            line,
            children,
        }
    }

    pub fn leaf(kind: NodeKind, range: Range<usize>, line: usize) -> Self {
        Self::new(kind, range, line, Vec::new())
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// 1-based line of the first byte of the node
    pub fn start_line(&self) -> usize {
        self.line
    }

    pub fn named_children(&self) -> &[Node] {
        &self.children
    }

    pub fn named_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn named_child_count(&self) -> usize {
        self.children.len()
    }
}

/// A parsed source file: the source buffer plus the root node
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    file: String,
    source: String,
    root: Node,
}

impl SyntaxTree {
    pub fn new(file: impl Into<String>, source: impl Into<String>, root: Node) -> Self {
        Self {
            file: file.into(),
            source: source.into(),
            root,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Display name of the file the tree was parsed from
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Raw source text covered by `node`
    pub fn text(&self, node: &Node) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Text of a string node with the surrounding quotes stripped
    pub fn unquoted(&self, node: &Node) -> &str {
        let text = self.text(node);
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            &text[1..text.len() - 1]
        } else {
            text
        }
    }

    /// S-expression rendering of the node kinds, for trace logging
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(&self.root, &mut out);
        out
    }
}

fn write_sexp(node: &Node, out: &mut String) {
    out.push('(');
    out.push_str(node.kind.grammar_name());
    for child in &node.children {
        out.push(' ');
        write_sexp(child, out);
    }
    out.push(')');
}
