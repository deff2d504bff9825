//! Grammar frontend: turns Tera source text into a syntax tree

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::error::Result;
use ast::SyntaxTree;
use lexer::Lexer;
use parser::Parser;

/// Tokenize and parse `source`, reporting errors against `filename`
pub fn parse_source(source: &str, filename: &str) -> Result<SyntaxTree> {
    let mut lexer = Lexer::new(source, filename);
    let tokens = lexer.tokenize()?;

    let mut parser = Parser::new(tokens, filename, source.len());
    let root = parser.parse()?;

    Ok(SyntaxTree::new(filename, source, root))
}
