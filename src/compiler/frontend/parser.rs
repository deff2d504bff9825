//! Recursive descent parser for the Tera language
//!
//! Builds the concrete syntax tree consumed by the route compiler:
//!
//! ```text
//! source_file := (import | route)*
//! import      := "import" string
//! route       := "route" string method struct
//! struct      := "{" (key ":" value ","?)* "}"
//! key         := identifier | string
//! value       := string | int | float | bool | identifier | struct
//! ```

use crate::compiler::frontend::ast::{Node, NodeKind};
use crate::compiler::frontend::lexer::{Token, TokenType};
use crate::error::{CompilerError, Result};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    filename: String,
    source_len: usize,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the lexer
    pub fn new(tokens: Vec<Token>, filename: impl Into<String>, source_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            filename: filename.into(),
            source_len,
        }
    }

    pub fn parse(&mut self) -> Result<Node> {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match &self.peek().token_type {
                TokenType::Import => items.push(self.parse_import()?),
                TokenType::Route => items.push(self.parse_route()?),
                other => {
                    return Err(self.error(format!(
                        "Expected 'import' or 'route' at top level, got {}",
                        other
                    )))
                }
            }
        }

        Ok(Node::new(NodeKind::SourceFile, 0..self.source_len, 1, items))
    }

    fn parse_import(&mut self) -> Result<Node> {
        let keyword = self.consume(TokenType::Import, "Expected 'import'")?;
        let path = self.consume(TokenType::String, "Expected quoted path after 'import'")?;

        Ok(Node::new(
            NodeKind::Import,
            keyword.start..path.end,
            keyword.line,
            vec![Node::leaf(NodeKind::String, path.range(), path.line)],
        ))
    }

    fn parse_route(&mut self) -> Result<Node> {
        let keyword = self.consume(TokenType::Route, "Expected 'route'")?;
        let path = self.consume(TokenType::String, "Expected quoted path after 'route'")?;
        let method = self.consume(TokenType::Identifier, "Expected HTTP method after route path")?;
        let body = self.parse_struct()?;

        Ok(Node::new(
            NodeKind::Route,
            keyword.start..body.byte_range().end,
            keyword.line,
            vec![
                Node::leaf(NodeKind::String, path.range(), path.line),
                Node::leaf(NodeKind::Method, method.range(), method.line),
                body,
            ],
        ))
    }

    fn parse_struct(&mut self) -> Result<Node> {
        let open = self.consume(TokenType::LeftBrace, "Expected '{'")?;
        let mut children = Vec::new();

        while !self.check(&TokenType::RightBrace) {
            if self.is_at_end() {
                return Err(CompilerError::grammar(
                    self.filename.clone(),
                    open.line,
                    "Unclosed '{': expected '}'",
                ));
            }

            children.push(self.parse_key()?);
            self.consume(TokenType::Colon, "Expected ':' after key")?;
            children.push(self.parse_value()?);

            self.match_token(&TokenType::Comma);
        }

        let close = self.consume(TokenType::RightBrace, "Expected '}'")?;

        Ok(Node::new(
            NodeKind::Struct,
            open.start..close.end,
            open.line,
            children,
        ))
    }

    fn parse_key(&mut self) -> Result<Node> {
        let token = self.advance().clone();
        match token.token_type {
            TokenType::String => Ok(Node::new(
                NodeKind::Key,
                token.range(),
                token.line,
                vec![Node::leaf(NodeKind::String, token.range(), token.line)],
            )),
            // keywords and booleans are plain words in key position
            TokenType::Identifier | TokenType::Import | TokenType::Route | TokenType::Boolean => {
                Ok(Node::leaf(NodeKind::Key, token.range(), token.line))
            }
            other => Err(CompilerError::grammar(
                self.filename.clone(),
                token.line,
                format!("Expected key, got {}", other),
            )),
        }
    }

    fn parse_value(&mut self) -> Result<Node> {
        let inner = match &self.peek().token_type {
            TokenType::LeftBrace => self.parse_struct()?,
            TokenType::Eof => return Err(self.error("Expected value, got end of file")),
            _ => {
                let token = self.advance().clone();
                let kind = match token.token_type {
                    TokenType::String => NodeKind::String,
                    TokenType::Integer => NodeKind::Int,
                    TokenType::Float => NodeKind::Float,
                    TokenType::Boolean => NodeKind::Bool,
                    TokenType::Identifier => NodeKind::Identifier,
                    other => {
                        return Err(CompilerError::grammar(
                            self.filename.clone(),
                            token.line,
                            format!("Expected value, got {}", other),
                        ))
                    }
                };
                Node::leaf(kind, token.range(), token.line)
            }
        };

        Ok(Node::new(
            NodeKind::Value,
            inner.byte_range(),
            inner.start_line(),
            vec![inner],
        ))
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        !self.is_at_end() && &self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token> {
        if self.check(&token_type) {
            Ok(self.advance().clone())
        } else {
            Err(self.error(format!("{}, got {}", message, self.peek().token_type)))
        }
    }

    fn error(&self, message: impl Into<String>) -> CompilerError {
        CompilerError::grammar(self.filename.clone(), self.peek().line, message)
    }
}
