//! Lexical analysis for Tera source code

use crate::error::{CompilerError, Result};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Import,
    Route,

    // Punctuation
    LeftBrace,  // {
    RightBrace, // }
    Colon,      // :
    Comma,      // ,

    // Literals
    String,
    Integer,
    Float,
    Boolean,
    Identifier,

    Eof,
}

/// A token only records where it sits; its text is sliced from the source on demand.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Token {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Import => write!(f, "import"),
            TokenType::Route => write!(f, "route"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Comma => write!(f, ","),
            TokenType::String => write!(f, "string"),
            TokenType::Integer => write!(f, "integer"),
            TokenType::Float => write!(f, "float"),
            TokenType::Boolean => write!(f, "boolean"),
            TokenType::Identifier => write!(f, "identifier"),
            TokenType::Eof => write!(f, "end of file"),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
    line: usize,
    filename: String,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, filename: impl Into<String>) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: 0,
            line: 1,
            filename: filename.into(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        tokens.push(Token {
            token_type: TokenType::Eof,
            start: self.position,
            end: self.position,
            line: self.line,
        });

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();

        let Some(ch) = self.peek() else {
            return Ok(None);
        };

        let start = self.position;
        let line = self.line;

        let token_type = match ch {
            b'{' => {
                self.advance();
                TokenType::LeftBrace
            }
            b'}' => {
                self.advance();
                TokenType::RightBrace
            }
            b':' => {
                self.advance();
                TokenType::Colon
            }
            b',' => {
                self.advance();
                TokenType::Comma
            }
            b'"' => self.read_string()?,
            b'-' | b'0'..=b'9' => self.read_number()?,
            ch if is_identifier_start(ch) => self.read_word(),
            _ => {
                let unexpected = self.source[start..].chars().next().unwrap_or('?');
                return Err(self.error(format!("Unexpected character: '{}'", unexpected)));
            }
        };

        Ok(Some(Token {
            token_type,
            start,
            end: self.position,
            line,
        }))
    }

    /// Skip whitespace, newlines and `//` line comments
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b' ' | b'\t' | b'\r' => self.advance(),
                b'/' if self.peek_next() == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string(&mut self) -> Result<TokenType> {
        let start_line = self.line;
        self.advance(); // opening quote

        while let Some(ch) = self.peek() {
            match ch {
                b'"' => {
                    self.advance();
                    return Ok(TokenType::String);
                }
                b'\\' => {
                    self.advance();
                    if self.peek() == Some(b'\n') {
                        self.line += 1;
                    }
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                _ => self.advance(),
            }
        }

        Err(CompilerError::grammar(
            self.filename.clone(),
            start_line,
            "Unterminated string literal",
        ))
    }

    fn read_number(&mut self) -> Result<TokenType> {
        if self.peek() == Some(b'-') {
            self.advance();
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.error("Expected digit after '-'"));
            }
        }
        self.consume_digits();

        let mut token_type = TokenType::Integer;

        if self.peek() == Some(b'.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance(); // '.'
            self.consume_digits();
            token_type = TokenType::Float;
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let digits_at = match self.bytes.get(self.position + 1) {
                Some(b'+') | Some(b'-') => self.position + 2,
                _ => self.position + 1,
            };
            if self.bytes.get(digits_at).map_or(false, |c| c.is_ascii_digit()) {
                self.position = digits_at;
                self.consume_digits();
                token_type = TokenType::Float;
            }
        }

        Ok(token_type)
    }

    fn read_word(&mut self) -> TokenType {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if is_identifier_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        match &self.source[start..self.position] {
            "import" => TokenType::Import,
            "route" => TokenType::Route,
            "true" | "false" => TokenType::Boolean,
            _ => TokenType::Identifier,
        }
    }

    fn consume_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> CompilerError {
        CompilerError::grammar(self.filename.clone(), self.line, message)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.position + 1).copied()
    }
}

fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_identifier_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'-'
}
