//! Error types for the Tera compiler

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error in {file} at line {line}: {message}")]
    Grammar { file: String, line: usize, message: String },

    #[error("Invalid key in route definition in {file} at line {line}: \"{key}\"")]
    UnknownRouteKey { file: String, line: usize, key: String },

    #[error("Type error in {file} at line {line}: \"{key}\" should be of type {expected}, found {found}")]
    TypeMismatch {
        file: String,
        line: usize,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Malformed number in {file} at line {line}: \"{text}\" ({reason})")]
    MalformedNumber {
        file: String,
        line: usize,
        text: String,
        reason: String,
    },

    #[error("Mismatch between keys and values in {file} at line {line}: {keys} keys, {values} values")]
    KeyValueMismatch {
        file: String,
        line: usize,
        keys: usize,
        values: usize,
    },

    #[error("JSON serialization error in {file} at line {line}: {message}")]
    Serialization { file: String, line: usize, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("Output error: {message}")]
    Output { message: String },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn grammar(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Grammar {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn unknown_key(file: impl Into<String>, line: usize, key: impl Into<String>) -> Self {
        Self::UnknownRouteKey {
            file: file.into(),
            line,
            key: key.into(),
        }
    }

    pub fn type_mismatch(
        file: impl Into<String>,
        line: usize,
        key: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            file: file.into(),
            line,
            key: key.into(),
            expected,
            found,
        }
    }

    pub fn serialization(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Serialization {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Source line the error points at, when it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Grammar { line, .. }
            | Self::UnknownRouteKey { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::MalformedNumber { line, .. }
            | Self::KeyValueMismatch { line, .. }
            | Self::Serialization { line, .. } => Some(*line),
            Self::Io { .. } | Self::InvalidConfig { .. } | Self::Server { .. } | Self::Output { .. } => None,
        }
    }
}
