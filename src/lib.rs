//! Tera Route Language Compiler
//!
//! Compiles `.tera` route definitions into an in-memory route table and
//! serves that table over HTTP.
//!
//! # Features
//!
//! - Static routes with status, headers and `html`/`json`/`text` bodies
//! - Nested struct literals rendered as JSON response bodies
//! - Multi-file projects through `import`, with duplicate and cycle protection
//! - Error reporting with file names and line numbers
//! - A small axum server that answers each route exactly as compiled
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use teralang::{compile_file, Result};
//!
//! fn main() -> Result<()> {
//!     let routes = compile_file("routes.tera")?;
//!     for route in &routes {
//!         println!("{} {} -> {}", route.method(), route.path(), route.status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Compilation Pipeline
//!
//! 1. **Frontend**: lexer and parser build a syntax tree per file
//! 2. **Walker**: depth-first traversal in document order
//! 3. **Source graph**: `import` nodes load further files, each at most once
//! 4. **Route assembly**: literals and structs are decoded, validated and
//!    turned into immutable `Route` records
//! 5. **Serving**: the frozen `RouteTable` backs the HTTP dispatcher

pub mod cli;
pub mod compiler;
pub mod error;
pub mod server;
pub mod types;

use serde::Serialize;
use std::path::Path;

// Re-export commonly used types and functions
pub use compiler::frontend::ast::{Node, NodeKind, SyntaxTree};
pub use compiler::frontend::parse_source;
pub use compiler::middle_end::{RouteProperties, SourceGraph, VisitedSet};
pub use compiler::Compilation;
pub use error::{CompilerError, Result};
pub use server::{RouteDispatcher, ServerConfig};
pub use types::{Field, Literal, Route, RouteTable, StructLiteral};

/// Compiler version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Compilation options and settings
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Trace-log every parsed syntax tree
    pub debug_mode: bool,

    /// Extension appended to imports that have none
    pub import_extension: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            import_extension: types::TERA_EXTENSION.to_string(),
        }
    }
}

/// Compilation statistics and metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationStats {
    /// Number of source files parsed, entrypoint included
    pub files_parsed: usize,

    /// Imports skipped because the file was already compiled in this run
    pub imports_skipped: usize,

    /// Number of routes in the final table
    pub route_count: usize,

    /// Total size of all parsed sources in bytes
    pub source_bytes: u64,

    /// Compilation time in milliseconds
    pub compile_time_ms: u64,
}

/// Main compiler entry point with default options
pub fn compile_file(input_path: impl AsRef<Path>) -> Result<RouteTable> {
    compile_file_with_options(input_path, &CompilerOptions::default()).map(|c| c.routes)
}

/// Compile with custom options
pub fn compile_file_with_options(
    input_path: impl AsRef<Path>,
    options: &CompilerOptions,
) -> Result<Compilation> {
    let input_path = input_path.as_ref();
    if options.debug_mode {
        log::debug!("{} v{}: compiling '{}'", NAME, VERSION, input_path.display());
        log::debug!("Compiler options: {:?}", options);
    }

    let compilation = compiler::compile_with_options(input_path, options)?;

    log::debug!("Compilation stats: {:?}", compilation.stats);
    Ok(compilation)
}

/// Compile Tera source held in memory. Imports resolve relative to `filename`.
pub fn compile_source(source: &str, filename: impl AsRef<Path>) -> Result<RouteTable> {
    compile_source_with_options(source, filename, &CompilerOptions::default()).map(|c| c.routes)
}

/// Compile in-memory Tera source with custom options
pub fn compile_source_with_options(
    source: &str,
    filename: impl AsRef<Path>,
    options: &CompilerOptions,
) -> Result<Compilation> {
    compiler::compile_source_with_options(source, filename.as_ref(), options)
}
