// This file defines the main "compiler" module and orchestrates the pipeline.

pub mod frontend;
pub mod middle_end;

use crate::error::Result;
use crate::types::RouteTable;
use crate::{CompilationStats, CompilerOptions};
use middle_end::SourceGraph;
use std::path::Path;
use std::time::Instant;

/// Result of one compilation run
#[derive(Debug, Clone)]
pub struct Compilation {
    pub routes: RouteTable,
    pub stats: CompilationStats,
}

/// The main entry point for compiling a file.
///
/// STAGE 1 loads and parses the entrypoint (frontend). STAGE 2 walks the
/// tree, following imports through the source graph and assembling each
/// route (middle end). The returned table is final; nothing mutates it later.
pub fn compile_with_options(input_path: &Path, options: &CompilerOptions) -> Result<Compilation> {
    let start_time = Instant::now();

    let mut graph = SourceGraph::with_options(options);
    let routes = graph.resolve(input_path)?;

    Ok(Compilation {
        stats: collect_stats(&graph, &routes, start_time),
        routes,
    })
}

/// Compile in-memory source as if it were the file `filename`
pub fn compile_source_with_options(
    source: &str,
    filename: &Path,
    options: &CompilerOptions,
) -> Result<Compilation> {
    let start_time = Instant::now();

    let mut graph = SourceGraph::with_options(options);
    let routes = graph.resolve_source(filename, source)?;

    Ok(Compilation {
        stats: collect_stats(&graph, &routes, start_time),
        routes,
    })
}

fn collect_stats(graph: &SourceGraph, routes: &RouteTable, start_time: Instant) -> CompilationStats {
    let resolved = graph.stats();
    CompilationStats {
        files_parsed: resolved.files_parsed,
        imports_skipped: resolved.imports_skipped,
        route_count: routes.len(),
        source_bytes: resolved.source_bytes,
        compile_time_ms: start_time.elapsed().as_millis() as u64,
    }
}
