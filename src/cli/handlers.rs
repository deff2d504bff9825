// FILE: src/cli/handlers.rs
use crate::{compile_file_with_options, server, Compilation, CompilerError, Result, RouteTable};

use clap::ArgMatches;

fn input_path(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("input")
        .map(String::as_str)
        .ok_or_else(|| CompilerError::InvalidConfig {
            message: "No input file given".to_string(),
        })
}

fn compile(cli: &super::TeraCli, matches: &ArgMatches) -> Result<Compilation> {
    let input_path = input_path(matches)?;
    let options = cli.build_compiler_options(matches);
    compile_file_with_options(input_path, &options)
}

// --- SERVE ---
pub fn handle_serve(cli: &super::TeraCli, matches: &ArgMatches) -> Result<()> {
    let compilation = compile(cli, matches)?;
    let config = cli.build_server_config(matches);

    log::info!(
        "Compiled {} routes from {} files in {}ms",
        compilation.stats.route_count,
        compilation.stats.files_parsed,
        compilation.stats.compile_time_ms
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CompilerError::server(format!("failed to start runtime: {}", e)))?;

    runtime.block_on(server::serve(compilation.routes, &config))
}

// --- CHECK ---
pub fn handle_check(cli: &super::TeraCli, matches: &ArgMatches) -> Result<()> {
    let input_path = input_path(matches)?;
    println!("🔍 Checking {}", input_path);

    let compilation = compile(cli, matches)?;

    println!("✅ Check passed!");
    for route in &compilation.routes {
        println!("   {} {} -> {}", route.method(), route.path(), route.status());
    }
    print_detailed_stats(&compilation.stats);
    println!("   Total time: {}ms", cli.elapsed_ms());
    Ok(())
}

// --- DUMP ---
pub fn handle_dump(cli: &super::TeraCli, matches: &ArgMatches) -> Result<()> {
    let compilation = compile(cli, matches)?;
    println!("{}", render_table(&compilation.routes)?);
    Ok(())
}

fn render_table(routes: &RouteTable) -> Result<String> {
    serde_json::to_string_pretty(routes).map_err(|e| CompilerError::Output {
        message: format!("failed to render route table: {}", e),
    })
}

fn print_detailed_stats(stats: &crate::CompilationStats) {
    println!("\n📊 Detailed Compilation Statistics:");
    println!("   Files parsed: {}", stats.files_parsed);
    if stats.imports_skipped > 0 {
        println!("   Imports skipped: {}", stats.imports_skipped);
    }
    println!("   Routes: {}", stats.route_count);
    println!("   Source size: {} bytes", stats.source_bytes);
    println!("   Compile time: {}ms", stats.compile_time_ms);
}
