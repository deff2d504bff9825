//! Tera Server Binary

use std::process;
use teralang::cli::TeraCli;

fn main() {
    let mut cli = TeraCli::new();
    if let Err(e) = cli.run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
