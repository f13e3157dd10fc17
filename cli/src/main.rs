//! dotindex CLI — inspect indexer configuration.
//!
//! Usage:
//! ```bash
//! dotindex info
//! dotindex version
//! dotindex help
//! ```

use std::env;
use std::process;

use dotindex_core::config::{ConsumerConfig, PipelineConfig, ScannerConfig};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "info" => cmd_info(),
        "version" | "--version" | "-V" => {
            println!("dotindex {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("dotindex {}", env!("CARGO_PKG_VERSION"));
    println!("dot-20 inscription indexer\n");
    println!("USAGE:");
    println!("    dotindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    info     Show DotIndex configuration defaults");
    println!("    version  Print version");
    println!("    help     Print this help");
}

fn cmd_info() {
    let scanner = ScannerConfig::default();
    let pipeline = PipelineConfig::default();
    let consumer = ConsumerConfig::default();

    println!("DotIndex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Scan window: {} blocks, resolved concurrently", scanner.window_size);
    println!("  Head poll interval: {}ms", scanner.poll_interval_ms);
    println!("  Reconnect backoff: {}ms", scanner.retry_backoff_ms);
    println!("  Pipeline high-water mark: {} batches", pipeline.high_water_mark);
    println!("  Default supply per deploy: {}", consumer.default_supply);
    println!("  Default mint window: {} blocks", consumer.mint_window_blocks);
    println!("  Storage backends: memory, SQLite (dotindex-storage)");
}
