//! Main entry point for the keydiff CLI

use clap::Parser;
use keydiff::cli::Cli;
use keydiff::commands::execute_command;

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = execute_command(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
