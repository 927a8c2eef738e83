//! PatchPlan CLI
//!
//! Command-line interface for computing update patches between JSON documents

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "patchplan")]
#[command(about = "PatchPlan - Minimal update payloads from state and plan", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the patch that converges a state document to a plan document
    Diff(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
