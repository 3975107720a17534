//! Tilepack CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tilepack library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::export::ExportArgs;

#[derive(Parser)]
#[command(name = "tilepack")]
#[command(version = tilepack::VERSION)]
#[command(about = "Export rectangular map regions as offline tile archives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a region's tiles and package them as a tar.gz pack
    Export(ExportArgs),
}

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so progress output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Export(args) => commands::export::run(args).await,
    };

    if let Err(error) = result {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}
