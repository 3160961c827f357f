//! Graphex CLI - Pull embedded images out of PDF documents.
//!
//! Graphex scans a document for image objects, decodes and analyzes each
//! one, and writes a manifest of base64-encoded images with descriptive
//! names plus an error log for anything it had to skip.
//!
//! # Usage
//!
//! ```bash
//! # Extract every image into ./extracted_graphics
//! graphex extract report.pdf
//!
//! # Write to another directory, one entry per line, with standalone files
//! graphex extract report.pdf -o ./out --format jsonl --write-images
//!
//! # List image objects without processing them
//! graphex inspect report.pdf
//!
//! # View configuration
//! graphex config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Graphex - Extract, analyze, and name the images embedded in a PDF.
#[derive(Parser, Debug)]
#[command(name = "graphex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract every image into a manifest and error log
    Extract(cli::extract::ExtractArgs),

    /// List the image objects in a document without processing them
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match graphex_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `graphex config path`."
            );
            graphex_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Graphex v{}", graphex_core::VERSION);

    match cli.command {
        Commands::Extract(args) => cli::extract::execute(args, config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, config),
        Commands::Config(args) => cli::config::execute(args, &config),
    }
}
