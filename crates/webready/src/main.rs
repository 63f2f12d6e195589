//! WebReady CLI - Batch exporter for web-ready image derivatives.
//!
//! WebReady takes camera-original images and produces derivatives fit for
//! publishing: color-managed, resized to a target long edge, optionally
//! watermarked, stripped of metadata, and re-encoded as JPEG or WebP.
//!
//! # Usage
//!
//! ```bash
//! # Export a directory at the default web preset (1920px long edge)
//! webready process ./photos/ --out-dir ./export
//!
//! # Instagram-sized WebP with a watermark
//! webready process ./photos/ --preset instagram --format webp \
//!     --watermark ./logo.png
//!
//! # View configuration
//! webready config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// WebReady - Batch exporter for web-ready image derivatives.
#[derive(Parser, Debug)]
#[command(name = "webready")]
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
    /// Process images into web-ready derivatives
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match webready_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `webready config path`."
            );
            webready_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("WebReady v{}", webready_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config),
        Commands::Config(args) => cli::config::execute(args),
    }
}
