//! rangemux
//!
//! Copies a time range of a media file into a new container without
//! re-encoding, and inspects container contents.
//!
//! # Usage
//!
//! ```bash
//! rangemux clip --input talk.mkv --output part.mp4 --start 00:10 --end 00:20
//! rangemux inspect --input talk.mkv --keyframes --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use rangemux::cli::{commands, Cli, Commands};

/// Main entry point for the rangemux CLI
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::resolve_config(&cli)?;
    rangemux::init_with_config(&config)?;
    config.log_origin();

    info!("Starting rangemux {}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Clip(args) => {
            info!("Executing clip command");
            commands::clip(args, &config)
        }
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            commands::inspect(args)
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
