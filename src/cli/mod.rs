//! CLI module for rangemux
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// rangemux
///
/// Copies a time range of a media file into a new container without
/// re-encoding, and inspects container contents.
#[derive(Parser, Debug)]
#[command(name = "rangemux")]
#[command(about = "Lossless time-range extraction and container inspection")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directive [default: info]
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format: pretty, compact or json [default: pretty]
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Configuration file [default: ./rangemux.toml when present]
    #[arg(long, global = true, value_name = "PATH", env = "RANGEMUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a time range into a new container
    Clip(args::ClipArgs),
    /// Describe a media file's streams, metadata and keyframes
    Inspect(args::InspectArgs),
}
