//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time, exclusive (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Output container format short name [default: mp4]
    #[arg(short, long)]
    pub format: Option<String>,

    /// When to stop copying: global or per-stream [default: global]
    #[arg(long)]
    pub stop_policy: Option<String>,

    /// Abort the job after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input media file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Also scan the whole file for keyframes
    #[arg(long)]
    pub keyframes: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
