use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::{DEFAULT_API_URL, DEFAULT_TEMPLATES_DIR};

/// Task group templating for Motion.
/// Requires MOTION_API_KEY in the environment for every command except `completions`.
#[derive(Parser)]
#[command(name = "tt", version, about = "Pull and replay Motion task group templates")]
pub struct Cli {
    /// Directory holding template files.
    #[arg(long, global = true, env = "TT_TEMPLATES_DIR", default_value = DEFAULT_TEMPLATES_DIR)]
    pub templates_dir: PathBuf,

    /// Base URL of the Motion API.
    #[arg(long, global = true, env = "MOTION_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Debug logging on stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to the interactive menu.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
