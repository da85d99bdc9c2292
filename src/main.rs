//! # TT - Task Templating for Motion
//!
//! Bulk-creates Motion tasks from reusable templates. A template is pulled
//! from the tasks of an existing project and stored as a JSON file; it is
//! later replayed into any workspace, optionally into a new project, with
//! every due date shifted by a day offset and optional auto-scheduling.
//!
//! ## Key Features
//!
//! - **Template snapshots**: `{workspace}.{project}.{YYYYMMDD_HHMMSS}.json` files
//!   in a local templates directory
//! - **Date shifting**: every due date moves by the same number of days
//! - **Auto-scheduling**: into a chosen schedule, or "Work Hours" by default
//! - **Rate limiting**: requests go out one at a time with a fixed 8 second
//!   pause, keeping well under the service's ~12 requests/minute cap
//! - **Partial failure accounting**: failed tasks are reported with the
//!   payload that was sent; the batch always runs to the end
//!
//! ## Quick Start
//!
//! ```bash
//! export MOTION_API_KEY=...
//!
//! # Interactive menu
//! tt
//!
//! # Snapshot a project
//! tt pull --workspace "My Team" --project "Launch Plan"
//!
//! # Replay it a week later into a new project
//! tt create My_Team.Launch_Plan.20250107_140509.json --workspace "My Team" \
//!     --offset 7 --new-project "Launch Plan (June)" --autoschedule
//! ```
//!
//! There is no deduplication: re-running a partially failed batch creates
//! the already-created tasks again.

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod derive;
pub mod dispatch;
pub mod fields;
pub mod gateway;
pub mod session;
pub mod task;
pub mod template;
pub mod tui {
    pub mod input;
    pub mod menu;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use gateway::MotionClient;
use template::TemplateStore;

/// Log directive used when RUST_LOG is unset. Targets are module paths, so
/// the directive names this crate as compiled (`tt`), not the package.
fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Completions need no configuration.
    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let config = match Config::from_env(&cli.api_url, cli.templates_dir.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let gateway = match MotionClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let store = TemplateStore::new(config.templates_dir.clone());
    tracing::debug!(api_url = %config.api_url, templates_dir = %store.dir().display(), "configured");

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => cmd_menu(&gateway, &store),

        Commands::Pull { workspace, project } => cmd_pull(&gateway, &store, workspace, project),

        Commands::Create {
            template, workspace, offset, project_id, new_project, project_priority,
            schedule, autoschedule,
        } => cmd_create(&gateway, &store, template, workspace, offset, project_id,
                        new_project, project_priority, schedule, autoschedule),

        Commands::Templates => cmd_templates(&store),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
