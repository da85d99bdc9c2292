//! Command implementations for the CLI interface.
//!
//! `menu` hands control to the interactive session; `pull` and `create` are
//! the same flows driven entirely by flags, for scripting.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use chrono::{Local, Utc};

use crate::derive::RunParams;
use crate::dispatch::{dispatch, ThreadPacer, RATE_LIMIT_DELAY};
use crate::fields::Priority;
use crate::gateway::{Project, TaskGateway, Workspace};
use crate::session::{create_project, snapshot_project, Session};
use crate::template::{TemplateError, TemplateStore};
use crate::tui::run::TerminalPrompter;

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive main menu.
    Menu,

    /// Pull a template from the tasks of an existing project.
    Pull {
        /// Workspace ID or name.
        #[arg(long)]
        workspace: String,
        /// Project ID or name.
        #[arg(long)]
        project: String,
    },

    /// Create tasks from a template file.
    Create {
        /// Template file name in the templates directory.
        template: String,
        /// Target workspace ID or name.
        #[arg(long)]
        workspace: String,
        /// Days added to every due date. May be negative.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
        /// Existing project to put the tasks in.
        #[arg(long, conflicts_with = "new_project")]
        project_id: Option<String>,
        /// Create a project with this name and put the tasks in it.
        #[arg(long)]
        new_project: Option<String>,
        /// Priority of the new project.
        #[arg(long, value_enum, default_value_t = Priority::Medium, requires = "new_project")]
        project_priority: Priority,
        /// Auto-schedule every task into this schedule.
        #[arg(long)]
        schedule: Option<String>,
        /// Auto-schedule into "Work Hours" unless --schedule is given.
        #[arg(long)]
        autoschedule: bool,
    },

    /// List template files.
    Templates,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the interactive menu.
pub fn cmd_menu<G: TaskGateway + ?Sized>(gateway: &G, store: &TemplateStore) {
    let mut session = Session::new(gateway, store, TerminalPrompter, ThreadPacer);
    session.run();
}

/// Snapshot a project into a template without prompting.
pub fn cmd_pull<G: TaskGateway + ?Sized>(gateway: &G, store: &TemplateStore, workspace: String, project: String) {
    let workspace = resolve_workspace(gateway, &workspace).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let project = resolve_project(gateway, &workspace.id, &project).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    if snapshot_project(gateway, store, &workspace, &project, Local::now()).is_none() {
        std::process::exit(1);
    }
}

/// Replay a template without prompting. Exits non-zero if any task failed.
#[allow(clippy::too_many_arguments)]
pub fn cmd_create<G: TaskGateway + ?Sized>(
    gateway: &G,
    store: &TemplateStore,
    template: String,
    workspace: String,
    offset: i64,
    project_id: Option<String>,
    new_project: Option<String>,
    project_priority: Priority,
    schedule: Option<String>,
    autoschedule: bool,
) {
    // Validate the template before touching the remote service.
    let template = store.load(&template).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let workspace = resolve_workspace(gateway, &workspace).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let project_id = match new_project {
        Some(name) if !name.trim().is_empty() => create_project(
            gateway,
            &workspace.id,
            name.trim(),
            project_priority,
            offset,
            Utc::now(),
        ),
        Some(_) => {
            println!("Project name cannot be empty. Project creation skipped.");
            None
        },
        None => project_id,
    };

    let params = RunParams {
        workspace_id: workspace.id,
        project_id,
        offset_days: offset,
        schedule,
        autoschedule,
    };

    let report = dispatch(gateway, &mut ThreadPacer, RATE_LIMIT_DELAY, &template.tasks, &params);
    println!("{}", report.summary());
    if report.failures > 0 {
        std::process::exit(1);
    }
}

/// List template files in the templates directory.
pub fn cmd_templates(store: &TemplateStore) {
    match store.list() {
        Ok(files) if files.is_empty() => println!("No template files found."),
        Ok(files) => {
            println!("Available Task Group Templates:");
            for (i, file) in files.iter().enumerate() {
                println!("{}. {}", i + 1, file);
            }
        },
        Err(e @ TemplateError::DirectoryMissing(_)) => println!("{}", e),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn resolve_workspace<G: TaskGateway + ?Sized>(gateway: &G, identifier: &str) -> Result<Workspace, String> {
    let workspaces = gateway
        .list_workspaces()
        .map_err(|e| format!("Could not retrieve workspaces: {}", e))?;
    resolve_identifier(&workspaces, identifier, "workspace", |w| (&w.id, &w.name)).cloned()
}

fn resolve_project<G: TaskGateway + ?Sized>(
    gateway: &G,
    workspace_id: &str,
    identifier: &str,
) -> Result<Project, String> {
    let projects = gateway
        .list_projects(workspace_id)
        .map_err(|e| format!("Could not retrieve projects: {}", e))?;
    resolve_identifier(&projects, identifier, "project", |p| (&p.id, &p.name)).cloned()
}

/// Resolve an identifier (either ID or name) against a listing.
/// Returns an error if the name has multiple matches and suggests using ID instead.
pub fn resolve_identifier<'a, T>(
    items: &'a [T],
    identifier: &str,
    kind: &str,
    id_and_name: impl Fn(&T) -> (&String, &String),
) -> Result<&'a T, String> {
    if let Some(item) = items.iter().find(|item| id_and_name(item).0 == identifier) {
        return Ok(item);
    }

    // Search by name (case-insensitive)
    let wanted = identifier.to_lowercase();
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| id_and_name(item).1.to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => Err(format!("No {} found with ID or name '{}'", kind, identifier)),
        1 => Ok(matches[0]),
        _ => {
            let mut error_msg = format!("Multiple {}s found with name '{}':\n", kind, identifier);
            for item in matches {
                let (id, name) = id_and_name(item);
                error_msg.push_str(&format!("  ID {}: {}\n", id, name));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspaces() -> Vec<Workspace> {
        vec![
            Workspace { id: "w1".into(), name: "Team".into() },
            Workspace { id: "w2".into(), name: "Personal".into() },
            Workspace { id: "w3".into(), name: "personal".into() },
        ]
    }

    fn lookup<'a>(items: &'a [Workspace], identifier: &str) -> Result<&'a Workspace, String> {
        resolve_identifier(items, identifier, "workspace", |w| (&w.id, &w.name))
    }

    #[test]
    fn test_resolve_by_id_then_name() {
        let ws = workspaces();
        assert_eq!(lookup(&ws, "w2").unwrap().name, "Personal");
        assert_eq!(lookup(&ws, "team").unwrap().id, "w1");
    }

    #[test]
    fn test_resolve_reports_missing_and_ambiguous() {
        let ws = workspaces();
        assert!(lookup(&ws, "Nope").unwrap_err().contains("No workspace found"));
        let err = lookup(&ws, "PERSONAL").unwrap_err();
        assert!(err.contains("Multiple workspaces"));
        assert!(err.contains("ID w2") && err.contains("ID w3"));
    }

    #[test]
    fn test_create_flags_parse() {
        use clap::Parser;
        use crate::cli::Cli;

        let cli = Cli::try_parse_from([
            "tt", "create", "Team.Launch.20250101_000000.json",
            "--workspace", "Team", "--offset", "-3",
            "--new-project", "Q3", "--project-priority", "asap", "--autoschedule",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Create { offset, new_project, project_priority, autoschedule, schedule, .. }) => {
                assert_eq!(offset, -3);
                assert_eq!(new_project.as_deref(), Some("Q3"));
                assert_eq!(project_priority, Priority::Asap);
                assert!(autoschedule);
                assert_eq!(schedule, None);
            },
            _ => panic!("expected create command"),
        }

        assert!(Cli::try_parse_from([
            "tt", "create", "t.json", "--workspace", "w", "--project-id", "p", "--new-project", "n",
        ])
        .is_err());
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        use clap::Parser;
        use crate::cli::Cli;

        let cli = Cli::try_parse_from(["tt"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }
}
