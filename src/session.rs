//! Interactive selection flow.
//!
//! Gathers workspace, project, template and run choices through a
//! [`Prompter`], then hands already-resolved parameters to the dispatcher.
//! Nothing here blocks on the terminal directly, so the whole flow can be
//! driven by a scripted prompter in tests.

use std::num::ParseIntError;
use std::path::PathBuf;

use chrono::{DateTime, Local, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::derive::{format_utc, RunParams};
use crate::dispatch::{dispatch, DispatchReport, Pacer, RATE_LIMIT_DELAY};
use crate::fields::Priority;
use crate::gateway::{Project, TaskGateway, Workspace};
use crate::task::ProjectPayload;
use crate::template::{generate_template, TemplateStore};

/// Main menu entries, in display order.
pub const MAIN_MENU: [&str; 3] = [
    "Pull Task Group Template from Existing Tasks",
    "Create Tasks from Task Group Template",
    "Exit",
];

/// Template picker entry that falls through to pulling a new template.
pub const PULL_INSTEAD: &str = "(no template: pull one from an existing project)";

/// Source of operator choices.
pub trait Prompter {
    /// Pick one of `items`. `None` means the operator backed out.
    fn select(&mut self, title: &str, items: &[String]) -> Option<usize>;
    /// Read one line of free text. `None` means the operator backed out.
    fn input(&mut self, prompt: &str) -> Option<String>;
    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> bool;
}

/// One interactive session against a gateway and a template store.
pub struct Session<'a, G: TaskGateway + ?Sized, T: Prompter, P: Pacer> {
    gateway: &'a G,
    store: &'a TemplateStore,
    prompter: T,
    pacer: P,
}

impl<'a, G: TaskGateway + ?Sized, T: Prompter, P: Pacer> Session<'a, G, T, P> {
    pub fn new(gateway: &'a G, store: &'a TemplateStore, prompter: T, pacer: P) -> Self {
        Session {
            gateway,
            store,
            prompter,
            pacer,
        }
    }

    /// Run the main menu until the operator exits.
    pub fn run(&mut self) {
        let items: Vec<String> = MAIN_MENU.iter().map(|s| s.to_string()).collect();
        loop {
            match self.prompter.select("Main Menu", &items) {
                Some(0) => {
                    self.pull_flow();
                }
                Some(1) => {
                    self.create_flow();
                }
                _ => {
                    println!("Exiting...");
                    break;
                }
            }
        }
    }

    /// Snapshot an existing project into a template file.
    pub fn pull_flow(&mut self) -> Option<PathBuf> {
        let workspace = self.choose_workspace()?;
        self.pull_for_workspace(&workspace)
    }

    fn pull_for_workspace(&mut self, workspace: &Workspace) -> Option<PathBuf> {
        let Some(project) = self.choose_project(&workspace.id) else {
            println!("No project was given to create a template from. Can't proceed.");
            return None;
        };
        snapshot_project(self.gateway, self.store, workspace, &project, Local::now())
    }

    /// Replay a template into a workspace. Returns the report when a
    /// dispatch actually ran.
    pub fn create_flow(&mut self) -> Option<DispatchReport> {
        let workspace = self.choose_workspace()?;

        let Some(file_name) = self.choose_template()? else {
            println!("Creating tasks without a template. Directing to step 1.");
            self.pull_for_workspace(&workspace);
            return None;
        };

        let template = match self.store.load(&file_name) {
            Ok(template) => template,
            Err(e) => {
                println!("Error: {}", e);
                return None;
            }
        };

        let params = self.gather_run_params(&workspace);
        let report = dispatch(self.gateway, &mut self.pacer, RATE_LIMIT_DELAY, &template.tasks, &params);
        println!("{}", report.summary());
        Some(report)
    }

    /// Collect the Run Parameters for one dispatch into `workspace`.
    pub fn gather_run_params(&mut self, workspace: &Workspace) -> RunParams {
        let raw_offset = self
            .prompter
            .input("Enter the number of days in the future for the due date (or leave blank for default):")
            .unwrap_or_default();
        let offset_days = parse_offset(&raw_offset).unwrap_or_else(|_| {
            println!("Invalid input. Using default due date.");
            0
        });

        let project_id = if self.prompter.confirm("Create a new project for these tasks?") {
            self.prompt_new_project(&workspace.id, offset_days)
        } else {
            None
        };

        let autoschedule = self.prompter.confirm("Enable autoscheduling?");
        let schedule = self.choose_schedule();

        let params = RunParams {
            workspace_id: workspace.id.clone(),
            project_id,
            offset_days,
            schedule,
            autoschedule,
        };
        debug!(?params, "run parameters gathered");
        params
    }

    fn prompt_new_project(&mut self, workspace_id: &str, offset_days: i64) -> Option<String> {
        let name = self
            .prompter
            .input("Enter the name for the new project:")
            .unwrap_or_default();
        if name.trim().is_empty() {
            println!("Project name cannot be empty. Project creation skipped.");
            return None;
        }

        let raw_priority = self
            .prompter
            .input("Enter priority value (ASAP, HIGH, MEDIUM, LOW, or leave blank for MEDIUM):")
            .unwrap_or_default();
        let priority = parse_project_priority(&raw_priority).unwrap_or_else(|_| {
            println!("Value is not right. Reverting to default (MEDIUM)");
            Priority::Medium
        });

        create_project(self.gateway, workspace_id, name.trim(), priority, offset_days, Utc::now())
    }

    fn choose_workspace(&mut self) -> Option<Workspace> {
        let workspaces = match self.gateway.list_workspaces() {
            Ok(workspaces) => workspaces,
            Err(e) => {
                warn!(error = %e, "listing workspaces failed");
                println!("Could not retrieve workspaces.");
                return None;
            }
        };
        if workspaces.is_empty() {
            println!("No workspaces found.");
            return None;
        }

        let items: Vec<String> = workspaces
            .iter()
            .map(|w| format!("{} (ID: {})", w.name, w.id))
            .collect();
        let choice = self.prompter.select("Available Workspaces", &items)?;
        workspaces.into_iter().nth(choice)
    }

    fn choose_project(&mut self, workspace_id: &str) -> Option<Project> {
        let projects = match self.gateway.list_projects(workspace_id) {
            Ok(projects) => projects,
            Err(e) => {
                warn!(error = %e, "listing projects failed");
                println!("Could not retrieve projects.");
                return None;
            }
        };
        if projects.is_empty() {
            println!("No projects found in this workspace.");
            return None;
        }

        let items: Vec<String> = projects
            .iter()
            .map(|p| format!("{} (ID: {})", p.name, p.id))
            .collect();
        let choice = self.prompter.select("Available Projects", &items)?;
        projects.into_iter().nth(choice)
    }

    /// Outer `None`: the operator backed out. Inner `None`: no template, pull
    /// one instead.
    fn choose_template(&mut self) -> Option<Option<String>> {
        let files = match self.store.list() {
            Ok(files) => files,
            Err(e) => {
                println!("{}", e);
                Vec::new()
            }
        };
        if files.is_empty() {
            println!("No template files found.");
            return Some(None);
        }

        let mut items = files.clone();
        items.push(PULL_INSTEAD.to_string());
        let choice = self.prompter.select("Available Task Group Templates", &items)?;
        Some(files.into_iter().nth(choice))
    }

    fn choose_schedule(&mut self) -> Option<String> {
        let schedules = match self.gateway.list_schedules() {
            Ok(schedules) if !schedules.is_empty() => schedules,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "listing schedules failed");
                println!("Could not retrieve schedules.");
                return None;
            }
        };

        let mut items = vec!["None".to_string()];
        items.extend(schedules.iter().map(|s| s.name.clone()));
        match self.prompter.select("Schedule to use for ALL tasks", &items) {
            Some(0) | None => {
                println!("No schedule selected. Proceeding without.");
                None
            }
            Some(i) => schedules.into_iter().nth(i - 1).map(|s| s.name),
        }
    }
}

/// Parse the due-date offset. Blank input means no offset.
pub fn parse_offset(input: &str) -> Result<i64, ParseIntError> {
    let input = input.trim();
    if input.is_empty() {
        Ok(0)
    } else {
        input.parse()
    }
}

/// Parse a project priority. Blank input means MEDIUM.
pub fn parse_project_priority(input: &str) -> Result<Priority, String> {
    if input.trim().is_empty() {
        Ok(Priority::Medium)
    } else {
        input.parse()
    }
}

/// Create a project due `offset_days` from `now`. Returns its id, or `None`
/// after reporting the failure.
pub fn create_project<G: TaskGateway + ?Sized>(
    gateway: &G,
    workspace_id: &str,
    name: &str,
    priority: Priority,
    offset_days: i64,
    now: DateTime<Utc>,
) -> Option<String> {
    let due = TimeDelta::try_days(offset_days)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now);
    let payload = ProjectPayload {
        name: name.to_string(),
        workspace_id: workspace_id.to_string(),
        priority,
        due_date: format_utc(due),
    };

    match gateway.create_project(&payload) {
        Ok(created) => {
            println!("Project '{}' created successfully! (ID: {})", name, created.id);
            Some(created.id)
        }
        Err(e) => {
            warn!(project = name, error = %e, "project creation failed");
            println!("Error creating project '{}'.", name);
            None
        }
    }
}

/// Pull the tasks of `project` and write them as a template.
pub fn snapshot_project<G: TaskGateway + ?Sized>(
    gateway: &G,
    store: &TemplateStore,
    workspace: &Workspace,
    project: &Project,
    created: DateTime<Local>,
) -> Option<PathBuf> {
    let tasks = match gateway.list_tasks(&project.id) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(project = %project.id, error = %e, "listing tasks failed");
            println!("Could not retrieve tasks for this project.");
            Vec::new()
        }
    };
    if tasks.is_empty() {
        println!("No tasks found in project '{}'; template not written.", project.name);
        return None;
    }

    let template = generate_template(&workspace.id, &tasks);
    match store.save(&template, &workspace.name, &project.name, created) {
        Ok(path) => {
            println!("Template file created successfully at: {}", path.display());
            Some(path)
        }
        Err(e) => {
            println!("Error writing template file: {}", e);
            None
        }
    }
}
