//! Template store: reading and writing task group templates on disk.
//!
//! Templates live as individual JSON files in a single directory, named
//! `<workspace>.<project>.<YYYYMMDD_HHMMSS>.json`. The store does no business
//! logic beyond validating that a loaded file is a usable template.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::fields::Priority;
use crate::gateway::RemoteTask;
use crate::task::*;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid JSON in template file: {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid template format: {} has no 'tasks' list", .path.display())]
    MissingTasks { path: PathBuf },
    #[error("Template {} contains no tasks", .path.display())]
    Empty { path: PathBuf },
    #[error("Template directory not found: {}", .0.display())]
    DirectoryMissing(PathBuf),
    #[error("Error accessing {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Directory-backed template storage.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TemplateStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a template file name against the store directory.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// List template file names (`*.json`), sorted.
    pub fn list(&self) -> Result<Vec<String>, TemplateError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TemplateError::DirectoryMissing(self.dir.clone()));
            }
            Err(source) => {
                return Err(TemplateError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| TemplateError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load and validate a template by file name.
    pub fn load(&self, file_name: &str) -> Result<Template, TemplateError> {
        let path = self.path_for(file_name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(TemplateError::NotFound(path)),
            Err(source) => return Err(TemplateError::Io { path, source }),
        };
        parse_template(&text, &path)
    }

    /// Write a template for `workspace`/`project`, creating the directory on
    /// first use. Returns the path written.
    pub fn save(
        &self,
        template: &Template,
        workspace: &str,
        project: &str,
        created: DateTime<Local>,
    ) -> Result<PathBuf, TemplateError> {
        fs::create_dir_all(&self.dir).map_err(|source| TemplateError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(template_file_name(workspace, project, created));
        write_json(template, &path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Atomic-ish write via temp + rename, four-space indented.
fn write_json<T: Serialize>(value: &T, path: &Path) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(io::Error::other)?;

    let mut f = File::create(&tmp)?;
    f.write_all(&buf)?;
    f.flush()?;
    fs::rename(tmp, path)
}

/// Validate template text: a JSON object with a non-empty `tasks` list.
pub fn parse_template(text: &str, path: &Path) -> Result<Template, TemplateError> {
    let invalid = |source| TemplateError::InvalidJson {
        path: path.to_path_buf(),
        source,
    };
    let value: Value = serde_json::from_str(text).map_err(invalid)?;
    match value.get("tasks") {
        Some(tasks) if tasks.is_array() => {}
        _ => {
            return Err(TemplateError::MissingTasks {
                path: path.to_path_buf(),
            })
        }
    }
    let template: Template = serde_json::from_value(value).map_err(invalid)?;
    if template.tasks.is_empty() {
        return Err(TemplateError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(template)
}

/// `{workspace}.{project}.{YYYYMMDD_HHMMSS}.json`, spaces replaced by
/// underscores.
pub fn template_file_name(workspace: &str, project: &str, created: DateTime<Local>) -> String {
    format!(
        "{}.{}.{}.json",
        file_component(workspace),
        file_component(project),
        created.format("%Y%m%d_%H%M%S")
    )
}

// Path separators are also flattened so a name can never escape the directory.
fn file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Snapshot listed tasks into a template, applying field defaults.
pub fn generate_template(workspace_id: &str, tasks: &[RemoteTask]) -> Template {
    let tasks = tasks
        .iter()
        .map(|task| TaskSpec {
            name: task.name.clone().unwrap_or_default(),
            workspace_id: Some(workspace_id.to_string()),
            due_date: Some(
                task.due_date
                    .clone()
                    .unwrap_or_else(|| FALLBACK_DUE_DATE.to_string()),
            ),
            duration: Some(
                task.duration
                    .as_ref()
                    .and_then(Value::as_u64)
                    .and_then(|minutes| u32::try_from(minutes).ok())
                    .unwrap_or(DEFAULT_DURATION),
            ),
            priority: Some(
                task.priority
                    .as_deref()
                    .and_then(|p| p.parse::<Priority>().ok())
                    .unwrap_or_default(),
            ),
        })
        .collect();
    Template { tasks }
}
