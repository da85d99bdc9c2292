//! Template and payload data structures.
//!
//! A `Template` is the on-disk task group: an ordered list of `TaskSpec`s.
//! `TaskPayload` and `ProjectPayload` are the request bodies sent to the
//! remote service; they are built fresh for every request and never stored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::fields::*;

/// Due date written into templates when the source task has none.
pub const FALLBACK_DUE_DATE: &str = "2024-12-31T23:59:59Z";

/// Duration in minutes written into templates when the source task has none.
pub const DEFAULT_DURATION: u32 = 30;

/// Schedule name used when auto-scheduling is on but no schedule was picked.
pub const DEFAULT_SCHEDULE: &str = "Work Hours";

/// One task to be (re)created from a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub name: String,
    /// Workspace the task was pulled from. Informational only; replay
    /// always targets the workspace chosen for the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
}

/// Hand-edited templates may carry any casing or an unknown value. An
/// unknown priority is dropped so only that entry is affected: it is sent
/// without a priority and the service decides.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse::<Priority>() {
            Ok(priority) => Some(priority),
            Err(e) => {
                warn!("{e}; entry will be sent without a priority");
                None
            }
        },
        Some(other) => {
            warn!(priority = %other, "priority is not a string; entry will be sent without one");
            None
        }
    })
}

/// A task group template as persisted in the templates directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Template {
    pub tasks: Vec<TaskSpec>,
}

/// Auto-scheduling instructions attached to a task creation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutoScheduled {
    pub start_date: String,
    pub deadline_type: DeadlineType,
    pub schedule: String,
}

/// Request body for creating one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub name: String,
    pub workspace_id: String,
    pub due_date: String,
    pub duration: u32,
    // Left off the wire when the template entry has none; the service rejects it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scheduled: Option<AutoScheduled>,
}

/// Request body for creating a project to hold a replayed task group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: String,
    pub workspace_id: String,
    pub priority: Priority,
    pub due_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_spec_tolerates_missing_fields() {
        let spec: TaskSpec = serde_json::from_value(json!({ "dueDate": null })).unwrap();
        assert_eq!(spec.name, "");
        assert_eq!(spec.due_date, None);
        assert_eq!(spec.duration, None);
        assert_eq!(spec.priority, None);
    }

    #[test]
    fn test_task_spec_reads_camel_case() {
        let spec: TaskSpec = serde_json::from_value(json!({
            "name": "Write brief",
            "workspaceId": "ws_1",
            "dueDate": "2025-03-01T17:00:00Z",
            "duration": 45,
            "priority": "ASAP"
        }))
        .unwrap();
        assert_eq!(spec.workspace_id.as_deref(), Some("ws_1"));
        assert_eq!(spec.duration, Some(45));
        assert_eq!(spec.priority, Some(Priority::Asap));
    }

    #[test]
    fn test_task_spec_priority_is_lenient() {
        let specs: Vec<TaskSpec> = serde_json::from_value(json!([
            { "name": "a", "priority": "high" },
            { "name": "b", "priority": "URGENT" },
            { "name": "c", "priority": 2 },
            { "name": "d", "priority": null }
        ]))
        .unwrap();
        let priorities: Vec<_> = specs.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![Some(Priority::High), None, None, None]);
    }

    #[test]
    fn test_payload_omits_optional_blocks() {
        let payload = TaskPayload {
            name: "Plan".into(),
            workspace_id: "ws_1".into(),
            due_date: "2025-01-03T23:59:59Z".into(),
            duration: 30,
            priority: None,
            project_id: None,
            auto_scheduled: None,
        };
        let v = serde_json::to_value(&payload).unwrap();
        let obj = v.as_object().unwrap();
        assert!(!obj.contains_key("priority"));
        assert!(!obj.contains_key("projectId"));
        assert!(!obj.contains_key("autoScheduled"));
        assert_eq!(obj["workspaceId"], "ws_1");
        assert_eq!(obj["dueDate"], "2025-01-03T23:59:59Z");
    }

    #[test]
    fn test_auto_scheduled_wire_shape() {
        let block = AutoScheduled {
            start_date: "2025-01-01T08:00:00Z".into(),
            deadline_type: DeadlineType::Soft,
            schedule: DEFAULT_SCHEDULE.into(),
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "startDate": "2025-01-01T08:00:00Z",
                "deadlineType": "SOFT",
                "schedule": "Work Hours"
            })
        );
    }
}
