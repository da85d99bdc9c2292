//! Remote service gateway.
//!
//! Thin request/response functions over the Motion REST API. Every call
//! returns either the decoded body or a typed [`GatewayError`]; callers only
//! need to distinguish "it worked" from "it didn't", but the error keeps the
//! cause for diagnostics.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::task::{ProjectPayload, TaskPayload};

/// Header carrying the API key on every request (`X-API-Key`).
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    Shape(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A task as listed by the remote service. Only the fields a template
/// snapshot needs are decoded, and loosely, since the service is the source
/// of truth for their shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Identifier of a freshly created resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub id: String,
}

/// Operations the templating flows need from the remote service.
pub trait TaskGateway {
    fn list_workspaces(&self) -> Result<Vec<Workspace>, GatewayError>;
    fn list_projects(&self, workspace_id: &str) -> Result<Vec<Project>, GatewayError>;
    fn list_tasks(&self, project_id: &str) -> Result<Vec<RemoteTask>, GatewayError>;
    fn list_schedules(&self) -> Result<Vec<Schedule>, GatewayError>;
    fn create_project(&self, payload: &ProjectPayload) -> Result<Created, GatewayError>;
    fn create_task(&self, payload: &TaskPayload) -> Result<Created, GatewayError>;
}

/// Blocking HTTP client for the Motion API.
pub struct MotionClient {
    http: Client,
    base_url: String,
}

impl MotionClient {
    /// Build a client with the API key installed as a default header.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), config.api_key_header()?);

        let http = Client::builder()
            .user_agent(concat!("task_templating/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(MotionClient {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }

    /// GET `resource` with the given query parameters.
    pub fn list(&self, resource: &str, query: &[(&str, &str)]) -> Result<Value, GatewayError> {
        debug!(resource, ?query, "GET");
        send(self.http.get(self.url(resource)).query(query))
    }

    /// POST `payload` as JSON to `resource`.
    pub fn create<T: Serialize>(&self, resource: &str, payload: &T) -> Result<Value, GatewayError> {
        debug!(resource, "POST");
        send(
            self.http
                .post(self.url(resource))
                .header(CONTENT_TYPE, "application/json")
                .json(payload),
        )
    }
}

fn send(request: RequestBuilder) -> Result<Value, GatewayError> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .map_err(|e| GatewayError::Shape(format!("body is not JSON: {e}")))
}

impl TaskGateway for MotionClient {
    fn list_workspaces(&self) -> Result<Vec<Workspace>, GatewayError> {
        extract_list(self.list("workspaces", &[])?, Some("workspaces"))
    }

    fn list_projects(&self, workspace_id: &str) -> Result<Vec<Project>, GatewayError> {
        extract_list(self.list("projects", &[("workspaceId", workspace_id)])?, Some("projects"))
    }

    fn list_tasks(&self, project_id: &str) -> Result<Vec<RemoteTask>, GatewayError> {
        extract_list(self.list("tasks", &[("projectId", project_id)])?, Some("tasks"))
    }

    fn list_schedules(&self) -> Result<Vec<Schedule>, GatewayError> {
        extract_list(self.list("schedules", &[])?, None)
    }

    fn create_project(&self, payload: &ProjectPayload) -> Result<Created, GatewayError> {
        extract_created(self.create("projects", payload)?)
    }

    fn create_task(&self, payload: &TaskPayload) -> Result<Created, GatewayError> {
        extract_created(self.create("tasks", payload)?)
    }
}

/// Decode a list response, either enveloped under `key` or a bare array.
pub fn extract_list<T: DeserializeOwned>(body: Value, key: Option<&str>) -> Result<Vec<T>, GatewayError> {
    let items = match key {
        Some(key) => match body {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| GatewayError::Shape(format!("missing '{key}' in response")))?,
            _ => return Err(GatewayError::Shape(format!("expected an object holding '{key}'"))),
        },
        None => body,
    };
    if !items.is_array() {
        return Err(GatewayError::Shape("expected a list".into()));
    }
    serde_json::from_value(items).map_err(|e| GatewayError::Shape(e.to_string()))
}

/// A create succeeded only if the body carries a string `id`.
pub fn extract_created(body: Value) -> Result<Created, GatewayError> {
    match body.get("id").and_then(Value::as_str) {
        Some(id) => Ok(Created { id: id.to_string() }),
        None => Err(GatewayError::Shape("response has no 'id' field".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config() -> Config {
        Config {
            api_key: "secret".into(),
            api_url: "https://api.example.test/v1/".into(),
            templates_dir: "templates".into(),
        }
    }

    fn client_for(server: &Server) -> MotionClient {
        let cfg = Config {
            api_url: server.url(),
            ..config()
        };
        MotionClient::new(&cfg).unwrap()
    }

    fn task_payload(name: &str) -> TaskPayload {
        TaskPayload {
            name: name.into(),
            workspace_id: "ws_1".into(),
            due_date: "2025-01-04T10:00:00Z".into(),
            duration: 30,
            priority: Some(Priority::High),
            project_id: None,
            auto_scheduled: None,
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = MotionClient::new(&config()).unwrap();
        assert_eq!(client.url("tasks"), "https://api.example.test/v1/tasks");
        assert_eq!(client.url("/projects"), "https://api.example.test/v1/projects");
    }

    #[test]
    fn test_rejects_key_that_cannot_be_a_header() {
        let mut cfg = config();
        cfg.api_key = "bad\nkey".into();
        assert!(matches!(
            MotionClient::new(&cfg),
            Err(GatewayError::Config(ConfigError::InvalidApiKey))
        ));
    }

    #[test]
    fn test_extract_enveloped_list() {
        let body = json!({ "workspaces": [{ "id": "w1", "name": "Team" }], "meta": {} });
        let ws: Vec<Workspace> = extract_list(body, Some("workspaces")).unwrap();
        assert_eq!(ws, vec![Workspace { id: "w1".into(), name: "Team".into() }]);
    }

    #[test]
    fn test_extract_bare_list() {
        let body = json!([{ "name": "Work Hours", "timezone": "UTC" }, { "name": "Evenings" }]);
        let schedules: Vec<Schedule> = extract_list(body, None).unwrap();
        assert_eq!(schedules.len(), 2);
        assert_eq!(schedules[1].timezone, None);
    }

    #[test]
    fn test_extract_list_shape_errors() {
        let missing = extract_list::<Workspace>(json!({ "projects": [] }), Some("workspaces"));
        assert!(matches!(missing, Err(GatewayError::Shape(_))));
        let not_list = extract_list::<Schedule>(json!({ "name": "x" }), None);
        assert!(matches!(not_list, Err(GatewayError::Shape(_))));
    }

    #[test]
    fn test_remote_task_tolerates_odd_fields() {
        let body = json!({ "tasks": [
            { "name": "A", "duration": "NONE", "priority": "HIGH", "dueDate": null },
            { "id": "t2" }
        ]});
        let tasks: Vec<RemoteTask> = extract_list(body, Some("tasks")).unwrap();
        assert_eq!(tasks[0].duration, Some(json!("NONE")));
        assert_eq!(tasks[1].name, None);
    }

    #[test]
    fn test_created_requires_id() {
        let created = extract_created(json!({ "id": "task_1", "name": "A" })).unwrap();
        assert_eq!(created.id, "task_1");
        assert!(matches!(
            extract_created(json!({ "name": "A" })),
            Err(GatewayError::Shape(_))
        ));
        assert!(matches!(extract_created(json!({ "id": 7 })), Err(GatewayError::Shape(_))));
    }

    #[test]
    fn test_lists_send_key_and_filters() {
        let mut server = Server::new();
        let workspaces = server
            .mock("GET", "/workspaces")
            .match_header("x-api-key", "secret")
            .with_header("content-type", "application/json")
            .with_body(r#"{"workspaces": [{"id": "w1", "name": "Team"}]}"#)
            .create();
        let projects = server
            .mock("GET", "/projects")
            .match_header("x-api-key", "secret")
            .match_query(Matcher::UrlEncoded("workspaceId".into(), "w1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"projects": [{"id": "p1", "name": "Launch", "workspaceId": "w1"}]}"#)
            .create();
        let tasks = server
            .mock("GET", "/tasks")
            .match_header("x-api-key", "secret")
            .match_query(Matcher::UrlEncoded("projectId".into(), "p1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"tasks": [{"name": "Brief", "duration": 45}]}"#)
            .create();
        let client = client_for(&server);

        assert_eq!(client.list_workspaces().unwrap()[0].id, "w1");
        assert_eq!(client.list_projects("w1").unwrap()[0].name, "Launch");
        assert_eq!(client.list_tasks("p1").unwrap()[0].duration, Some(json!(45)));

        workspaces.assert();
        projects.assert();
        tasks.assert();
    }

    #[test]
    fn test_create_task_posts_json_and_reads_id() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/tasks")
            .match_header("x-api-key", "secret")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "name": "Brief",
                "workspaceId": "ws_1",
                "priority": "HIGH"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "task_9", "name": "Brief"}"#)
            .create();
        let client = client_for(&server);

        let created = client.create_task(&task_payload("Brief")).unwrap();

        assert_eq!(created.id, "task_9");
        mock.assert();
    }

    #[test]
    fn test_error_status_keeps_code_and_body() {
        let mut server = Server::new();
        server
            .mock("POST", "/tasks")
            .with_status(429)
            .with_body("rate limited")
            .create();
        let client = client_for(&server);

        match client.create_task(&task_payload("Brief")) {
            Err(GatewayError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_success_is_a_shape_error() {
        let mut server = Server::new();
        server
            .mock("GET", "/schedules")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();
        let client = client_for(&server);

        assert!(matches!(client.list_schedules(), Err(GatewayError::Shape(_))));
    }

    #[test]
    fn test_unreachable_service_is_a_transport_error() {
        let cfg = Config {
            api_url: "http://127.0.0.1:1".into(),
            ..config()
        };
        let client = MotionClient::new(&cfg).unwrap();
        assert!(matches!(client.list_workspaces(), Err(GatewayError::Transport(_))));
    }
}
