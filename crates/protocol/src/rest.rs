//! Request and response bodies of the server's HTTP API

use serde::{Deserialize, Serialize};

use crate::types::{FileEntry, ModelEntry, ModelPreset, ProjectSummary, ProjectType};

/// `POST /start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub objective: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(rename = "projectId")]
    pub project_id: String,
}

/// `GET /projects`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

/// `POST /projects/open?path=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenProjectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub project: Option<OpenedProject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedProject {
    pub name: String,
    #[serde(default)]
    pub objective: String,
}

/// `POST /projects/analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /projects/import`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /files`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// `GET /files/{path}` answers with either the content or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContentResponse {
    Content { content: String },
    Error { error: String },
}

/// `GET /logs/{agent}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLogsResponse {
    #[serde(default)]
    pub logs: serde_json::Value,
}

impl AgentLogsResponse {
    /// Flatten the log payload into display lines.
    pub fn lines(&self) -> Vec<String> {
        match &self.logs {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::String(text) => text.lines().map(str::to_string).collect(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

/// `POST /models/preset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetRequest {
    pub preset: ModelPreset,
}

/// `POST /ollama/pull`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub model: String,
}

/// Shape shared by every provider endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResponse {
    /// A provider answer is healthy unless it says otherwise.
    pub fn is_ok(&self) -> bool {
        self.online.or(self.success).unwrap_or(true) && self.error.is_none()
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name().to_string()).collect()
    }
}
