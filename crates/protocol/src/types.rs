//! Core types shared across the protocol

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What an agent reports about itself in a log frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Active,
    Waiting,
    Error,
    Complete,
}

impl StatusKind {
    /// Absent or unrecognised status words mean the agent is working.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("error") => StatusKind::Error,
            Some("waiting") => StatusKind::Waiting,
            Some("complete") => StatusKind::Complete,
            _ => StatusKind::Active,
        }
    }
}

/// Lifecycle of a saved project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ProjectStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl From<String> for ProjectStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" | "in_progress" => ProjectStatus::Running,
            "completed" | "complete" | "done" => ProjectStatus::Completed,
            "failed" | "error" => ProjectStatus::Failed,
            _ => ProjectStatus::Pending,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Running => "running",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Summary of a saved project for list views.
///
/// The project's path doubles as its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(alias = "id")]
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub objective: String,
    pub status: ProjectStatus,
    #[serde(alias = "updatedAt", default)]
    pub updated_at: String,
}

impl ProjectSummary {
    pub fn id(&self) -> &str {
        &self.path
    }
}

/// Model preset selection forwarded to the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPreset {
    #[default]
    Basic,
    Standard,
    Advanced,
    #[serde(rename = "nocost")]
    NoCost,
}

impl ModelPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelPreset::Basic => "basic",
            ModelPreset::Standard => "standard",
            ModelPreset::Advanced => "advanced",
            ModelPreset::NoCost => "nocost",
        }
    }
}

impl FromStr for ModelPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ModelPreset::Basic),
            "standard" => Ok(ModelPreset::Standard),
            "advanced" => Ok(ModelPreset::Advanced),
            "nocost" | "no_cost" | "no-cost" => Ok(ModelPreset::NoCost),
            other => Err(format!(
                "unknown preset '{other}' (expected basic, standard, advanced or nocost)"
            )),
        }
    }
}

impl fmt::Display for ModelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local model provider reachable through the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Ollama,
    #[serde(rename = "nocost")]
    NoCost,
}

impl Provider {
    /// Path prefix of the provider's endpoints
    pub fn path_segment(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::NoCost => "nocost",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "nocost" | "no_cost" | "no-cost" => Ok(Provider::NoCost),
            other => Err(format!(
                "unknown provider '{other}' (expected ollama or nocost)"
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Detected framework and language of a project folder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectType {
    #[serde(default = "unknown")]
    pub framework: String,
    #[serde(default = "unknown")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_files: Vec<String>,
}

fn unknown() -> String {
    "unknown".to_string()
}

/// A file exposed by the server's workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub name: String,
}

/// Provider model listings come either as bare names or as objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Name(String),
    Detailed { name: String },
}

impl ModelEntry {
    pub fn name(&self) -> &str {
        match self {
            ModelEntry::Name(name) | ModelEntry::Detailed { name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_kind_from_wire_covers_every_word() {
        assert_eq!(StatusKind::from_wire(Some("error")), StatusKind::Error);
        assert_eq!(StatusKind::from_wire(Some("waiting")), StatusKind::Waiting);
        assert_eq!(StatusKind::from_wire(Some("complete")), StatusKind::Complete);
        assert_eq!(StatusKind::from_wire(Some("active")), StatusKind::Active);
        assert_eq!(StatusKind::from_wire(Some("running")), StatusKind::Active);
        assert_eq!(StatusKind::from_wire(None), StatusKind::Active);
    }

    #[test]
    fn project_summary_accepts_legacy_status_words() {
        let json = r#"{
          "name":"Todo App",
          "path":"/projects/todo_20240101",
          "status":"in_progress",
          "updated_at":"2024-01-01T10:00:00",
          "objective":"Build a todo app"
        }"#;
        let parsed: ProjectSummary = serde_json::from_str(json).expect("parse summary");
        assert_eq!(parsed.status, ProjectStatus::Running);
        assert_eq!(parsed.id(), "/projects/todo_20240101");

        let planning: ProjectStatus = "planning".to_string().into();
        assert_eq!(planning, ProjectStatus::Pending);
    }

    #[test]
    fn project_summary_accepts_camel_case_aliases() {
        let json = r#"{"id":"p9","name":"Nine","status":"failed","updatedAt":"2024-02-02"}"#;
        let parsed: ProjectSummary = serde_json::from_str(json).expect("parse summary");
        assert_eq!(parsed.path, "p9");
        assert_eq!(parsed.updated_at, "2024-02-02");
        assert_eq!(parsed.status, ProjectStatus::Failed);
        assert!(parsed.objective.is_empty());
    }

    #[test]
    fn preset_parses_and_serializes() {
        assert_eq!("NoCost".parse::<ModelPreset>(), Ok(ModelPreset::NoCost));
        assert!("turbo".parse::<ModelPreset>().is_err());
        let json = serde_json::to_string(&ModelPreset::NoCost).expect("serialize preset");
        assert_eq!(json, "\"nocost\"");
    }

    #[test]
    fn model_entries_accept_names_and_objects() {
        let entries: Vec<ModelEntry> =
            serde_json::from_str(r#"["llama3", {"name":"mistral","size":4}]"#).expect("parse");
        let names: Vec<&str> = entries.iter().map(ModelEntry::name).collect();
        assert_eq!(names, vec!["llama3", "mistral"]);
    }
}
