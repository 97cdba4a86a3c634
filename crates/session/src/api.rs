//! HTTP client for the collaborator API
//!
//! One method per endpoint. Non-2xx answers become `ApiError::Status`;
//! bodies that say `success: false` become `ApiError::Rejected`. Nothing
//! here retries.

use std::time::Duration;

use maestro_protocol::rest::{
    AgentLogsResponse, AnalyzeRequest, AnalyzeResponse, FileContentResponse, FilesResponse,
    ImportRequest, ImportResponse, OpenProjectResponse, OpenedProject, PresetRequest,
    ProjectsResponse, ProviderResponse, PullRequest, StartRequest, StartResponse,
};
use maestro_protocol::{FileEntry, ModelPreset, ProjectSummary, ProjectType, Provider};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedProject {
    pub name: Option<String>,
    pub project_type: ProjectType,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(
            component = "api",
            event = "api.response",
            url = %response.url(),
            status = status.as_u16(),
            "Collaborator responded"
        );
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// `POST /start`, returning the new project id
    pub async fn start_run(
        &self,
        objective: &str,
        project_name: Option<&str>,
    ) -> Result<String, ApiError> {
        let body = StartRequest {
            objective: objective.to_string(),
            project_name: project_name.map(str::to_string),
        };
        let response: StartResponse = self
            .execute(self.http.post(self.url("/start")).json(&body))
            .await?;
        Ok(response.project_id)
    }

    /// `GET /projects`
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        let response: ProjectsResponse = self.execute(self.http.get(self.url("/projects"))).await?;
        Ok(response.projects)
    }

    /// `POST /projects/open?path=`
    pub async fn open_project(&self, path: &str) -> Result<OpenedProject, ApiError> {
        let response: OpenProjectResponse = self
            .execute(
                self.http
                    .post(self.url("/projects/open"))
                    .query(&[("path", path)]),
            )
            .await?;
        match (response.success, response.project) {
            (true, Some(project)) => Ok(project),
            _ => Err(ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("could not open {path}")),
            )),
        }
    }

    /// `DELETE /projects/{path}`
    pub async fn delete_project(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/projects/{}", urlencoding::encode(path)));
        let _: serde_json::Value = self.execute(self.http.delete(url)).await?;
        Ok(())
    }

    /// `POST /projects/analyze`
    pub async fn analyze_folder(&self, path: &str) -> Result<ProjectType, ApiError> {
        let body = AnalyzeRequest {
            path: path.to_string(),
        };
        let response: AnalyzeResponse = self
            .execute(self.http.post(self.url("/projects/analyze")).json(&body))
            .await?;
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("could not analyze {path}")),
            ));
        }
        Ok(response.project_type.unwrap_or_default())
    }

    /// `POST /projects/import`
    pub async fn import_project(
        &self,
        path: &str,
        name: Option<&str>,
    ) -> Result<ImportedProject, ApiError> {
        let body = ImportRequest {
            path: path.to_string(),
            name: name.map(str::to_string),
        };
        let response: ImportResponse = self
            .execute(self.http.post(self.url("/projects/import")).json(&body))
            .await?;
        if !response.success {
            return Err(ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("could not import {path}")),
            ));
        }
        Ok(ImportedProject {
            name: response.name,
            project_type: response.project_type.unwrap_or_default(),
        })
    }

    /// `GET /files`
    pub async fn list_files(&self) -> Result<Vec<FileEntry>, ApiError> {
        let response: FilesResponse = self.execute(self.http.get(self.url("/files"))).await?;
        Ok(response.files)
    }

    /// `GET /files/{path}`
    pub async fn read_file(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url(&format!("/files/{}", encode_path(path)));
        match self.execute::<FileContentResponse>(self.http.get(url)).await? {
            FileContentResponse::Content { content } => Ok(content),
            FileContentResponse::Error { error } => Err(ApiError::Rejected(error)),
        }
    }

    /// `GET /logs/{agent}`
    pub async fn agent_logs(&self, agent: &str) -> Result<Vec<String>, ApiError> {
        let url = self.url(&format!("/logs/{}", urlencoding::encode(agent)));
        let response: AgentLogsResponse = self.execute(self.http.get(url)).await?;
        Ok(response.lines())
    }

    /// `POST /models/preset`
    pub async fn set_model_preset(&self, preset: ModelPreset) -> Result<(), ApiError> {
        let body = PresetRequest { preset };
        let _: serde_json::Value = self
            .execute(self.http.post(self.url("/models/preset")).json(&body))
            .await?;
        Ok(())
    }

    /// `GET /{provider}/status`
    pub async fn provider_status(&self, provider: Provider) -> Result<ProviderResponse, ApiError> {
        let url = self.url(&format!("/{}/status", provider.path_segment()));
        self.execute(self.http.get(url)).await
    }

    /// `GET /{provider}/models`
    pub async fn provider_models(&self, provider: Provider) -> Result<Vec<String>, ApiError> {
        let url = self.url(&format!("/{}/models", provider.path_segment()));
        let response: ProviderResponse = self.execute(self.http.get(url)).await?;
        if !response.is_ok() {
            return Err(ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("{provider} is offline")),
            ));
        }
        Ok(response.model_names())
    }

    /// `POST /ollama/pull` starts a download on the server; completion is
    /// observed by polling [`ApiClient::provider_models`].
    pub async fn pull_model(&self, model: &str) -> Result<(), ApiError> {
        let body = PullRequest {
            model: model.to_string(),
        };
        let url = self.url(&format!("/{}/pull", Provider::Ollama.path_segment()));
        let response: ProviderResponse = self.execute(self.http.post(url).json(&body)).await?;
        if !response.is_ok() {
            return Err(ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("could not pull {model}")),
            ));
        }
        Ok(())
    }
}

/// Whether a model shows up in a provider listing. Ollama lists pulled
/// models with a tag (`llama3:latest`).
pub fn model_listed(names: &[String], model: &str) -> bool {
    names.iter().any(|name| {
        name == model
            || name
                .strip_prefix(model)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// Encode each segment of a relative file path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
