//! Client-side cache of saved projects
//!
//! The cache is always replaced wholesale from the server's listing; it is
//! never patched locally. Failures leave a visible placeholder instead of
//! stale rows.

use maestro_protocol::rest::OpenedProject;
use maestro_protocol::ProjectSummary;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Entries shown in the "recent" strip
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogView {
    /// Nothing requested yet
    #[default]
    Unloaded,
    Empty,
    Grid,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub view: CatalogView,
    pub projects: Vec<ProjectSummary>,
    /// Most recently updated first, at most [`RECENT_LIMIT`]
    pub recent: Vec<ProjectSummary>,
}

/// Proof that the operator was asked before a delete. Only
/// [`ProjectCatalog::request_delete`] creates one.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingDelete {
    id: String,
    name: Option<String>,
}

impl PendingDelete {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    projects: Vec<ProjectSummary>,
    view: CatalogView,
}

impl ProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    pub fn projects(&self) -> &[ProjectSummary] {
        &self.projects
    }

    pub fn find(&self, id: &str) -> Option<&ProjectSummary> {
        self.projects.iter().find(|p| p.id() == id)
    }

    /// Replace the cache with a listing result.
    pub fn apply_listing(&mut self, listing: Result<Vec<ProjectSummary>, ApiError>) {
        match listing {
            Ok(projects) => {
                self.view = if projects.is_empty() {
                    CatalogView::Empty
                } else {
                    CatalogView::Grid
                };
                self.projects = projects;
                info!(
                    component = "catalog",
                    event = "catalog.refreshed",
                    count = self.projects.len(),
                    "Project catalog refreshed"
                );
            }
            Err(e) => self.record_failure(&e),
        }
    }

    /// Drop every row and show `error` in their place.
    pub fn record_failure(&mut self, error: &ApiError) {
        warn!(
            component = "catalog",
            event = "catalog.request_failed",
            error = %error,
            "Project catalog request failed"
        );
        self.projects.clear();
        self.view = CatalogView::Error(error.to_string());
    }

    pub fn recent(&self) -> Vec<ProjectSummary> {
        let mut recent = self.projects.clone();
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        recent.truncate(RECENT_LIMIT);
        recent
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            view: self.view.clone(),
            projects: self.projects.clone(),
            recent: self.recent(),
        }
    }

    /// `GET /projects` and replace everything.
    pub async fn refresh(&mut self, api: &ApiClient) -> CatalogSnapshot {
        let listing = api.list_projects().await;
        self.apply_listing(listing);
        self.snapshot()
    }

    /// Ask the server to open a project, then refresh the listing.
    pub async fn open(&mut self, api: &ApiClient, id: &str) -> Result<OpenedProject, ApiError> {
        match api.open_project(id).await {
            Ok(project) => {
                self.refresh(api).await;
                Ok(project)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// First step of a delete: nothing is sent yet.
    pub fn request_delete(&self, id: &str) -> PendingDelete {
        PendingDelete {
            id: id.to_string(),
            name: self.find(id).map(|p| p.name.clone()),
        }
    }

    /// Second step of a delete: issue the call, then refresh.
    pub async fn confirm_delete(
        &mut self,
        api: &ApiClient,
        pending: PendingDelete,
    ) -> Result<(), ApiError> {
        match api.delete_project(pending.id()).await {
            Ok(()) => {
                info!(
                    component = "catalog",
                    event = "catalog.deleted",
                    project = %pending.id(),
                    "Project deleted"
                );
                self.refresh(api).await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_protocol::ProjectStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summary_json(i: usize, updated_at: &str) -> serde_json::Value {
        serde_json::json!({
            "name": format!("Project {i}"),
            "path": format!("/projects/p{i}"),
            "status": "completed",
            "updated_at": updated_at,
            "objective": format!("Objective {i}")
        })
    }

    async fn mount_listing(server: &MockServer, projects: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "projects": projects })),
            )
            .mount(server)
            .await;
    }

    async fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri()).expect("client")
    }

    #[tokio::test]
    async fn refresh_with_no_projects_shows_empty_state() {
        let server = MockServer::start().await;
        mount_listing(&server, vec![]).await;

        let mut catalog = ProjectCatalog::new();
        let snapshot = catalog.refresh(&api(&server).await).await;

        assert_eq!(snapshot.view, CatalogView::Empty);
        assert!(snapshot.projects.is_empty());
        assert!(snapshot.recent.is_empty());
    }

    #[tokio::test]
    async fn refresh_with_five_projects_fills_grid_and_recent() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            vec![
                summary_json(1, "2024-01-03T10:00:00"),
                summary_json(2, "2024-01-05T10:00:00"),
                summary_json(3, "2024-01-01T10:00:00"),
                summary_json(4, "2024-01-04T10:00:00"),
                summary_json(5, "2024-01-02T10:00:00"),
            ],
        )
        .await;

        let mut catalog = ProjectCatalog::new();
        let snapshot = catalog.refresh(&api(&server).await).await;

        assert_eq!(snapshot.view, CatalogView::Grid);
        assert_eq!(snapshot.projects.len(), 5);
        let recent: Vec<&str> = snapshot.recent.iter().map(|p| p.id()).collect();
        assert_eq!(
            recent,
            vec![
                "/projects/p2",
                "/projects/p4",
                "/projects/p1",
                "/projects/p5",
                "/projects/p3"
            ]
        );
    }

    #[test]
    fn recent_is_capped() {
        let mut catalog = ProjectCatalog::new();
        let projects = (0..8)
            .map(|i| ProjectSummary {
                path: format!("p{i}"),
                name: format!("P{i}"),
                objective: String::new(),
                status: ProjectStatus::Running,
                updated_at: format!("2024-01-0{}", i + 1),
            })
            .collect();
        catalog.apply_listing(Ok(projects));

        let recent = catalog.recent();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].path, "p7");
        assert_eq!(catalog.projects().len(), 8);
    }

    #[tokio::test]
    async fn failed_refresh_replaces_cache_with_error_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut catalog = ProjectCatalog::new();
        catalog.apply_listing(Ok(vec![ProjectSummary {
            path: "old".into(),
            name: "Old".into(),
            objective: String::new(),
            status: ProjectStatus::Pending,
            updated_at: String::new(),
        }]));

        let snapshot = catalog.refresh(&api(&server).await).await;
        assert!(matches!(snapshot.view, CatalogView::Error(_)));
        assert!(snapshot.projects.is_empty());
    }

    #[tokio::test]
    async fn delete_happens_only_after_confirmation_and_refreshes() {
        let server = MockServer::start().await;
        mount_listing(&server, vec![]).await;
        Mock::given(method("DELETE"))
            .and(path("/projects/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api(&server).await;
        let mut catalog = ProjectCatalog::new();
        let pending = catalog.request_delete("p1");
        assert_eq!(pending.id(), "p1");
        assert!(server
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty());

        catalog
            .confirm_delete(&api, pending)
            .await
            .expect("delete confirmed");
        assert_eq!(catalog.view(), &CatalogView::Empty);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/projects/p1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut catalog = ProjectCatalog::new();
        let pending = catalog.request_delete("p1");
        let result = catalog.confirm_delete(&api(&server).await, pending).await;

        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(catalog.view(), CatalogView::Error(_)));
    }

    #[tokio::test]
    async fn failed_open_shows_error_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/open"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let mut catalog = ProjectCatalog::new();
        let result = catalog.open(&api(&server).await, "/nope").await;
        assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
        assert!(matches!(catalog.view(), CatalogView::Error(_)));
    }
}
