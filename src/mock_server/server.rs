//! Mock FOSSology API server.
//!
//! Provides an axum-based HTTP server that simulates the FOSSology REST API
//! below `/repo/api/v1` and `/repo/api/v2`.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::MockState;

/// A mock FOSSology server for testing.
///
/// The server runs in the background and can be used to test the client
/// against FOSSology's routes, status codes and 503 "not ready" answers.
pub struct MockServer {
    /// The server URL, including the `/repo` prefix.
    url: String,
    /// Background task running axum.
    handle: JoinHandle<()>,
    /// Folders, uploads, jobs and reports served by the routes.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a server holding [`Fixtures::default_scenario`].
    ///
    /// Listens on an ephemeral port on localhost; see [`MockServer::url`].
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a server without any folders, uploads or jobs.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a server serving `state`.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Port 0 lets the OS pick
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}/repo", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the server URL.
    ///
    /// Use this URL when creating a `FossologyClient` for testing.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The live state, for inspecting what requests changed.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Stop serving and wait for the task to finish.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// The default scenario on top of an otherwise empty state.
    pub fn default_state() -> MockState {
        Self::state_from_scenario(MockState::new(), Fixtures::default_scenario())
    }

    /// Add the entities of a scenario to `state`.
    pub fn state_from_scenario(state: MockState, scenario: DefaultScenario) -> MockState {
        let state = scenario
            .folders
            .into_iter()
            .fold(state, MockState::with_folder);
        let state = scenario
            .uploads
            .into_iter()
            .fold(state, MockState::with_upload);
        let state = scenario.jobs.into_iter().fold(state, MockState::with_job);
        let state = scenario
            .groups
            .into_iter()
            .fold(state, MockState::with_group);
        scenario
            .licenses
            .into_iter()
            .fold(state, MockState::with_license)
    }

    /// Routes below `/repo/api/v1` and `/repo/api/v2`.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        let api = Router::new()
            // Server routes
            .route("/info", get(handlers::get_info))
            .route("/health", get(handlers::get_health))
            .route("/tokens", post(handlers::create_token))
            .route("/users/self", get(handlers::get_self))
            // Folder routes
            .route(
                "/folders",
                get(handlers::list_folders).post(handlers::create_folder),
            )
            .route(
                "/folders/:id",
                get(handlers::get_folder).delete(handlers::delete_folder),
            )
            // Upload routes
            .route(
                "/uploads",
                get(handlers::list_uploads).post(handlers::create_upload),
            )
            .route(
                "/uploads/:id",
                get(handlers::get_upload).delete(handlers::delete_upload),
            )
            .route("/uploads/:id/summary", get(handlers::get_upload_summary))
            // Job routes
            .route("/jobs", get(handlers::list_jobs).post(handlers::create_job))
            .route("/jobs/all", get(handlers::list_jobs))
            .route("/jobs/:id", get(handlers::get_job))
            // Report routes
            .route("/report", get(handlers::generate_report))
            .route("/report/:id", get(handlers::download_report))
            // Group and license routes
            .route(
                "/groups",
                get(handlers::list_groups).post(handlers::create_group),
            )
            .route("/license", get(handlers::list_licenses));

        Router::new()
            .nest("/repo/api/v1", api.clone())
            .nest("/repo/api/v2", api)
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        get_info, get_self, upload_summary, ApiVersion, Folder, FossologyClient, FossologyError,
        Get, JobQuery, List, PageRequest, Upload,
    };

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/api/v1/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_connect_learns_version() {
        let server = MockServer::with_state(MockState::new().with_version("1.4.3")).await;
        let client = FossologyClient::connect("test-token", server.url())
            .await
            .expect("Failed to connect");

        assert_eq!(client.server_version().unwrap().to_string(), "1.4.3");
        let info = get_info(&client).await.unwrap();
        assert_eq!(info.name, "FOSSology API");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_folder_with_client() {
        let server = MockServer::start().await;
        let client = FossologyClient::new("test-token", server.url()).unwrap();

        let folder = Folder::get(&client, 2).await.expect("Failed to get folder");
        assert_eq!(folder.name, "Scans");
        assert_eq!(folder.parent, Some(1));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_list_pages_on_both_api_versions() {
        let state = (10..15).fold(MockServer::default_state(), |state, id| {
            state.with_upload(Fixtures::upload(id, 2, "x.zip", "2023-02-01 08:00:00.0+00"))
        });
        let server = MockServer::with_state(state).await;

        for version in [ApiVersion::V1, ApiVersion::V2] {
            let client = FossologyClient::new("test-token", server.url())
                .unwrap()
                .with_api_version(version);
            let page = Upload::list(&client, &Default::default(), &PageRequest::all(2))
                .await
                .expect("Failed to list uploads");
            assert_eq!(page.len(), 6);
            assert_eq!(page.total_pages, 3);
        }

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_jobs_filtered_by_upload() {
        let server = MockServer::start().await;
        let client = FossologyClient::new("test-token", server.url()).unwrap();

        let query = JobQuery {
            upload: Some(2),
            ..Default::default()
        };
        let page = crate::Job::list(&client, &query, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);

        let upload = Upload::get(&client, 2).await.unwrap();
        let summary = upload_summary(&client, &upload, None).await.unwrap();
        assert_eq!(summary.upload_name, "base-files_11.tar.xz");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_required_token() {
        let state = MockServer::default_state().with_required_token("secret");
        let server = MockServer::with_state(state).await;

        let client = FossologyClient::new("wrong", server.url()).unwrap();
        let result = get_self(&client).await;
        assert!(matches!(result, Err(FossologyError::Authentication { .. })));

        let client = FossologyClient::new("secret", server.url()).unwrap();
        assert_eq!(get_self(&client).await.unwrap().name, "fossy");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = FossologyClient::new("test-token", server.url()).unwrap();

        let result = Folder::get(&client, 1).await;
        assert!(matches!(result, Err(FossologyError::NotFound { .. })));

        server.shutdown().await;
    }
}
