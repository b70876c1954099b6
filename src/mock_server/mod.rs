//! Mock FOSSology API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the FOSSology
//! REST API for integration and end-to-end testing. Unlike wiremock which
//! mocks at the HTTP level per-test, this server maintains state across
//! requests: uploads created through the API show up in listings, scheduled
//! jobs can be fetched, and reports answer `503` for a configurable number of
//! polls before they can be downloaded.
//!
//! # Example
//!
//! ```ignore
//! use fossology::mock_server::MockServer;
//! use fossology::{FossologyClient, Folder, Get};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = FossologyClient::connect("test-token", server.url()).await.unwrap();
//!
//!     // Server comes with default fixtures
//!     let folder = Folder::get(&client, 1).await.unwrap();
//!     assert_eq!(folder.name, "Software Repository");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures, ROOT_FOLDER_ID};
pub use server::MockServer;
pub use state::{MockReport, MockState};
