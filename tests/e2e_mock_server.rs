//! E2E tests using the mock FOSSology server.
//!
//! These tests exercise full workflows against the mock server,
//! testing realistic scenarios rather than individual endpoints.

#![cfg(feature = "test-server")]

use std::path::{Path, PathBuf};

use fossology::mock_server::{Fixtures, MockServer, MockState, ROOT_FOLDER_ID};
use fossology::workflow::{run_workflow, WorkflowOptions};
use fossology::{
    create_folder, create_group, delete_upload, ensure_group, fossology_token, get_self,
    list_folders, upload_file, FossologyClient, FossologyError, Get, JobStatus, List,
    PageRequest, ReportFormat, TokenRequest, TokenScope, Upload, UploadOptions, UploadQuery,
    UploadSource,
};

async fn connect(server: &MockServer) -> FossologyClient {
    FossologyClient::connect("test-token", server.url())
        .await
        .expect("Failed to connect")
}

fn write_sample(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"sample archive content").unwrap();
    path
}

fn options_in(dir: &Path) -> WorkflowOptions {
    WorkflowOptions {
        result_dir: dir.join("results"),
        job_timeout: 0,
        ..Default::default()
    }
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    // Both servers should have different URLs
    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    // After shutdown, server should not respond
    let client = reqwest::Client::new();
    let result = client.get(format!("{}/api/v1/health", url)).send().await;

    assert!(result.is_err());
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_token_then_self_workflow() {
    let state = MockServer::default_state().with_required_token("s3cret");
    let server = MockServer::with_state(state).await;

    // Step 1: Exchange credentials for a token
    let request = TokenRequest::new("fossy", "fossy", "e2e", TokenScope::Write, None);
    let token = fossology_token(server.url(), &request).await.unwrap();
    assert_eq!(token, "s3cret");

    // Step 2: Use the token
    let client = FossologyClient::connect(&token, server.url()).await.unwrap();
    let me = get_self(&client).await.unwrap();
    assert_eq!(me.name, "fossy");
    assert_eq!(me.root_folder_id, Some(ROOT_FOLDER_ID));

    // A foreign token is rejected
    let client = FossologyClient::new("other", server.url()).unwrap();
    assert!(matches!(
        get_self(&client).await,
        Err(FossologyError::Authentication { .. })
    ));

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_user_gets_no_token() {
    let server = MockServer::start().await;

    let request = TokenRequest::new("mallory", "secret", "e2e", TokenScope::Read, None);
    let result = fossology_token(server.url(), &request).await;
    assert!(matches!(result, Err(FossologyError::Authentication { .. })));

    server.shutdown().await;
}

// =============================================================================
// Folder, Group and Upload Tests
// =============================================================================

#[tokio::test]
async fn test_create_folder_twice_returns_same_folder() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let root = fossology::Folder::get(&client, ROOT_FOLDER_ID).await.unwrap();
    let first = create_folder(&client, &root, "Releases", Some("Release scans"), None)
        .await
        .unwrap();
    let second = create_folder(&client, &root, "Releases", None, None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.description.as_deref(), Some("Release scans"));
    assert_eq!(list_folders(&client, None).await.unwrap().len(), 3);

    server.shutdown().await;
}

#[tokio::test]
async fn test_existing_group_is_reported() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    create_group(&client, "qa").await.unwrap();
    let err = create_group(&client, "qa").await.unwrap_err();

    assert!(err.is_already_exists());
    assert!(err.to_string().contains("Group qa already exists"));

    // The CLI path tolerates the duplicate
    ensure_group(&client, "qa").await.unwrap();
    assert_eq!(server.state().read().await.groups.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_upload_list_and_delete_workflow() {
    let state = MockServer::default_state().with_upload_delay(1);
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(dir.path(), "zlib-1.3.tar.gz");

    // Step 1: Upload; details answer 503 once before they are ready
    let root = fossology::Folder::get(&client, ROOT_FOLDER_ID).await.unwrap();
    let options = UploadOptions {
        description: Some("e2e".to_string()),
        ..Default::default()
    };
    let upload = upload_file(&client, &root, &UploadSource::File(file), &options)
        .await
        .unwrap();
    assert_eq!(upload.upload_name, "zlib-1.3.tar.gz");
    assert_eq!(upload.size(), Some(22));

    // Step 2: It shows up in the folder listing
    let query = UploadQuery {
        folder: Some(ROOT_FOLDER_ID),
        ..Default::default()
    };
    let uploads = Upload::list(&client, &query, &PageRequest::default()).await.unwrap();
    assert!(uploads.iter().any(|u| u.id == upload.id));

    // Step 3: Delete it
    delete_upload(&client, &upload, None).await.unwrap();
    let result = Upload::get(&client, upload.id).await;
    assert!(matches!(result, Err(FossologyError::NotFound { .. })));

    server.shutdown().await;
}

// =============================================================================
// Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_full_workflow_writes_report() {
    let server = MockServer::with_state(MockServer::default_state().with_report_delay(1)).await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(dir.path(), "openssl-3.0.tar.gz");

    let options = WorkflowOptions {
        folder_name: "Scans".to_string(),
        report_format: ReportFormat::Spdx2,
        ..options_in(dir.path())
    };
    let outcome = run_workflow(&client, &file, &options).await.unwrap();

    assert_eq!(outcome.upload.folder_id, 2);
    assert_eq!(outcome.job.status, JobStatus::Completed);
    assert_eq!(
        outcome.report_path,
        dir.path().join("results").join("SPDX2_openssl-3.0.tar.gz.rdf")
    );
    let content = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(content.contains("openssl-3.0.tar.gz"));

    // The server saw exactly one new upload and one new job
    let state = server.state();
    let state = state.read().await;
    assert_eq!(state.uploads.len(), 2);
    assert_eq!(state.jobs.len(), 2);
    assert!(state.reports.contains_key(&outcome.report_id));

    drop(state);
    server.shutdown().await;
}

#[tokio::test]
async fn test_workflow_reuses_newest_upload_and_job() {
    let state = MockServer::default_state()
        .with_upload(Fixtures::upload(
            20,
            ROOT_FOLDER_ID,
            "base-files_11.tar.xz",
            "2023-03-01 09:00:00.0+00",
        ))
        .with_job(Fixtures::job(21, 20, JobStatus::Completed, "2023-03-01 09:01:00.0+00"))
        .with_job(Fixtures::job(22, 20, JobStatus::Completed, "2023-03-02 09:01:00.0+00"));
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();

    // The file does not need to exist when the upload is reused
    let file = dir.path().join("base-files_11.tar.xz");
    let options = WorkflowOptions {
        reuse_newest_upload: true,
        reuse_newest_job: true,
        ..options_in(dir.path())
    };
    let outcome = run_workflow(&client, &file, &options).await.unwrap();

    assert_eq!(outcome.upload.id, 20);
    assert_eq!(outcome.job.id, 22);
    assert!(outcome.report_path.exists());

    let state = server.state();
    assert_eq!(state.read().await.uploads.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_dry_run_without_reuse_finds_no_upload() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(dir.path(), "never-uploaded.zip");

    let options = WorkflowOptions {
        dry_run: true,
        ..options_in(dir.path())
    };
    let err = run_workflow(&client, &file, &options).await.unwrap_err();

    assert!(matches!(err, FossologyError::Workflow(_)));
    assert!(err.to_string().starts_with("Unable to find upload for"));
    assert_eq!(server.state().read().await.uploads.len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_workflow_stops_on_processing_job() {
    let state = MockServer::default_state().with_scheduled_job_status(JobStatus::Processing);
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(dir.path(), "busy.zip");

    let err = run_workflow(&client, &file, &options_in(dir.path()))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("is still in state Processing"));
    assert!(message.contains("--reuse_newest_upload --reuse_newest_job"));
    assert!(!dir.path().join("results").exists());

    server.shutdown().await;
}

#[tokio::test]
async fn test_workflow_rejects_unknown_folder() {
    let state = MockState::new().with_folder(Fixtures::root_folder());
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_sample(dir.path(), "a.zip");

    let options = WorkflowOptions {
        folder_name: "Missing".to_string(),
        ..options_in(dir.path())
    };
    let err = run_workflow(&client, &file, &options).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Invalid argument: Requested Upload Folder Missing does not exist."
    );

    server.shutdown().await;
}
