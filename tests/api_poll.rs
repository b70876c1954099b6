//! Execution tests for endpoints whose results the server prepares in the background
//!
//! The server answers `503` with `Retry-After: 0` so retries run without delay.

use fossology::{
    detail_job, detail_upload, download_report, generate_report, schedule_jobs, upload_copyrights,
    upload_licenses, upload_summary, CopyrightStatus, Folder, FossologyClient, FossologyError,
    JobSpec, JobStatus, LicenseFindingsQuery, ReportFormat, Upload,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn not_ready() -> ResponseTemplate {
    ResponseTemplate::new(503)
        .insert_header("Retry-After", "0")
        .set_body_json(serde_json::json!({
            "code": 503,
            "message": "Ununpack job not started. Please check job status at /api/v1/jobs?upload=2",
            "type": "INFO"
        }))
}

fn test_upload() -> Upload {
    serde_json::from_value(serde_json::json!({
        "folderid": 1,
        "id": 2,
        "uploadname": "base-files_11.tar.xz",
        "uploaddate": "2023-01-31 10:02:11.123456+00"
    }))
    .unwrap()
}

fn test_folder() -> Folder {
    serde_json::from_value(serde_json::json!({
        "id": 1,
        "name": "Software Repository",
        "description": "Top Folder",
        "parent": null
    }))
    .unwrap()
}

fn job_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 12,
        "name": "base-files_11.tar.xz",
        "queueDate": "2023-01-31 10:05:00.0+00",
        "uploadId": "2",
        "userId": "3",
        "groupId": "3",
        "eta": 0,
        "status": status
    })
}

#[tokio::test]
async fn test_upload_details_are_polled_until_ready() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2"))
        .respond_with(not_ready())
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "folderid": 1,
            "id": 2,
            "uploadname": "base-files_11.tar.xz",
            "uploaddate": "2023-01-31 10:02:11.123456+00"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let upload = detail_upload(&client, 2, None, 0).await.unwrap();

    assert_eq!(upload.upload_name, "base-files_11.tar.xz");
}

#[tokio::test]
async fn test_report_download_gives_up_after_ten_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report/7"))
        .respond_with(not_ready())
        .expect(10)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let err = download_report(&client, 7, None, 0).await.unwrap_err();

    assert!(err.is_retry_exhausted());
    assert_eq!(
        err.to_string(),
        "Download of report 7: still not available after 10 attempts"
    );
}

#[tokio::test]
async fn test_report_download_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report/7"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": 403,
            "message": "Report 7 is not accessible",
            "type": "ERROR"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let err = tokio_test::assert_err!(download_report(&client, 7, Some("qa"), 0).await);

    assert!(matches!(err, FossologyError::Authorization { .. }));
    assert_eq!(
        err.to_string(),
        "Getting report 7 is not authorized for group qa: Report 7 is not accessible (403)"
    );
}

#[tokio::test]
async fn test_generate_and_download_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report"))
        .and(header("uploadId", "2"))
        .and(header("reportFormat", "spdx2"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "code": 201,
            "message": "http://localhost/repo/api/v1/report/17",
            "type": "INFO"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report/17"))
        .respond_with(not_ready())
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report/17"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    "attachment; filename=\"SPDX2_base-files_11.tar.xz.rdf\"",
                )
                .set_body_bytes(b"<rdf/>".to_vec()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let report_id = generate_report(&client, &test_upload(), ReportFormat::Spdx2, None)
        .await
        .unwrap();
    assert_eq!(report_id, 17);

    let file = download_report(&client, report_id, None, 0).await.unwrap();
    assert_eq!(file.name, "SPDX2_base-files_11.tar.xz.rdf");
    assert_eq!(file.content, b"<rdf/>");
}

#[tokio::test]
async fn test_summary_gives_up_after_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/summary"))
        .respond_with(not_ready())
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let err = upload_summary(&client, &test_upload(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FossologyError::RetryExhausted { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_job_wait_checks_exactly_once_more() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("Processing")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("Processing")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let job = detail_job(&client, 12, None, true, 0).await.unwrap();

    // Still processing after the single re-check; no further polling
    assert_eq!(job.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_completed_job_is_not_rechecked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("Completed")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let job = tokio_test::assert_ok!(detail_job(&client, 12, None, true, 30).await);

    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_schedule_jobs_sends_spec_and_returns_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/jobs"))
        .and(header("folderId", "1"))
        .and(header("uploadId", "2"))
        .and(body_partial_json(serde_json::json!({
            "analysis": {"nomos": true, "monk": true},
            "reuse": {"reuse_upload": 0}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "code": 201,
            "message": 12,
            "type": "INFO"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("Queued")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let job = schedule_jobs(
        &client,
        &test_folder(),
        &test_upload(),
        &JobSpec::default(),
        None,
        false,
        0,
    )
    .await
    .unwrap();

    assert_eq!(job.id, 12);
    assert_eq!(job.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_license_findings_for_unscheduled_agent_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/licenses"))
        .respond_with(ResponseTemplate::new(412).set_body_json(serde_json::json!({
            "code": 412,
            "message": "Agent monk not scheduled for the upload.",
            "type": "ERROR"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let query = LicenseFindingsQuery {
        agents: vec!["nomos".to_string(), "monk".to_string()],
        ..Default::default()
    };
    let err = tokio_test::assert_err!(upload_licenses(&client, &test_upload(), &query).await);

    assert_eq!(err.status_code(), Some(412));
    assert!(err
        .to_string()
        .starts_with("Unable to get licenses from nomos,monk for upload 2, agent not scheduled"));
}

#[tokio::test]
async fn test_license_findings_are_polled_with_agents() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/licenses"))
        .respond_with(not_ready())
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/licenses"))
        .and(query_param("agent", "nomos,ojo"))
        .and(query_param("containers", "true"))
        .and(header("groupName", "qa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "filePath": "base-files_11.tar.xz/etc/profile",
                "findings": {"scanner": ["GPL-2.0-or-later"], "conclusion": null}
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let query = LicenseFindingsQuery {
        agents: vec!["nomos".to_string(), "ojo".to_string()],
        containers: true,
        group: Some("qa".to_string()),
    };
    let licenses = upload_licenses(&client, &test_upload(), &query)
        .await
        .unwrap();

    assert_eq!(licenses.len(), 1);
    assert_eq!(licenses[0].file_path, "base-files_11.tar.xz/etc/profile");
    assert_eq!(licenses[0].findings.scanner, vec!["GPL-2.0-or-later"]);
    assert!(licenses[0].findings.conclusion.is_empty());
}

#[tokio::test]
async fn test_copyrights_are_polled_until_ready() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/copyrights"))
        .respond_with(not_ready())
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/copyrights"))
        .and(query_param("status", "active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "copyright": "Copyright (c) 2023 Debian",
                "filePath": ["base-files_11.tar.xz/debian/copyright"]
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let copyrights = upload_copyrights(&client, &test_upload(), CopyrightStatus::Active, None)
        .await
        .unwrap();

    assert_eq!(copyrights.len(), 1);
    assert_eq!(copyrights[0].copyright, "Copyright (c) 2023 Debian");
    assert_eq!(
        copyrights[0].file_path,
        vec!["base-files_11.tar.xz/debian/copyright"]
    );
}

#[tokio::test]
async fn test_copyrights_give_up_after_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads/2/copyrights"))
        .respond_with(not_ready())
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let err = upload_copyrights(&client, &test_upload(), CopyrightStatus::Active, None)
        .await
        .unwrap_err();

    assert!(err.is_retry_exhausted());
}

#[tokio::test]
async fn test_report_without_attachment_name_gets_fallback_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/report/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("SPDXVersion: SPDX-2.3"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = FossologyClient::new("test-token", &mock_server.uri()).unwrap();
    let file = download_report(&client, 7, None, 0).await.unwrap();

    assert_eq!(file.name, "report-7");
    assert_eq!(file.content, b"SPDXVersion: SPDX-2.3");
}
