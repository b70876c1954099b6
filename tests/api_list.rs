//! Execution tests for paginated list endpoints
//!
//! Uses wiremock to mock the FOSSology API and test the actual request flow.

use fossology::{
    ApiVersion, FossologyClient, FossologyError, Job, JobQuery, License, List, PageRequest,
    ServerVersion, Upload, UploadQuery,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn upload_json(id: u64) -> serde_json::Value {
    serde_json::json!({
        "folderid": 1,
        "foldername": "Software Repository",
        "id": id,
        "description": "",
        "uploadname": format!("upload-{id}.zip"),
        "uploaddate": "2023-01-31 10:02:11.123456+00",
        "hash": {"sha1": null, "md5": null, "sha256": null, "size": 100}
    })
}

fn uploads_page(ids: &[u64], total_pages: u32) -> ResponseTemplate {
    let body: Vec<_> = ids.iter().copied().map(upload_json).collect();
    ResponseTemplate::new(200)
        .set_body_json(body)
        .insert_header("X-Total-Pages", total_pages.to_string())
}

fn client_for(server: &MockServer) -> FossologyClient {
    FossologyClient::new("test-token", &server.uri()).unwrap()
}

#[tokio::test]
async fn test_all_pages_are_concatenated_in_order() {
    let mock_server = MockServer::start().await;

    for (page, ids) in [("1", [1, 2]), ("2", [3, 4]), ("3", [5, 6])] {
        Mock::given(method("GET"))
            .and(path("/api/v1/uploads"))
            .and(header("page", page))
            .and(header("limit", "2"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(uploads_page(&ids, 3))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server);
    let page = Upload::list(&client, &UploadQuery::default(), &PageRequest::all(2))
        .await
        .unwrap();

    let ids: Vec<u64> = page.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn test_single_page_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads"))
        .and(header("page", "2"))
        .and(header("limit", "50"))
        .respond_with(uploads_page(&[51], 2))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page = Upload::list(&client, &UploadQuery::default(), &PageRequest::page(2, 50))
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.page, 2);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_missing_total_pages_stops_after_first_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page = Upload::list(&client, &UploadQuery::default(), &PageRequest::all(10))
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn test_forbidden_page_aborts_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads"))
        .and(header("page", "1"))
        .and(header("groupName", "qa"))
        .respond_with(uploads_page(&[1, 2], 3))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads"))
        .and(header("page", "2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": 403,
            "message": "Access denied",
            "type": "ERROR"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = UploadQuery {
        group: Some("qa".to_string()),
        ..Default::default()
    };
    let result = Upload::list(&client, &query, &PageRequest::all(2)).await;

    match result {
        Err(FossologyError::Authorization {
            description,
            status_code,
            ..
        }) => {
            assert_eq!(status_code, 403);
            assert_eq!(
                description,
                "Retrieving list of uploads from page 2 is not authorized for group qa"
            );
        }
        other => panic!("Expected Authorization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_v2_sends_pagination_as_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/uploads"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "2"))
        .and(query_param("folderId", "4"))
        .respond_with(uploads_page(&[7], 1))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_api_version(ApiVersion::V2);
    let query = UploadQuery {
        folder: Some(4),
        ..Default::default()
    };
    let page = Upload::list(&client, &query, &PageRequest::all(2)).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].id, 7);
}

#[tokio::test]
async fn test_old_server_rejects_upload_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/uploads"))
        .respond_with(uploads_page(&[1], 1))
        .expect(1)
        .mount(&mock_server)
        .await;

    let version: ServerVersion = "1.0.15".parse().unwrap();
    let client = client_for(&mock_server).with_server_version(version);

    let err = Upload::list(&client, &UploadQuery::default(), &PageRequest::all(10))
        .await
        .unwrap_err();
    assert!(matches!(err, FossologyError::Unsupported(_)));

    // The default window still works without pagination
    let page = Upload::list(&client, &UploadQuery::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_old_server_rejects_licenses_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let version: ServerVersion = "1.1.2".parse().unwrap();
    let client = client_for(&mock_server).with_server_version(version);

    let result = License::list(&client, &Default::default(), &PageRequest::default()).await;
    assert!(matches!(result, Err(FossologyError::Unsupported(_))));
}

#[tokio::test]
async fn test_list_jobs_of_upload() {
    let mock_server = MockServer::start().await;

    let jobs = serde_json::json!([
        {
            "id": 12,
            "name": "upload-2.zip",
            "queueDate": "2023-01-31 10:05:00.0+00",
            "uploadId": "2",
            "userId": "3",
            "groupId": "3",
            "eta": 0,
            "status": "Completed"
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/api/v1/jobs"))
        .and(query_param("upload", "2"))
        .and(header("page", "1"))
        .and(header("limit", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&jobs)
                .insert_header("X-Total-Pages", "1"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = JobQuery {
        upload: Some(2),
        ..Default::default()
    };
    let page = Job::list(&client, &query, &PageRequest::default()).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].upload_id, Some(2));
}
