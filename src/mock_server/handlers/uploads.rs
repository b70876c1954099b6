//! Upload endpoint handlers.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{
    authorize, header_str, header_u64, message, not_found, not_ready, page_window, paged,
    PageParams, SharedState,
};
use crate::{Upload, UploadHash};

/// Query parameters for listing uploads.
#[derive(Debug, Default, Deserialize)]
pub struct ListUploadsQuery {
    #[serde(rename = "folderId")]
    pub folder_id: Option<u64>,
    pub name: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn upload_key(id: u64) -> String {
    format!("uploads/{id}")
}

/// GET /uploads
pub async fn list_uploads(
    State(state): State<SharedState>,
    Query(query): Query<ListUploadsQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let uploads: Vec<Upload> = state
        .list_uploads(query.folder_id)
        .into_iter()
        .filter(|u| {
            query
                .name
                .as_deref()
                .map(|name| u.upload_name.contains(name))
                .unwrap_or(true)
        })
        .collect();
    let window = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_window(&headers, &window);
    paged(uploads, page, limit)
}

/// GET /uploads/{id}
///
/// Answers 503 while the upload is still being unpacked.
pub async fn get_upload(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if !state.uploads.contains_key(&id) {
        return not_found(format!("Upload {id} does not exist"));
    }
    if state.take_not_ready(&upload_key(id)) {
        return not_ready();
    }
    match state.uploads.get(&id) {
        Some(upload) => (StatusCode::OK, Json(upload.clone())).into_response(),
        None => not_found(format!("Upload {id} does not exist")),
    }
}

/// POST /uploads
///
/// Only file uploads (`fileInput` multipart field) are supported.
pub async fn create_upload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let Some(folder_id) = header_u64(&headers, "folderId") else {
        return message(StatusCode::BAD_REQUEST, "folderId header is required");
    };
    let Some(folder_name) = state.folders.get(&folder_id).map(|f| f.name.clone()) else {
        return not_found(format!("Folder {folder_id} does not exist"));
    };

    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("fileInput") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        match field.bytes().await {
            Ok(content) => file = Some((name, content.len() as u64)),
            Err(e) => return message(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }
    let Some((upload_name, size)) = file else {
        return message(StatusCode::BAD_REQUEST, "fileInput is required");
    };

    let id = state.next_id();
    let upload = Upload {
        id,
        folder_id,
        folder_name: Some(folder_name),
        description: header_str(&headers, "uploadDescription").map(str::to_string),
        upload_name,
        upload_date: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S%.6f+00")
            .to_string(),
        assignee: None,
        assignee_date: None,
        closing_date: None,
        hash: Some(UploadHash {
            sha1: None,
            md5: None,
            sha256: None,
            size: Some(size),
        }),
        additional_info: HashMap::new(),
    };
    state.uploads.insert(id, upload);
    let delay = state.upload_delay;
    state.not_ready.insert(upload_key(id), delay);
    message(StatusCode::CREATED, id)
}

/// DELETE /uploads/{id}
pub async fn delete_upload(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state.uploads.remove(&id) {
        Some(_) => {
            state.jobs.retain(|_, j| j.upload_id != Some(id));
            message(StatusCode::ACCEPTED, format!("Delete Job for file with id {id}"))
        }
        None => not_found(format!("Upload {id} does not exist")),
    }
}

/// GET /uploads/{id}/summary
pub async fn get_upload_summary(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let Some(upload) = state.uploads.get(&id) else {
        return not_found(format!("Upload {id} does not exist"));
    };
    let main_license = state.licenses.first().map(|l| l.short_name.clone());
    Json(serde_json::json!({
        "id": upload.id,
        "uploadName": upload.upload_name,
        "mainLicense": main_license,
        "uniqueLicenses": state.licenses.len(),
        "totalLicenses": state.licenses.len(),
        "uniqueConcludedLicenses": 0,
        "totalConcludedLicenses": 0,
        "filesToBeCleared": 1,
        "filesCleared": 0,
        "clearingStatus": "Open",
        "copyrightCount": 0
    }))
    .into_response()
}
