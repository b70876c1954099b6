//! Job endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{
    authorize, header_u64, message, not_found, page_window, paged, PageParams, SharedState,
};
use crate::{Job, JobSpec};

/// Query parameters for listing jobs.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub upload: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /jobs and GET /jobs/all
pub async fn list_jobs(
    State(state): State<SharedState>,
    Query(query): Query<ListJobsQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let window = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_window(&headers, &window);
    paged(state.list_jobs(query.upload), page, limit)
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state.jobs.get(&id) {
        Some(job) => (StatusCode::OK, Json(job.clone())).into_response(),
        None => not_found(format!("Job id {id} doesn't exist")),
    }
}

/// POST /jobs
///
/// New jobs take the configured scheduled status.
pub async fn create_job(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(_spec): Json<JobSpec>,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let (Some(folder_id), Some(upload_id)) = (
        header_u64(&headers, "folderId"),
        header_u64(&headers, "uploadId"),
    ) else {
        return message(
            StatusCode::BAD_REQUEST,
            "folderId and uploadId headers are required",
        );
    };
    if !state.folders.contains_key(&folder_id) {
        return not_found(format!("Folder {folder_id} does not exist"));
    }
    let Some(upload_name) = state.uploads.get(&upload_id).map(|u| u.upload_name.clone()) else {
        return not_found(format!("Upload {upload_id} does not exist"));
    };

    let id = state.next_id();
    let status = state.scheduled_job_status;
    let user_id = state.user.id;
    let job = Job {
        id,
        name: upload_name,
        queue_date: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S%.6f+00")
            .to_string(),
        upload_id: Some(upload_id),
        user_id: Some(user_id),
        group_id: state.user.default_group,
        eta: Some(0),
        status,
        additional_info: Default::default(),
    };
    state.jobs.insert(id, job);
    message(StatusCode::CREATED, id)
}
