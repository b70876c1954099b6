//! Folder endpoint handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{authorize, header_str, header_u64, message, not_found, SharedState};
use crate::Folder;

/// GET /folders
pub async fn list_folders(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let folders: Vec<Folder> = state.folders.values().cloned().collect();
    (StatusCode::OK, Json(folders)).into_response()
}

/// GET /folders/{id}
pub async fn get_folder(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    match state.folders.get(&id) {
        Some(folder) => (StatusCode::OK, Json(folder.clone())).into_response(),
        None => not_found(format!("Folder id {id} does not exist")),
    }
}

/// POST /folders
///
/// Answers 200 without creating anything when the name is taken below the parent.
pub async fn create_folder(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let (Some(parent), Some(name)) = (
        header_u64(&headers, "parentFolder"),
        header_str(&headers, "folderName"),
    ) else {
        return message(
            StatusCode::BAD_REQUEST,
            "parentFolder and folderName headers are required",
        );
    };
    if !state.folders.contains_key(&parent) {
        return not_found(format!("Parent folder {parent} does not exist"));
    }
    if let Some(existing) = state.find_folder(name, parent) {
        return message(StatusCode::OK, existing.id);
    }

    let id = state.next_id();
    let folder = Folder {
        id,
        name: name.to_string(),
        description: header_str(&headers, "folderDescription").map(str::to_string),
        parent: Some(parent),
        additional_info: HashMap::new(),
    };
    state.folders.insert(id, folder);
    message(StatusCode::CREATED, id)
}

/// DELETE /folders/{id}
pub async fn delete_folder(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if state.folders.get(&id).is_some_and(|f| f.parent.is_none()) {
        return message(StatusCode::FORBIDDEN, "The root folder can not be deleted");
    }
    match state.folders.remove(&id) {
        Some(_) => {
            state.uploads.retain(|_, u| u.folder_id != id);
            message(StatusCode::ACCEPTED, format!("Delete Job for folder {id}"))
        }
        None => not_found(format!("Folder id {id} does not exist")),
    }
}
