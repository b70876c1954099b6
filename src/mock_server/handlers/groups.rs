//! Group endpoint handlers.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{authorize, header_str, message, SharedState};
use crate::Group;

/// GET /groups
pub async fn list_groups(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let groups: Vec<Group> = state.groups.values().cloned().collect();
    (StatusCode::OK, Json(groups)).into_response()
}

/// POST /groups
pub async fn create_group(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.write().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let Some(name) = header_str(&headers, "name").filter(|n| !n.is_empty()) else {
        return message(StatusCode::BAD_REQUEST, "No group name provided");
    };
    if state.groups.values().any(|g| g.name == name) {
        return message(
            StatusCode::BAD_REQUEST,
            format!("Group {name} already exists"),
        );
    }

    let id = state.next_id();
    let group = Group {
        id,
        name: name.to_string(),
        additional_info: HashMap::new(),
    };
    state.groups.insert(id, group);
    message(StatusCode::OK, format!("Group {name} added"))
}
