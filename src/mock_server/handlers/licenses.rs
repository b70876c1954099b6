//! License endpoint handlers.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;

use super::{authorize, page_window, paged, PageParams, SharedState};
use crate::License;

/// Query parameters for listing licenses.
#[derive(Debug, Default, Deserialize)]
pub struct ListLicensesQuery {
    pub kind: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /license
pub async fn list_licenses(
    State(state): State<SharedState>,
    Query(query): Query<ListLicensesQuery>,
    headers: HeaderMap,
) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let licenses: Vec<License> = state
        .licenses
        .iter()
        .filter(|l| match query.kind.as_deref() {
            Some("candidate") => l.is_candidate,
            Some("main") => !l.is_candidate,
            _ => true,
        })
        .cloned()
        .collect();
    let window = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_window(&headers, &window);
    paged(licenses, page, limit)
}
