//! HTTP request handlers for the mock server.

pub mod folders;
pub mod groups;
pub mod info;
pub mod jobs;
pub mod licenses;
pub mod reports;
pub mod uploads;

pub use folders::*;
pub use groups::*;
pub use info::*;
pub use jobs::*;
pub use licenses::*;
pub use reports::*;
pub use uploads::*;

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;
use crate::TOTAL_PAGES_HEADER;

/// State shared by every handler.
pub type SharedState = Arc<RwLock<MockState>>;

/// Seconds suggested to clients polling a resource that is not ready.
const RETRY_AFTER_SECS: &str = "1";

/// Pagination fields sent as query parameters (`/api/v2`).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// The FOSSology `{code, message, type}` envelope.
pub(crate) fn message<M: Serialize>(status: StatusCode, message: M) -> Response {
    let kind = if status.is_success() { "INFO" } else { "ERROR" };
    (
        status,
        Json(serde_json::json!({
            "code": status.as_u16(),
            "message": message,
            "type": kind,
        })),
    )
        .into_response()
}

pub(crate) fn not_found(text: String) -> Response {
    message(StatusCode::NOT_FOUND, text)
}

/// 503 with `Retry-After`, the answer for resources still being prepared.
pub(crate) fn not_ready() -> Response {
    let mut response = message(
        StatusCode::SERVICE_UNAVAILABLE,
        "Resource is not ready yet, try again later",
    );
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    response
}

/// Reject the request unless it carries the required bearer token.
pub(crate) fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(required) = &state.required_token else {
        return Ok(());
    };
    let expected = format!("Bearer {required}");
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(message(StatusCode::FORBIDDEN, "Invalid or missing token"))
    }
}

/// Read a header as text.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Read a numeric header.
pub(crate) fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|v| v.trim().parse().ok())
}

/// Page and limit from headers (`/api/v1`) or query parameters (`/api/v2`).
pub(crate) fn page_window(headers: &HeaderMap, params: &PageParams) -> (u32, u32) {
    let page = params
        .page
        .or_else(|| header_u64(headers, "page").map(|p| p as u32))
        .unwrap_or(1)
        .max(1);
    let limit = params
        .limit
        .or_else(|| header_u64(headers, "limit").map(|l| l as u32))
        .unwrap_or(100)
        .max(1);
    (page, limit)
}

/// One page of `items` with the `X-Total-Pages` header.
pub(crate) fn paged<T: Serialize>(items: Vec<T>, page: u32, limit: u32) -> Response {
    let limit = limit as usize;
    let total_pages = items.len().div_ceil(limit);
    let start = (page as usize - 1) * limit;
    let items: Vec<T> = items.into_iter().skip(start).take(limit).collect();

    let mut response = (StatusCode::OK, Json(items)).into_response();
    if let Ok(value) = HeaderValue::from_str(&total_pages.to_string()) {
        response.headers_mut().insert(TOTAL_PAGES_HEADER, value);
    }
    response
}
