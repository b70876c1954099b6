//! Server info, token and user endpoint handlers.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{authorize, message, SharedState};

/// Body of `POST /tokens`.
#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub username: String,
    #[allow(dead_code)] // Any password is accepted for the known user
    pub password: String,
    pub token_name: String,
    pub token_scope: String,
    #[allow(dead_code)]
    pub token_expire: String,
}

/// GET /info
pub async fn get_info(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    Json(serde_json::json!({
        "name": "FOSSology API",
        "description": "Automate your fossology instance using REST API",
        "version": state.version,
        "security": ["bearerAuth"],
        "contact": "fossology@fossology.org",
        "license": {
            "name": "GPL-2.0-only",
            "url": "https://github.com/fossology/fossology/blob/master/LICENSE"
        }
    }))
}

/// GET /health
pub async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "scheduler": {"status": "OK"},
        "db": {"status": "OK"}
    }))
}

/// POST /tokens
pub async fn create_token(
    State(state): State<SharedState>,
    Json(params): Json<TokenParams>,
) -> Response {
    let state = state.read().await;

    if params.username != state.user.name {
        return message(
            StatusCode::NOT_FOUND,
            format!("User {} does not exist", params.username),
        );
    }

    let token = state
        .required_token
        .clone()
        .unwrap_or_else(|| format!("{}-{}", params.token_scope, params.token_name));
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "Authorization": format!("Bearer {token}") })),
    )
        .into_response()
}

/// GET /users/self
pub async fn get_self(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.read().await;
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    (StatusCode::OK, Json(state.user.clone())).into_response()
}
