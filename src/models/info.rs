//! Server information, health and token issuance.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{error_for, parse_server_url, FossologyClient};
use crate::error::{FossologyError, Result};
use crate::models::TokenScope;
use crate::version::ServerVersion;

/// Days until a newly issued token expires by default.
pub const DEFAULT_TOKEN_LIFETIME_DAYS: u64 = 30;

/// API description returned by `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// REST API version, used for endpoint gating.
    pub version: ServerVersion,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub license: Option<ApiLicense>,
    /// Build information of the FOSSology server itself.
    #[serde(default)]
    pub fossology: Option<FossologyBuild>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLicense {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FossologyBuild {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub commit_date: Option<String>,
    #[serde(default)]
    pub build_date: Option<String>,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    #[serde(default)]
    pub scheduler: Option<ComponentStatus>,
    #[serde(default)]
    pub db: Option<ComponentStatus>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub status: String,
}

impl HealthInfo {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Generic `{code, message, type}` body returned by write endpoints.
///
/// For creations the message carries the new resource ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: serde_json::Value,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ApiMessage {
    /// The numeric ID carried by the message.
    ///
    /// Accepts a JSON number, a numeric string, or a text ending in digits
    /// such as a report download URL.
    pub fn id(&self) -> Result<u64> {
        let parsed = match &self.message {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => trailing_digits(s).and_then(|d| d.parse().ok()),
            _ => None,
        };
        parsed.ok_or_else(|| {
            FossologyError::InvalidArgument(format!(
                "response message '{}' does not carry an ID",
                self.message
            ))
        })
    }

    /// The message as text.
    pub fn text(&self) -> String {
        match &self.message {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn trailing_digits(s: &str) -> Option<&str> {
    let s = s.trim();
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&s[start..])
}

/// Fetch the API description.
#[tracing::instrument(skip(client))]
pub async fn get_info(client: &FossologyClient) -> Result<ApiInfo> {
    let request = client.request(Method::GET, "info")?;
    let response = client
        .expect(request, StatusCode::OK, |_| {
            format!("Error while getting API info from {}", client.host())
        })
        .await?;
    Ok(response.json().await?)
}

/// Fetch the server health status.
#[tracing::instrument(skip(client))]
pub async fn get_health(client: &FossologyClient) -> Result<HealthInfo> {
    let request = client.request(Method::GET, "health")?;
    let response = client
        .expect(request, StatusCode::OK, |_| {
            format!("Error while getting health info from {}", client.host())
        })
        .await?;
    Ok(response.json().await?)
}

/// Request body of `POST /tokens`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
    pub token_name: String,
    pub token_scope: TokenScope,
    /// Expiry date, `YYYY-MM-DD`.
    pub token_expire: String,
}

impl TokenRequest {
    /// Build a request expiring on `expire`, or 30 days from today.
    pub fn new(
        username: &str,
        password: &str,
        token_name: &str,
        token_scope: TokenScope,
        expire: Option<NaiveDate>,
    ) -> Self {
        let expire = expire.unwrap_or_else(default_token_expiry);
        Self {
            username: username.to_string(),
            password: password.to_string(),
            token_name: token_name.to_string(),
            token_scope,
            token_expire: expire.format("%Y-%m-%d").to_string(),
        }
    }
}

fn default_token_expiry() -> NaiveDate {
    let today = Utc::now().date_naive();
    today
        .checked_add_days(Days::new(DEFAULT_TOKEN_LIFETIME_DAYS))
        .unwrap_or(today)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "Authorization")]
    authorization: String,
}

/// Exchange username and password for a bearer token.
///
/// Runs without an existing client since no token exists yet.
///
/// # Errors
///
/// [`FossologyError::Authentication`] when the server does not know the
/// user, [`FossologyError::ApiError`] for any other failure.
#[tracing::instrument(skip(request), fields(username = %request.username))]
pub async fn fossology_token(server_url: &str, request: &TokenRequest) -> Result<String> {
    let url = parse_server_url(server_url)?.join("api/v1/tokens")?;

    let response = reqwest::Client::new()
        .post(url)
        .json(request)
        .send()
        .await?;

    match response.status() {
        StatusCode::CREATED => {
            let body: TokenResponse = response.json().await?;
            let token = body
                .authorization
                .strip_prefix("Bearer ")
                .unwrap_or(&body.authorization)
                .to_string();
            tracing::debug!(token_name = %request.token_name, "Token generated");
            Ok(token)
        }
        StatusCode::NOT_FOUND => Err(FossologyError::Authentication {
            url: server_url.to_string(),
        }),
        _ => Err(error_for(response, |_| {
            "Error while generating new token".to_string()
        })
        .await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_from_number_and_text() {
        let msg: ApiMessage =
            serde_json::from_value(serde_json::json!({"code": 201, "message": 42, "type": "INFO"}))
                .unwrap();
        assert_eq!(msg.id().unwrap(), 42);

        let msg: ApiMessage = serde_json::from_value(serde_json::json!({
            "code": 201,
            "message": "http://fossology/repo/api/v1/report/17",
            "type": "INFO"
        }))
        .unwrap();
        assert_eq!(msg.id().unwrap(), 17);

        let msg: ApiMessage =
            serde_json::from_value(serde_json::json!({"message": "no id here"})).unwrap();
        assert!(msg.id().is_err());
    }

    #[test]
    fn test_token_request_default_expiry() {
        let request = TokenRequest::new("fossy", "fossy", "ci", TokenScope::Write, None);
        let expected = Utc::now().date_naive() + chrono::Duration::days(30);
        assert_eq!(request.token_expire, expected.format("%Y-%m-%d").to_string());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["token_scope"], "write");
    }

    #[test]
    fn test_info_keeps_unknown_fields() {
        let info: ApiInfo = serde_json::from_value(serde_json::json!({
            "name": "FOSSology API",
            "version": "1.4.3",
            "security": [],
            "fossology": {"version": "4.2.0", "branchName": "master"}
        }))
        .unwrap();
        assert_eq!(info.version, "1.4.3".parse().unwrap());
        assert!(info.additional_info.contains_key("security"));
        assert_eq!(
            info.fossology.unwrap().branch_name.as_deref(),
            Some("master")
        );
    }
}
