//! User model and endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::FossologyClient;
use crate::error::{FossologyError, Result};
use crate::traits::Get;

/// Name of the placeholder account every server ships with.
const DEFAULT_USER_NAME: &str = "Default User";

/// A FOSSology user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_level: Option<String>,
    /// Folder the user's uploads land in by default.
    #[serde(default)]
    pub root_folder_id: Option<u64>,
    #[serde(default)]
    pub email_notification: Option<bool>,
    #[serde(default)]
    pub default_group: Option<u64>,
    /// Agents selected by default when the user schedules jobs.
    #[serde(default)]
    pub agents: Option<Agents>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// Agent selection of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agents {
    #[serde(default)]
    pub bucket: bool,
    #[serde(default)]
    pub copyright_email_author: bool,
    #[serde(default)]
    pub ecc: bool,
    #[serde(default)]
    pub keyword: bool,
    #[serde(default, alias = "mimetype")]
    pub mime: bool,
    #[serde(default)]
    pub monk: bool,
    #[serde(default)]
    pub nomos: bool,
    #[serde(default)]
    pub ojo: bool,
    #[serde(default)]
    pub package: bool,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// Payload of `POST /users`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub description: String,
    pub email: String,
    pub access_level: String,
    pub root_folder_id: u64,
    pub email_notification: bool,
    pub default_group: u64,
    pub agents: Agents,
    pub default_bucketpool: u64,
    #[serde(rename = "user_pass")]
    pub password: String,
    pub default_visibility: String,
}

#[async_trait]
impl Get for User {
    type Id = u64;

    #[tracing::instrument(skip(client))]
    async fn get(client: &FossologyClient, id: u64) -> Result<Self> {
        let request = client.request(Method::GET, &format!("users/{id}"))?;
        let response = client
            .expect(request, StatusCode::OK, |_| {
                format!("Error while getting details for user {id}")
            })
            .await?;
        Ok(response.json().await?)
    }
}

/// Fetch the user the token belongs to.
///
/// # Errors
///
/// A 403 or 404 means the token is not accepted and yields
/// [`FossologyError::Authentication`].
#[tracing::instrument(skip(client))]
pub async fn get_self(client: &FossologyClient) -> Result<User> {
    let request = client.request(Method::GET, "users/self")?;
    let response = client.execute(request).await?;

    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(FossologyError::Authentication {
            url: client.host().to_string(),
        }),
        _ => Err(crate::client::error_for(response, |_| {
            format!("Error while getting details about myself from {}", client.host())
        })
        .await),
    }
}

/// List users, leaving out the placeholder account and users without e-mail.
#[tracing::instrument(skip(client))]
pub async fn list_users(client: &FossologyClient) -> Result<Vec<User>> {
    let request = client.request(Method::GET, "users")?;
    let response = client
        .expect(request, StatusCode::OK, |_| {
            format!("Unable to get a list of users from {}", client.host())
        })
        .await?;
    let users: Vec<User> = response.json().await?;
    Ok(users
        .into_iter()
        .filter(|u| u.name != DEFAULT_USER_NAME)
        .filter(|u| u.email.as_deref().is_some_and(|e| !e.is_empty()))
        .collect())
}

/// Create a user. An existing user with the same name is not an error.
#[tracing::instrument(skip(client, user), fields(name = %user.name))]
pub async fn create_user(client: &FossologyClient, user: &NewUser) -> Result<()> {
    let request = client.request(Method::POST, "users")?.json(user);
    let response = client.execute(request).await?;

    match response.status() {
        StatusCode::CREATED => {
            tracing::info!(name = %user.name, "User created");
            Ok(())
        }
        StatusCode::CONFLICT => {
            tracing::info!(name = %user.name, "User already exists");
            Ok(())
        }
        _ => Err(crate::client::error_for(response, |_| {
            format!("Error while creating user {}", user.name)
        })
        .await),
    }
}

/// Delete a user.
#[tracing::instrument(skip(client, user), fields(id = user.id))]
pub async fn delete_user(client: &FossologyClient, user: &User) -> Result<()> {
    let request = client.request(Method::DELETE, &format!("users/{}", user.id))?;
    client
        .expect(request, StatusCode::ACCEPTED, |_| {
            format!("Error while deleting user {} ({})", user.name, user.id)
        })
        .await?;
    Ok(())
}
