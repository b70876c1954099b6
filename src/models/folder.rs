//! Folder model and endpoints.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{error_for, with_group, FossologyClient};
use crate::error::{FossologyError, Result};
use crate::models::ApiMessage;
use crate::traits::Get;

/// A FOSSology folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Parent folder ID; `None` for the root folder.
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Whether a folder or upload is moved or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    Move,
    Copy,
}

impl MoveAction {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveAction::Move => "move",
            MoveAction::Copy => "copy",
        }
    }
}

#[async_trait]
impl Get for Folder {
    type Id = u64;

    #[tracing::instrument(skip(client))]
    async fn get(client: &FossologyClient, id: u64) -> Result<Self> {
        let request = client.request(Method::GET, &format!("folders/{id}"))?;
        let response = client
            .expect(request, StatusCode::OK, |_| {
                format!("Error while getting details for folder {id}")
            })
            .await?;
        Ok(response.json().await?)
    }
}

/// List every folder visible to the user, optionally on behalf of a group.
#[tracing::instrument(skip(client))]
pub async fn list_folders(client: &FossologyClient, group: Option<&str>) -> Result<Vec<Folder>> {
    let request = with_group(client.request(Method::GET, "folders")?, group);
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::FORBIDDEN => format!(
                "Listing folders is not authorized for group {}",
                group.unwrap_or_default()
            ),
            _ => "Unable to get a list of folders".to_string(),
        })
        .await?;
    let folders: Vec<Folder> = response.json().await?;
    tracing::debug!(count = folders.len(), "Folders are accessible");
    Ok(folders)
}

/// Create a folder below `parent`, or return the existing one with that name.
///
/// # Errors
///
/// [`FossologyError::Authorization`] if folder creation in `parent` is
/// denied.
#[tracing::instrument(skip(client, parent), fields(parent = parent.id))]
pub async fn create_folder(
    client: &FossologyClient,
    parent: &Folder,
    name: &str,
    description: Option<&str>,
    group: Option<&str>,
) -> Result<Folder> {
    let mut request = client
        .request(Method::POST, "folders")?
        .header("parentFolder", parent.id.to_string())
        .header("folderName", name);
    if let Some(description) = description {
        request = request.header("folderDescription", description);
    }
    let request = with_group(request, group);
    let response = client.execute(request).await?;

    match response.status() {
        StatusCode::CREATED => {
            let message: ApiMessage = response.json().await?;
            tracing::info!(name, "Folder has been created");
            Folder::get(client, message.id()?).await
        }
        StatusCode::OK => {
            tracing::info!(name, "Folder already exists");
            list_folders(client, group)
                .await?
                .into_iter()
                .find(|f| f.name == name && f.parent == Some(parent.id))
                .ok_or_else(|| FossologyError::NotFound {
                    description: format!("Folder {name} already exists"),
                    message: format!("it is not listed under {parent}"),
                })
        }
        _ => Err(error_for(response, |status| match status {
            StatusCode::FORBIDDEN => format!("Folder creation in parent {parent} not authorized"),
            _ => format!("Unable to create folder {name} under {parent}"),
        })
        .await),
    }
}

/// Rename a folder or change its description.
#[tracing::instrument(skip(client, folder), fields(id = folder.id))]
pub async fn update_folder(
    client: &FossologyClient,
    folder: &Folder,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Folder> {
    let mut request = client.request(Method::PATCH, &format!("folders/{}", folder.id))?;
    if let Some(name) = name {
        request = request.header("name", name);
    }
    if let Some(description) = description {
        request = request.header("description", description);
    }
    client
        .expect(request, StatusCode::OK, |_| {
            format!("Unable to update folder {folder}")
        })
        .await?;
    tracing::info!(%folder, "Folder has been updated");
    Folder::get(client, folder.id).await
}

/// Schedule a folder for deletion.
#[tracing::instrument(skip(client, folder), fields(id = folder.id))]
pub async fn delete_folder(client: &FossologyClient, folder: &Folder) -> Result<()> {
    let request = client.request(Method::DELETE, &format!("folders/{}", folder.id))?;
    client
        .expect(request, StatusCode::ACCEPTED, |_| {
            format!("Unable to delete folder {}", folder.id)
        })
        .await?;
    tracing::info!(%folder, "Folder has been scheduled for deletion");
    Ok(())
}

/// Move a folder below another parent.
pub async fn move_folder(
    client: &FossologyClient,
    folder: &Folder,
    parent: &Folder,
) -> Result<()> {
    put_folder(client, MoveAction::Move, folder, parent).await
}

/// Copy a folder below another parent.
pub async fn copy_folder(
    client: &FossologyClient,
    folder: &Folder,
    parent: &Folder,
) -> Result<()> {
    put_folder(client, MoveAction::Copy, folder, parent).await
}

#[tracing::instrument(skip(client, folder, parent), fields(id = folder.id, parent = parent.id))]
async fn put_folder(
    client: &FossologyClient,
    action: MoveAction,
    folder: &Folder,
    parent: &Folder,
) -> Result<()> {
    let request = client
        .request(Method::PUT, &format!("folders/{}", folder.id))?
        .header("parent", parent.id.to_string())
        .header("action", action.as_str());
    client
        .expect(request, StatusCode::ACCEPTED, |_| {
            format!("Unable to {} folder {} to {}", action.as_str(), folder.name, parent.name)
        })
        .await?;
    tracing::info!(
        folder = %folder.name,
        parent = %parent.name,
        action = action.as_str(),
        "Folder updated"
    );
    Ok(())
}
