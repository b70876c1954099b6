//! Read-only endpoints for single items of an upload tree.

use std::collections::HashMap;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::FossologyClient;
use crate::error::Result;
use crate::models::{CopyrightStatus, Upload};

/// Metadata of one file in an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    #[serde(default)]
    pub view_info: Option<serde_json::Value>,
    #[serde(default)]
    pub meta_info: Option<serde_json::Value>,
    #[serde(default)]
    pub package_info: Option<serde_json::Value>,
    #[serde(default)]
    pub tag_info: Option<serde_json::Value>,
    #[serde(default)]
    pub reuse_info: Option<serde_json::Value>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

fn not_found(upload: &Upload, item_id: u64) -> String {
    format!("Upload {} or item {item_id} not found", upload.id)
}

/// Fetch the metadata of an upload item.
#[tracing::instrument(skip(client, upload), fields(upload = upload.id))]
pub async fn item_info(
    client: &FossologyClient,
    upload: &Upload,
    item_id: u64,
) -> Result<FileInfo> {
    let path = format!("uploads/{}/item/{item_id}/info", upload.id);
    let request = client.request(Method::GET, &path)?;
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::NOT_FOUND => not_found(upload, item_id),
            _ => format!(
                "API error while getting info for item {item_id} from upload {}",
                upload.upload_name
            ),
        })
        .await?;
    Ok(response.json().await?)
}

/// Count the copyrights below an upload item.
#[tracing::instrument(skip(client, upload), fields(upload = upload.id))]
pub async fn item_copyrights(
    client: &FossologyClient,
    upload: &Upload,
    item_id: u64,
    status: CopyrightStatus,
) -> Result<u64> {
    #[derive(Deserialize)]
    struct TotalCopyrights {
        total_copyrights: u64,
    }

    let path = format!("uploads/{}/item/{item_id}/totalcopyrights", upload.id);
    let request = client
        .request(Method::GET, &path)?
        .query(&[("status", status.as_str())]);
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::NOT_FOUND => not_found(upload, item_id),
            _ => format!(
                "API error while getting total copyrights for item {item_id} from upload {}",
                upload.upload_name
            ),
        })
        .await?;
    let total: TotalCopyrights = response.json().await?;
    Ok(total.total_copyrights)
}
