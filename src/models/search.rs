//! File search endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{with_group, FossologyClient};
use crate::error::Result;
use crate::models::{SearchType, Upload};
use crate::pagination::{total_pages, Page, PageRequest, PageResponse};
use crate::traits::List;

/// Search criteria, sent as request headers.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub search_type: SearchType,
    /// Limit the search to one upload.
    pub upload: Option<u64>,
    /// File name, `%` acts as wildcard.
    pub filename: Option<String>,
    pub tag: Option<String>,
    /// Minimum file size in bytes.
    pub filesize_min: Option<u64>,
    /// Maximum file size in bytes.
    pub filesize_max: Option<u64>,
    pub license: Option<String>,
    pub copyright: Option<String>,
    pub group: Option<String>,
}

/// A file matching a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub upload: Upload,
    pub upload_tree_id: u64,
    pub filename: String,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// Checksums identifying a file for [`filesearch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// What the server knows about a file identified by its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashFile {
    pub hash: FileHash,
    #[serde(default)]
    pub findings: Option<FileFindings>,
    /// Upload IDs containing the file.
    #[serde(default)]
    pub uploads: Vec<u64>,
    /// Set when the server does not know the file.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileFindings {
    #[serde(default)]
    pub scanner: Vec<String>,
    #[serde(default)]
    pub conclusion: Vec<String>,
    #[serde(default)]
    pub copyright: Vec<String>,
}

#[async_trait]
impl List for SearchResult {
    type Query = SearchQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &FossologyClient,
        query: &Self::Query,
        page: u32,
        page_size: u32,
    ) -> Result<PageResponse<Self>> {
        let mut request = client
            .request(Method::GET, "search")?
            .header("searchType", query.search_type.as_str());
        if let Some(upload) = query.upload {
            request = request.header("uploadId", upload.to_string());
        }
        if let Some(filename) = &query.filename {
            request = request.header("filename", filename.as_str());
        }
        if let Some(tag) = &query.tag {
            request = request.header("tag", tag.as_str());
        }
        if let Some(min) = query.filesize_min {
            request = request.header("filesizemin", min.to_string());
        }
        if let Some(max) = query.filesize_max {
            request = request.header("filesizemax", max.to_string());
        }
        if let Some(license) = &query.license {
            request = request.header("license", license.as_str());
        }
        if let Some(copyright) = &query.copyright {
            request = request.header("copyright", copyright.as_str());
        }
        let request = with_group(client.paged(request, page, page_size), query.group.as_deref());

        let response = client
            .expect(request, StatusCode::OK, |status| match status {
                StatusCode::FORBIDDEN => {
                    format!("Searching from page {page} is not authorized")
                }
                _ => format!(
                    "Unable to get a result with the given search criteria from page {page}"
                ),
            })
            .await?;

        let total_pages = total_pages(response.headers());
        let items = response.json().await?;
        Ok(PageResponse { items, total_pages })
    }
}

/// Search for files.
pub async fn search(
    client: &FossologyClient,
    query: &SearchQuery,
    request: &PageRequest,
) -> Result<Page<SearchResult>> {
    let page = SearchResult::list(client, query, request).await?;
    tracing::info!(results = page.len(), total_pages = page.total_pages, "Search done");
    Ok(page)
}

/// Look files up by checksum.
#[tracing::instrument(skip(client, hashes), fields(count = hashes.len()))]
pub async fn filesearch(
    client: &FossologyClient,
    hashes: &[FileHash],
    group: Option<&str>,
) -> Result<Vec<HashFile>> {
    let request = with_group(client.request(Method::POST, "filesearch")?.json(hashes), group);
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::FORBIDDEN => {
                "Not authorized to get a result with the given filesearch criteria".to_string()
            }
            _ => "Unable to get a result with the given filesearch criteria".to_string(),
        })
        .await?;
    Ok(response.json().await?)
}
