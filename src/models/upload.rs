//! Upload model and endpoints.
//!
//! Details, summaries, license and copyright findings are computed by
//! server-side agents after an upload is unpacked, so those endpoints are
//! polled with [`poll`] until the server stops answering 503.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::client::{attachment_name, error_for, json, with_group, FossologyClient};
use crate::error::Result;
use crate::models::{
    AccessLevel, ApiMessage, ClearingStatus, CopyrightStatus, DownloadedFile, Folder, MoveAction,
    Permission,
};
use crate::pagination::{paginate, total_pages, Page, PageRequest, PageResponse};
use crate::poll::{poll, RetryPolicy, LONG_POLL_ATTEMPTS, SHORT_POLL_ATTEMPTS};
use crate::traits::{Get, List};
use crate::version::UPLOAD_PAGINATION_SINCE;

/// A unit of scanned content tracked by the server.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: u64,
    #[serde(rename = "folderid")]
    pub folder_id: u64,
    #[serde(rename = "foldername", default)]
    pub folder_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "uploadname")]
    pub upload_name: String,
    /// Upload timestamp as sent by the server, e.g. `2023-01-31 10:02:11.1234+00`.
    #[serde(rename = "uploaddate")]
    pub upload_date: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub assignee: Option<u64>,
    #[serde(rename = "assigneeDate", default)]
    pub assignee_date: Option<String>,
    #[serde(rename = "closingDate", default)]
    pub closing_date: Option<String>,
    #[serde(default)]
    pub hash: Option<UploadHash>,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

impl Upload {
    /// Parsed upload timestamp.
    pub fn uploaded_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.upload_date)
    }

    /// File size in bytes, if the server reported it.
    pub fn size(&self) -> Option<u64> {
        self.hash.as_ref().and_then(|h| h.size)
    }
}

impl fmt::Display for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.upload_name, self.id)
    }
}

/// Parse a server timestamp such as `2023-01-31 10:02:11.1234+00`.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// Checksums and size of an uploaded file.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHash {
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub size: Option<u64>,
}

/// Filters for listing uploads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadQuery {
    /// Only uploads in this folder.
    #[serde(rename = "folderId", skip_serializing_if = "Option::is_none")]
    pub folder: Option<u64>,
    /// Include sub-folders of `folder`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    /// Upload name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClearingStatus>,
    /// User ID of the assignee, or `-me-` / `-unassigned-`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Only uploads since this date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Act on behalf of this group (sent as header).
    #[serde(skip)]
    pub group: Option<String>,
}

/// Where the content of a new upload comes from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// A local file sent as multipart form data.
    File(PathBuf),
    /// A version control repository fetched by the server.
    Vcs(VcsSpec),
    /// A URL downloaded by the server.
    Url(UrlSpec),
    /// A path on the server's file system.
    Server(ServerSpec),
}

impl UploadSource {
    fn kind(&self) -> &'static str {
        match self {
            UploadSource::File(_) => "file",
            UploadSource::Vcs(_) => "vcs",
            UploadSource::Url(_) => "url",
            UploadSource::Server(_) => "server",
        }
    }
}

impl fmt::Display for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadSource::File(path) => write!(f, "{}", path.display()),
            UploadSource::Vcs(vcs) => f.write_str(&vcs.vcs_url),
            UploadSource::Url(url) => f.write_str(&url.url),
            UploadSource::Server(server) => f.write_str(&server.path),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcsSpec {
    /// `git` or `svn`.
    pub vcs_type: String,
    pub vcs_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_recursion_depth: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSpec {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Options for [`upload_file`].
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub description: Option<String>,
    pub access_level: Option<AccessLevel>,
    /// Skip SCM metadata such as `.git` directories.
    pub ignore_scm: bool,
    pub group: Option<String>,
    /// Fixed delay between detail polls, 0 to follow `Retry-After`.
    pub wait_time: u64,
}

/// License and clearing overview of an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: u64,
    pub upload_name: String,
    #[serde(default)]
    pub main_license: Option<String>,
    #[serde(default)]
    pub unique_licenses: u64,
    #[serde(default)]
    pub total_licenses: u64,
    #[serde(default)]
    pub unique_concluded_licenses: u64,
    #[serde(default)]
    pub total_concluded_licenses: u64,
    #[serde(default)]
    pub files_to_be_cleared: u64,
    #[serde(default)]
    pub files_cleared: u64,
    #[serde(default)]
    pub clearing_status: Option<ClearingStatus>,
    #[serde(default)]
    pub copyright_count: u64,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

/// License findings for one file of an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLicenses {
    pub file_path: String,
    #[serde(default)]
    pub findings: Findings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scanner: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conclusion: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A copyright statement and the files it was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCopyrights {
    pub copyright: String,
    #[serde(default)]
    pub file_path: Vec<String>,
}

/// Options for [`upload_licenses`].
#[derive(Debug, Clone)]
pub struct LicenseFindingsQuery {
    /// Agents whose findings are returned.
    pub agents: Vec<String>,
    /// Include findings inside containers.
    pub containers: bool,
    pub group: Option<String>,
}

impl Default for LicenseFindingsQuery {
    fn default() -> Self {
        Self {
            agents: vec!["nomos".to_string()],
            containers: false,
            group: None,
        }
    }
}

/// Groups with access to an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPermGroups {
    #[serde(default)]
    pub public_perm: Option<Permission>,
    #[serde(default)]
    pub perm_groups: Vec<PermGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermGroup {
    pub perm: Permission,
    pub group_pk: u64,
    pub group_name: String,
}

/// Body of `PUT /uploads/{id}/permissions`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionChange {
    /// Apply to every upload in this folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_uploads_perm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_perm: Option<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_perm: Option<Permission>,
}

#[async_trait]
impl Get for Upload {
    type Id = u64;

    async fn get(client: &FossologyClient, id: u64) -> Result<Self> {
        detail_upload(client, id, None, 0).await
    }
}

#[async_trait]
impl List for Upload {
    type Query = UploadQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &FossologyClient,
        query: &Self::Query,
        page: u32,
        page_size: u32,
    ) -> Result<PageResponse<Self>> {
        let mut request = client.request(Method::GET, "uploads")?.query(query);
        if client.supports(UPLOAD_PAGINATION_SINCE) {
            request = client.paged(request, page, page_size);
        }
        let request = with_group(request, query.group.as_deref());

        let response = client
            .expect(request, StatusCode::OK, |status| match status {
                StatusCode::FORBIDDEN => format!(
                    "Retrieving list of uploads from page {page} is not authorized for group {}",
                    query.group.as_deref().unwrap_or_default()
                ),
                _ => format!("Unable to retrieve the list of uploads from page {page}"),
            })
            .await?;

        let total_pages = total_pages(response.headers());
        let items = response.json().await?;
        Ok(PageResponse { items, total_pages })
    }

    async fn list(
        client: &FossologyClient,
        query: &Self::Query,
        request: &PageRequest,
    ) -> Result<Page<Self>> {
        if !request.is_default_window() {
            client.require_version(UPLOAD_PAGINATION_SINCE, "/uploads with pagination")?;
        }
        let page_size = request.page_size;
        let page = paginate(request, |page| {
            Self::list_page(client, query, page, page_size)
        })
        .await?;
        tracing::info!(
            uploads = page.len(),
            total_pages = page.total_pages,
            "Retrieved uploads"
        );
        Ok(page)
    }
}

/// Fetch upload details, polling while the server is still unpacking.
///
/// Up to 10 attempts; `wait_time` of 0 follows the server's `Retry-After`.
#[tracing::instrument(skip(client))]
pub async fn detail_upload(
    client: &FossologyClient,
    id: u64,
    group: Option<&str>,
    wait_time: u64,
) -> Result<Upload> {
    let policy = RetryPolicy::new(LONG_POLL_ATTEMPTS).with_wait_time(wait_time);
    let description = format!("Details for upload {id}");

    let upload: Upload = poll(&policy, &description, |_| async move {
        let request = client
            .request(Method::GET, &format!("uploads/{id}"))
            .map(|r| with_group(r, group));
        client
            .attempt(
                request,
                StatusCode::OK,
                |status| match status {
                    StatusCode::FORBIDDEN => format!(
                        "Getting details for upload {id} is not authorized for group {}",
                        group.unwrap_or_default()
                    ),
                    _ => format!("Error while getting details for upload {id}"),
                },
                json::<Upload>,
            )
            .await
    })
    .await?;

    tracing::debug!(%upload, "Got upload details");
    Ok(upload)
}

/// Create an upload in `folder` and return its details once available.
///
/// # Errors
///
/// [`FossologyError::Authorization`] if uploading into `folder` is denied,
/// [`FossologyError::Io`] if a local file cannot be read.
#[tracing::instrument(skip(client, folder, options), fields(folder = folder.id, source = %source))]
pub async fn upload_file(
    client: &FossologyClient,
    folder: &Folder,
    source: &UploadSource,
    options: &UploadOptions,
) -> Result<Upload> {
    let mut request = client
        .request(Method::POST, "uploads")?
        .header("folderId", folder.id.to_string())
        .header("uploadType", source.kind())
        .header("ignoreScm", options.ignore_scm.to_string());
    if let Some(description) = &options.description {
        request = request.header("uploadDescription", description.as_str());
    }
    if let Some(level) = options.access_level {
        request = request.header("public", level.as_str());
    }
    let request = with_group(request, options.group.as_deref());

    let request = match source {
        UploadSource::File(path) => {
            let content = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let form = Form::new().part("fileInput", Part::bytes(content).file_name(file_name));
            request.multipart(form)
        }
        UploadSource::Vcs(spec) => request.json(spec),
        UploadSource::Url(spec) => request.json(spec),
        UploadSource::Server(spec) => request.json(spec),
    };

    let response = client.execute(request).await?;
    if response.status() != StatusCode::CREATED {
        return Err(error_for(response, |status| match status {
            StatusCode::FORBIDDEN => format!("Upload of {source} into {folder} not authorized"),
            _ => format!("Upload of {source} failed"),
        })
        .await);
    }

    let message: ApiMessage = response.json().await?;
    let upload = detail_upload(
        client,
        message.id()?,
        options.group.as_deref(),
        options.wait_time,
    )
    .await?;
    tracing::info!(%upload, date = %upload.upload_date, "Upload created");
    Ok(upload)
}

/// Schedule an upload for deletion.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn delete_upload(
    client: &FossologyClient,
    upload: &Upload,
    group: Option<&str>,
) -> Result<()> {
    let request = with_group(
        client.request(Method::DELETE, &format!("uploads/{}", upload.id))?,
        group,
    );
    client
        .expect(request, StatusCode::ACCEPTED, |status| match status {
            StatusCode::FORBIDDEN => format!("Deleting upload {} not authorized", upload.id),
            _ => format!("Unable to delete upload {}", upload.id),
        })
        .await?;
    tracing::info!(%upload, "Upload has been scheduled for deletion");
    Ok(())
}

/// Move or copy an upload into another folder.
#[tracing::instrument(skip(client, upload, folder), fields(id = upload.id, folder = folder.id))]
pub async fn move_upload(
    client: &FossologyClient,
    upload: &Upload,
    folder: &Folder,
    action: MoveAction,
) -> Result<()> {
    let request = client
        .request(Method::PUT, &format!("uploads/{}", upload.id))?
        .header("folderId", folder.id.to_string())
        .header("action", action.as_str());
    client
        .expect(request, StatusCode::ACCEPTED, |_| {
            format!(
                "Unable to {} upload {} to {}",
                action.as_str(),
                upload.upload_name,
                folder.name
            )
        })
        .await?;
    tracing::info!(%upload, %folder, action = action.as_str(), "Upload updated");
    Ok(())
}

/// Change clearing status, assignee or comment of an upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn update_upload(
    client: &FossologyClient,
    upload: &Upload,
    status: Option<ClearingStatus>,
    assignee: Option<u64>,
    comment: Option<&str>,
    group: Option<&str>,
) -> Result<()> {
    #[derive(Serialize)]
    struct UpdateParams<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<ClearingStatus>,
        #[serde(skip_serializing_if = "Option::is_none")]
        assignee: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        comment: Option<&'a str>,
    }

    let params = UpdateParams {
        status,
        assignee,
        comment,
    };
    let request = with_group(
        client
            .request(Method::PATCH, &format!("uploads/{}", upload.id))?
            .query(&params),
        group,
    );
    client
        .expect(request, StatusCode::ACCEPTED, |status| match status {
            StatusCode::FORBIDDEN => format!("Updating upload {} not authorized", upload.id),
            _ => format!("Unable to update upload {}", upload.id),
        })
        .await?;
    tracing::info!(%upload, "Upload has been updated");
    Ok(())
}

/// Fetch the license and clearing summary of an upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn upload_summary(
    client: &FossologyClient,
    upload: &Upload,
    group: Option<&str>,
) -> Result<Summary> {
    let id = upload.id;
    let policy = RetryPolicy::new(SHORT_POLL_ATTEMPTS);
    let description = format!("Summary of upload {id}");

    poll(&policy, &description, |_| async move {
        let request = client
            .request(Method::GET, &format!("uploads/{id}/summary"))
            .map(|r| with_group(r, group));
        client
            .attempt(
                request,
                StatusCode::OK,
                |status| match status {
                    StatusCode::FORBIDDEN => {
                        format!("Getting summary of upload {id} is not authorized")
                    }
                    _ => format!("No summary for upload {id}"),
                },
                json::<Summary>,
            )
            .await
    })
    .await
}

/// Fetch license findings per file.
///
/// A 412 answer means one of the requested agents was never scheduled on
/// the upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn upload_licenses(
    client: &FossologyClient,
    upload: &Upload,
    query: &LicenseFindingsQuery,
) -> Result<Vec<UploadLicenses>> {
    let id = upload.id;
    let agents = query.agents.join(",");
    let policy = RetryPolicy::new(SHORT_POLL_ATTEMPTS);
    let description = format!("Licenses of upload {id}");

    poll(&policy, &description, |_| {
        let agents = agents.clone();
        async move {
            let request = client
                .request(Method::GET, &format!("uploads/{id}/licenses"))
                .map(|r| {
                    with_group(
                        r.query(&[
                            ("agent", agents.as_str()),
                            ("containers", if query.containers { "true" } else { "false" }),
                        ]),
                        query.group.as_deref(),
                    )
                });
            client
                .attempt(
                    request,
                    StatusCode::OK,
                    |status| match status {
                        StatusCode::PRECONDITION_FAILED => format!(
                            "Unable to get licenses from {agents} for upload {id}, agent not scheduled"
                        ),
                        StatusCode::FORBIDDEN => {
                            format!("Getting licenses of upload {id} is not authorized")
                        }
                        _ => format!("No licenses for upload {id}"),
                    },
                    json::<Vec<UploadLicenses>>,
                )
                .await
        }
    })
    .await
}

/// Fetch copyright statements found in an upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn upload_copyrights(
    client: &FossologyClient,
    upload: &Upload,
    status: CopyrightStatus,
    group: Option<&str>,
) -> Result<Vec<UploadCopyrights>> {
    let id = upload.id;
    let policy = RetryPolicy::new(SHORT_POLL_ATTEMPTS);
    let description = format!("Copyrights of upload {id}");

    poll(&policy, &description, |_| async move {
        let request = client
            .request(Method::GET, &format!("uploads/{id}/copyrights"))
            .map(|r| with_group(r.query(&[("status", status.as_str())]), group));
        client
            .attempt(
                request,
                StatusCode::OK,
                |status| match status {
                    StatusCode::FORBIDDEN => {
                        format!("Getting copyrights of upload {id} is not authorized")
                    }
                    _ => format!("No copyrights for upload {id}"),
                },
                json::<Vec<UploadCopyrights>>,
            )
            .await
    })
    .await
}

/// List the groups with access to an upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn upload_permissions(
    client: &FossologyClient,
    upload: &Upload,
    group: Option<&str>,
) -> Result<UploadPermGroups> {
    let request = with_group(
        client.request(Method::GET, &format!("uploads/{}/perm-groups", upload.id))?,
        group,
    );
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::FORBIDDEN => {
                format!("Getting permissions of upload {} is not authorized", upload.id)
            }
            _ => format!("Unable to get permissions of upload {}", upload.id),
        })
        .await?;
    Ok(response.json().await?)
}

/// Change the permissions of an upload.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn change_upload_permissions(
    client: &FossologyClient,
    upload: &Upload,
    change: &PermissionChange,
    group: Option<&str>,
) -> Result<()> {
    let request = with_group(
        client
            .request(Method::PUT, &format!("uploads/{}/permissions", upload.id))?
            .json(change),
        group,
    );
    client
        .expect(request, StatusCode::ACCEPTED, |status| match status {
            StatusCode::FORBIDDEN => {
                format!("Changing permissions of upload {} is not authorized", upload.id)
            }
            _ => format!("Unable to change permissions of upload {}", upload.id),
        })
        .await?;
    tracing::info!(%upload, "Permissions have been updated");
    Ok(())
}

/// Download the uploaded file.
#[tracing::instrument(skip(client, upload), fields(id = upload.id))]
pub async fn download_upload(
    client: &FossologyClient,
    upload: &Upload,
    group: Option<&str>,
) -> Result<DownloadedFile> {
    let request = with_group(
        client.request(Method::GET, &format!("uploads/{}/download", upload.id))?,
        group,
    );
    let response = client
        .expect(request, StatusCode::OK, |status| match status {
            StatusCode::FORBIDDEN => format!("Downloading upload {} is not authorized", upload.id),
            _ => format!("Unable to download upload {}", upload.id),
        })
        .await?;
    let name = attachment_name(response.headers()).unwrap_or_else(|| upload.upload_name.clone());
    let content = response.bytes().await?.to_vec();
    Ok(DownloadedFile { name, content })
}
