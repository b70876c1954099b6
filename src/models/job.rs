//! Job model and endpoints.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::client::{error_for, with_group, FossologyClient};
use crate::error::Result;
use crate::models::{ApiMessage, Folder, JobStatus, Upload};
use crate::pagination::{total_pages, PageResponse};
use crate::traits::{Get, List};

/// Seconds to wait before re-checking a job that has not completed yet.
pub const DEFAULT_JOB_WAIT_SECS: u64 = 30;

/// A scheduled unit of server-side analysis work.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u64,
    pub name: String,
    /// Queue timestamp as sent by the server.
    pub queue_date: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub upload_id: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub user_id: Option<u64>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub group_id: Option<u64>,
    /// Estimated seconds until completion.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub eta: Option<u64>,
    pub status: JobStatus,
    #[serde(flatten)]
    pub additional_info: HashMap<String, serde_json::Value>,
}

impl Job {
    /// Parsed queue timestamp.
    pub fn queued_at(&self) -> Option<DateTime<FixedOffset>> {
        super::upload::parse_timestamp(&self.queue_date)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job {} ({}): {}", self.id, self.name, self.status)
    }
}

/// Filters for listing jobs.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    /// Only jobs of this upload.
    pub upload: Option<u64>,
    /// Jobs of all users (`/jobs/all`, admin only).
    pub all: bool,
    pub group: Option<String>,
}

/// Agents and options requested when scheduling jobs.
///
/// The default enables every analysis agent, every decider and every reuse
/// option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub analysis: Analysis,
    pub decider: Decider,
    pub reuse: Reuse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub bucket: bool,
    pub copyright_email_author: bool,
    pub ecc: bool,
    pub keyword: bool,
    pub mime: bool,
    pub monk: bool,
    pub nomos: bool,
    pub ojo: bool,
    pub package: bool,
    pub specific_agent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decider {
    pub nomos_monk: bool,
    pub bulk_reused: bool,
    pub new_scanner: bool,
    pub ojo_decider: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reuse {
    /// Upload to reuse clearing decisions from, 0 for none.
    pub reuse_upload: u64,
    pub reuse_group: u64,
    pub reuse_main: bool,
    pub reuse_enhanced: bool,
    pub reuse_report: bool,
    pub reuse_copyright: bool,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            analysis: Analysis {
                bucket: true,
                copyright_email_author: true,
                ecc: true,
                keyword: true,
                mime: true,
                monk: true,
                nomos: true,
                ojo: true,
                package: true,
                specific_agent: true,
            },
            decider: Decider {
                nomos_monk: true,
                bulk_reused: true,
                new_scanner: true,
                ojo_decider: true,
            },
            reuse: Reuse {
                reuse_upload: 0,
                reuse_group: 0,
                reuse_main: true,
                reuse_enhanced: true,
                reuse_report: true,
                reuse_copyright: true,
            },
        }
    }
}

#[async_trait]
impl Get for Job {
    type Id = u64;

    async fn get(client: &FossologyClient, id: u64) -> Result<Self> {
        detail_job(client, id, None, false, DEFAULT_JOB_WAIT_SECS).await
    }
}

#[async_trait]
impl List for Job {
    type Query = JobQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(
        client: &FossologyClient,
        query: &Self::Query,
        page: u32,
        page_size: u32,
    ) -> Result<PageResponse<Self>> {
        let path = if query.all { "jobs/all" } else { "jobs" };
        let mut request = client.request(Method::GET, path)?;
        if let Some(upload) = query.upload {
            request = request.query(&[("upload", upload)]);
        }
        let request = with_group(client.paged(request, page, page_size), query.group.as_deref());

        let response = client
            .expect(request, StatusCode::OK, |_| {
                format!("Unable to retrieve the list of jobs from page {page}")
            })
            .await?;

        let total_pages = total_pages(response.headers());
        let items = response.json().await?;
        Ok(PageResponse { items, total_pages })
    }
}

async fn fetch_job(client: &FossologyClient, id: u64, group: Option<&str>) -> Result<Job> {
    let request = with_group(client.request(Method::GET, &format!("jobs/{id}"))?, group);
    let response = client
        .expect(request, StatusCode::OK, |_| {
            format!("Error while getting details for job {id}")
        })
        .await?;
    Ok(response.json().await?)
}

/// Fetch a job, optionally waiting once for it to complete.
///
/// With `wait`, a job that is not `Completed` is re-fetched exactly once
/// after sleeping `timeout` seconds; the second answer is returned as is.
#[tracing::instrument(skip(client))]
pub async fn detail_job(
    client: &FossologyClient,
    id: u64,
    group: Option<&str>,
    wait: bool,
    timeout: u64,
) -> Result<Job> {
    let job = fetch_job(client, id, group).await?;
    if !wait || job.status == JobStatus::Completed {
        tracing::debug!(%job, "Got job details");
        return Ok(job);
    }

    tracing::info!(%job, timeout, "Job not completed yet, waiting before checking again");
    tokio::time::sleep(Duration::from_secs(timeout)).await;
    let job = fetch_job(client, id, group).await?;
    tracing::debug!(%job, "Got job details");
    Ok(job)
}

/// Schedule analysis jobs for an upload.
///
/// Returns the job details, see [`detail_job`] for `wait` and `timeout`.
#[tracing::instrument(
    skip(client, folder, upload, spec),
    fields(folder = folder.id, upload = upload.id)
)]
pub async fn schedule_jobs(
    client: &FossologyClient,
    folder: &Folder,
    upload: &Upload,
    spec: &JobSpec,
    group: Option<&str>,
    wait: bool,
    timeout: u64,
) -> Result<Job> {
    let request = with_group(
        client
            .request(Method::POST, "jobs")?
            .header("folderId", folder.id.to_string())
            .header("uploadId", upload.id.to_string())
            .json(spec),
        group,
    );
    let response = client.execute(request).await?;

    if response.status() != StatusCode::CREATED {
        return Err(error_for(response, |status| match status {
            StatusCode::FORBIDDEN => format!(
                "Scheduling jobs for upload {} is not authorized",
                upload.upload_name
            ),
            _ => format!("Scheduling jobs for upload {} failed", upload.upload_name),
        })
        .await);
    }

    let message: ApiMessage = response.json().await?;
    let job = detail_job(client, message.id()?, group, wait, timeout).await?;
    tracing::info!(%job, %upload, "Jobs scheduled");
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_as_strings() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "base-files_11.tar.xz",
            "queueDate": "2020-05-13 12:57:50.241364+00",
            "uploadId": "2",
            "userId": "3",
            "groupId": "3",
            "eta": 0,
            "status": "Completed"
        }))
        .unwrap();
        assert_eq!(job.upload_id, Some(2));
        assert_eq!(job.eta, Some(0));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_default_job_spec_shape() {
        let spec = serde_json::to_value(JobSpec::default()).unwrap();
        assert_eq!(spec["analysis"]["specific_agent"], true);
        assert_eq!(spec["decider"]["ojo_decider"], true);
        assert_eq!(spec["reuse"]["reuse_upload"], 0);
        assert_eq!(spec["reuse"]["reuse_copyright"], true);
    }
}
