//! Report generation and download.

use reqwest::{Method, Response, StatusCode};

use crate::client::{attachment_name, json, with_group, FossologyClient};
use crate::error::Result;
use crate::models::{ApiMessage, ReportFormat, Upload};
use crate::poll::{poll, RetryPolicy, LONG_POLL_ATTEMPTS, SHORT_POLL_ATTEMPTS};

/// A file downloaded from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// File name from `Content-Disposition`, or a fallback.
    pub name: String,
    pub content: Vec<u8>,
}

/// Ask the server to generate a report and return the report ID.
#[tracing::instrument(skip(client, upload), fields(upload = upload.id))]
pub async fn generate_report(
    client: &FossologyClient,
    upload: &Upload,
    format: ReportFormat,
    group: Option<&str>,
) -> Result<u64> {
    let id = upload.id;
    let policy = RetryPolicy::new(SHORT_POLL_ATTEMPTS);
    let description = format!("Report generation for upload {id}");

    let message: ApiMessage = poll(&policy, &description, |_| async move {
        let request = client.request(Method::GET, "report").map(|r| {
            with_group(
                r.header("uploadId", id.to_string())
                    .header("reportFormat", format.as_str()),
                group,
            )
        });
        client
            .attempt(
                request,
                StatusCode::CREATED,
                |status| match status {
                    StatusCode::FORBIDDEN => format!(
                        "Report generation for upload {id} is not authorized for group {}",
                        group.unwrap_or_default()
                    ),
                    _ => format!("Report generation for upload {id} failed"),
                },
                json::<ApiMessage>,
            )
            .await
    })
    .await?;

    let report_id = message.id()?;
    tracing::info!(report_id, %format, %upload, "Report generation scheduled");
    Ok(report_id)
}

/// Download a generated report, polling while generation is in progress.
///
/// Up to 10 attempts; `wait_time` of 0 follows the server's `Retry-After`.
#[tracing::instrument(skip(client))]
pub async fn download_report(
    client: &FossologyClient,
    report_id: u64,
    group: Option<&str>,
    wait_time: u64,
) -> Result<DownloadedFile> {
    let policy = RetryPolicy::new(LONG_POLL_ATTEMPTS).with_wait_time(wait_time);
    let description = format!("Download of report {report_id}");

    let file = poll(&policy, &description, |_| async move {
        let request = client
            .request(Method::GET, &format!("report/{report_id}"))
            .map(|r| with_group(r, group));
        client
            .attempt(
                request,
                StatusCode::OK,
                |status| match status {
                    StatusCode::FORBIDDEN => format!(
                        "Getting report {report_id} is not authorized for group {}",
                        group.unwrap_or_default()
                    ),
                    _ => format!("Download of report {report_id} failed"),
                },
                |response| read_report(response, report_id),
            )
            .await
    })
    .await?;

    tracing::info!(report_id, name = %file.name, bytes = file.content.len(), "Report downloaded");
    Ok(file)
}

async fn read_report(response: Response, report_id: u64) -> Result<DownloadedFile> {
    let name = attachment_name(response.headers()).unwrap_or_else(|| format!("report-{report_id}"));
    let content = response.bytes().await?.to_vec();
    Ok(DownloadedFile { name, content })
}
