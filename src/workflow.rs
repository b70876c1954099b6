//! Upload, scan and report workflow used by `foss-cli`.
//!
//! [`run_workflow`] chains the remote steps: resolve the target folder, reuse
//! or create an upload, reuse or schedule analysis jobs, then generate and
//! download a report into the result directory. The decisions between those
//! steps are pure functions over already fetched data.

use std::path::{Path, PathBuf};

use crate::client::FossologyClient;
use crate::error::{FossologyError, Result};
use crate::models::{
    detail_upload, download_report, generate_report, list_folders, schedule_jobs, upload_file,
    AccessLevel, Folder, Job, JobQuery, JobSpec, JobStatus, ReportFormat, Upload, UploadOptions,
    UploadQuery, UploadSource, DEFAULT_JOB_WAIT_SECS,
};
use crate::pagination::PageRequest;
use crate::traits::List;

/// Directory receiving reports and log files.
pub const DEFAULT_RESULT_DIR: &str = ".foss_cli_results";

/// Seconds between upload detail polls after a new upload.
pub const UPLOAD_WAIT_SECS: u64 = 10;

/// Pick the folder called `name` from `folders`.
///
/// An empty name selects the root folder, the one without a parent.
///
/// # Errors
///
/// [`FossologyError::InvalidArgument`] if no folder or more than one folder
/// carries that name.
pub fn select_folder<'a>(folders: &'a [Folder], name: &str) -> Result<&'a Folder> {
    if name.is_empty() {
        tracing::warn!("folder_name not specified, the root folder is used");
        return folders.iter().find(|f| f.parent.is_none()).ok_or_else(|| {
            FossologyError::InvalidArgument("No root folder is visible to the user.".to_string())
        });
    }

    let mut matching = folders.iter().filter(|f| f.name == name);
    match (matching.next(), matching.next()) {
        (Some(folder), None) => {
            tracing::debug!(%folder, "Found folder");
            Ok(folder)
        }
        (Some(_), Some(_)) => Err(FossologyError::InvalidArgument(
            "Multiple Folders with same name are not supported.".to_string(),
        )),
        (None, _) => Err(FossologyError::InvalidArgument(format!(
            "Requested Upload Folder {name} does not exist."
        ))),
    }
}

/// The newest upload whose name is a suffix of `file_name`.
pub fn newest_upload<'a>(uploads: &'a [Upload], file_name: &str) -> Option<&'a Upload> {
    uploads
        .iter()
        .filter(|u| file_name.ends_with(&u.upload_name))
        .max_by(|a, b| {
            a.uploaded_at()
                .cmp(&b.uploaded_at())
                .then_with(|| a.upload_date.cmp(&b.upload_date))
        })
}

/// The most recently queued job.
pub fn newest_job(jobs: &[Job]) -> Option<&Job> {
    jobs.iter().max_by(|a, b| {
        a.queued_at()
            .cmp(&b.queued_at())
            .then_with(|| a.queue_date.cmp(&b.queue_date))
    })
}

/// Fetch the folder list and resolve `name` with [`select_folder`].
pub async fn resolve_folder(client: &FossologyClient, name: &str) -> Result<Folder> {
    let folders = list_folders(client, None).await?;
    select_folder(&folders, name).cloned()
}

/// Look for an earlier upload of `file` in `folder` and return its details.
#[tracing::instrument(skip(client, folder), fields(folder = folder.id))]
pub async fn find_newest_upload(
    client: &FossologyClient,
    file: &Path,
    folder: &Folder,
) -> Result<Option<Upload>> {
    let query = UploadQuery {
        folder: Some(folder.id),
        ..Default::default()
    };
    let uploads = Upload::list(client, &query, &PageRequest::default()).await?;
    let file_name = file.to_string_lossy();

    match newest_upload(&uploads.items, &file_name) {
        Some(found) => {
            let upload = detail_upload(client, found.id, None, 0).await?;
            tracing::info!(%upload, "Can reuse upload");
            Ok(Some(upload))
        }
        None => Ok(None),
    }
}

/// Look for the newest job of `upload`.
#[tracing::instrument(skip(client, upload), fields(upload = upload.id))]
pub async fn find_newest_job(client: &FossologyClient, upload: &Upload) -> Result<Option<Job>> {
    let query = JobQuery {
        upload: Some(upload.id),
        ..Default::default()
    };
    let jobs = Job::list(client, &query, &PageRequest::default()).await?;
    Ok(newest_job(&jobs.items).cloned())
}

/// Settings of [`run_workflow`].
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Target folder name, empty for the root folder.
    pub folder_name: String,
    pub file_description: String,
    /// Never create an upload.
    pub dry_run: bool,
    pub reuse_newest_upload: bool,
    pub reuse_newest_job: bool,
    pub report_format: ReportFormat,
    pub access_level: AccessLevel,
    pub result_dir: PathBuf,
    /// Seconds to wait once for scheduled jobs to complete.
    pub job_timeout: u64,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            folder_name: String::new(),
            file_description: "Upload via foss-cli".to_string(),
            dry_run: false,
            reuse_newest_upload: false,
            reuse_newest_job: false,
            report_format: ReportFormat::UnifiedReport,
            access_level: AccessLevel::Protected,
            result_dir: PathBuf::from(DEFAULT_RESULT_DIR),
            job_timeout: DEFAULT_JOB_WAIT_SECS,
        }
    }
}

/// What a finished workflow produced.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub upload: Upload,
    pub job: Job,
    pub report_id: u64,
    /// Where the report was written.
    pub report_path: PathBuf,
}

/// Upload `file`, scan it and store a report in the result directory.
///
/// # Errors
///
/// [`FossologyError::Workflow`] if no upload is available (dry run without
/// reuse) or the job has not completed after waiting; any API error of the
/// individual steps.
#[tracing::instrument(skip(client, options), fields(file = %file.display()))]
pub async fn run_workflow(
    client: &FossologyClient,
    file: &Path,
    options: &WorkflowOptions,
) -> Result<WorkflowOutcome> {
    let folder = resolve_folder(client, &options.folder_name).await?;

    let upload = if options.reuse_newest_upload {
        find_newest_upload(client, file, &folder).await?
    } else if options.dry_run {
        tracing::warn!("Skip upload as dry_run is requested without --reuse_newest_upload");
        None
    } else {
        tracing::debug!("Initiate new upload");
        let upload_options = UploadOptions {
            description: Some(options.file_description.clone()),
            access_level: Some(options.access_level),
            wait_time: UPLOAD_WAIT_SECS,
            ..Default::default()
        };
        let source = UploadSource::File(file.to_path_buf());
        Some(upload_file(client, &folder, &source, &upload_options).await?)
    };

    let upload = upload.ok_or_else(|| {
        FossologyError::Workflow(format!("Unable to find upload for {}.", file.display()))
    })?;

    let reused_job = if options.reuse_newest_job {
        let job = find_newest_job(client, &upload).await?;
        match &job {
            Some(job) => tracing::debug!(%job, queued = %job.queue_date, "Can reuse job"),
            None => tracing::info!(%upload, "Upload never started a job"),
        }
        job
    } else {
        None
    };

    let job = match reused_job {
        Some(job) => job,
        None => {
            schedule_jobs(
                client,
                &folder,
                &upload,
                &JobSpec::default(),
                None,
                true,
                options.job_timeout,
            )
            .await?
        }
    };

    tracing::debug!(%job, "Job state");
    match job.status {
        JobStatus::Completed => {}
        JobStatus::Processing => {
            return Err(FossologyError::Workflow(format!(
                "Job {} is still in state {}: Please try again later with --reuse_newest_upload --reuse_newest_job",
                job.id, job.status
            )))
        }
        status => {
            return Err(FossologyError::Workflow(format!(
                "Job {} ended in state {status}",
                job.id
            )))
        }
    }

    let report_id = generate_report(client, &upload, options.report_format, None).await?;
    let report = download_report(client, report_id, None, 0).await?;

    tokio::fs::create_dir_all(&options.result_dir).await?;
    let report_path = options.result_dir.join(&report.name);
    tokio::fs::write(&report_path, &report.content).await?;
    tracing::info!(path = %report_path.display(), bytes = report.content.len(), "Report written");

    Ok(WorkflowOutcome {
        upload,
        job,
        report_id,
        report_path,
    })
}
