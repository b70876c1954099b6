//! Mock server state management.
//!
//! Provides the in-memory data store for the mock FOSSology server.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{Folder, Group, Job, JobStatus, License, Upload, User};

/// A report generated by the mock server.
#[derive(Debug, Clone)]
pub struct MockReport {
    pub upload_id: u64,
    pub name: String,
    pub content: Vec<u8>,
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug)]
pub struct MockState {
    /// API version reported by `/info`.
    pub version: String,

    /// The user every valid token belongs to.
    pub user: User,

    pub folders: BTreeMap<u64, Folder>,
    pub uploads: BTreeMap<u64, Upload>,
    pub jobs: BTreeMap<u64, Job>,
    pub reports: BTreeMap<u64, MockReport>,
    pub groups: BTreeMap<u64, Group>,
    pub licenses: Vec<License>,

    /// Number of 503 answers a new upload gives before its details are ready.
    pub upload_delay: u32,

    /// Number of 503 answers a new report gives before it can be downloaded.
    pub report_delay: u32,

    /// Status of newly scheduled jobs.
    pub scheduled_job_status: JobStatus,

    /// Remaining 503 answers per resource path.
    pub not_ready: HashMap<String, u32>,

    /// Optional authentication token. If set, requests must include this token.
    pub required_token: Option<String>,

    next_id: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            version: "1.6.1".to_string(),
            user: default_user(),
            folders: BTreeMap::new(),
            uploads: BTreeMap::new(),
            jobs: BTreeMap::new(),
            reports: BTreeMap::new(),
            groups: BTreeMap::new(),
            licenses: Vec::new(),
            upload_delay: 0,
            report_delay: 0,
            scheduled_job_status: JobStatus::Completed,
            not_ready: HashMap::new(),
            required_token: None,
            next_id: 100,
        }
    }
}

fn default_user() -> User {
    User {
        id: 3,
        name: "fossy".to_string(),
        description: Some("super user".to_string()),
        email: Some("fossy@localhost".to_string()),
        access_level: Some("admin".to_string()),
        root_folder_id: Some(1),
        email_notification: Some(false),
        default_group: Some(3),
        agents: None,
        additional_info: HashMap::new(),
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Report `version` from `/info`.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.insert(folder.id, folder);
        self
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.uploads.insert(upload.id, upload);
        self
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.insert(job.id, job);
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.insert(group.id, group);
        self
    }

    pub fn with_license(mut self, license: License) -> Self {
        self.licenses.push(license);
        self
    }

    /// Answer 503 `delay` times for every new upload before it is ready.
    pub fn with_upload_delay(mut self, delay: u32) -> Self {
        self.upload_delay = delay;
        self
    }

    /// Answer 503 `delay` times for every new report before it is ready.
    pub fn with_report_delay(mut self, delay: u32) -> Self {
        self.report_delay = delay;
        self
    }

    /// Status newly scheduled jobs report.
    pub fn with_scheduled_job_status(mut self, status: JobStatus) -> Self {
        self.scheduled_job_status = status;
        self
    }

    /// Set the required authentication token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Allocate a fresh resource ID.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Consume one pending 503 for `key`; true while the resource is not ready.
    pub fn take_not_ready(&mut self, key: &str) -> bool {
        match self.not_ready.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// The folder called `name` below `parent`.
    pub fn find_folder(&self, name: &str, parent: u64) -> Option<&Folder> {
        self.folders
            .values()
            .find(|f| f.name == name && f.parent == Some(parent))
    }

    /// Uploads, optionally limited to one folder.
    pub fn list_uploads(&self, folder: Option<u64>) -> Vec<Upload> {
        self.uploads
            .values()
            .filter(|u| folder.map(|f| u.folder_id == f).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Jobs, optionally limited to one upload.
    pub fn list_jobs(&self, upload: Option<u64>) -> Vec<Job> {
        self.jobs
            .values()
            .filter(|j| upload.map(|u| j.upload_id == Some(u)).unwrap_or(true))
            .cloned()
            .collect()
    }
}
