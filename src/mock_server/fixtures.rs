//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use std::collections::HashMap;

use crate::{Folder, Group, Job, JobStatus, License, Upload, UploadHash};

/// ID of the root folder every scenario starts with.
pub const ROOT_FOLDER_ID: u64 = 1;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Folder Fixtures
    // =========================================================================

    /// Create a folder below `parent`, `None` for the root folder.
    pub fn folder(id: u64, name: &str, parent: Option<u64>) -> Folder {
        Folder {
            id,
            name: name.to_string(),
            description: Some(format!("{name} folder")),
            parent,
            additional_info: HashMap::new(),
        }
    }

    /// The root folder the server creates on installation.
    pub fn root_folder() -> Folder {
        Self::folder(ROOT_FOLDER_ID, "Software Repository", None)
    }

    // =========================================================================
    // Upload Fixtures
    // =========================================================================

    /// Create an upload of `name` in `folder_id`, uploaded at `date`.
    pub fn upload(id: u64, folder_id: u64, name: &str, date: &str) -> Upload {
        Upload {
            id,
            folder_id,
            folder_name: None,
            description: Some(format!("Upload of {name}")),
            upload_name: name.to_string(),
            upload_date: date.to_string(),
            assignee: None,
            assignee_date: None,
            closing_date: None,
            hash: Some(UploadHash {
                sha1: Some(format!("{id:040x}")),
                md5: Some(format!("{id:032x}")),
                sha256: Some(format!("{id:064x}")),
                size: Some(1024),
            }),
            additional_info: HashMap::new(),
        }
    }

    // =========================================================================
    // Job Fixtures
    // =========================================================================

    /// Create a job for `upload_id` in `status`.
    pub fn job(id: u64, upload_id: u64, status: JobStatus, queue_date: &str) -> Job {
        Job {
            id,
            name: format!("job-{id}"),
            queue_date: queue_date.to_string(),
            upload_id: Some(upload_id),
            user_id: Some(3),
            group_id: Some(3),
            eta: Some(if status == JobStatus::Completed { 0 } else { 60 }),
            status,
            additional_info: HashMap::new(),
        }
    }

    // =========================================================================
    // Group and License Fixtures
    // =========================================================================

    pub fn group(id: u64, name: &str) -> Group {
        Group {
            id,
            name: name.to_string(),
            additional_info: HashMap::new(),
        }
    }

    /// Create a main license with the given risk level.
    pub fn license(id: u64, short_name: &str, full_name: &str, risk: u8) -> License {
        License {
            id: Some(id),
            short_name: short_name.to_string(),
            full_name: Some(full_name.to_string()),
            text: Some(format!("{full_name} text")),
            url: Some(format!("https://spdx.org/licenses/{short_name}.html")),
            risk: Some(risk),
            is_candidate: false,
            additional_info: HashMap::new(),
        }
    }

    // =========================================================================
    // Scenario Builders
    // =========================================================================

    /// Create a default set of test data for common scenarios.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario::new()
    }
}

/// A complete test scenario with related entities.
pub struct DefaultScenario {
    pub folders: Vec<Folder>,
    pub uploads: Vec<Upload>,
    pub jobs: Vec<Job>,
    pub groups: Vec<Group>,
    pub licenses: Vec<License>,
}

impl DefaultScenario {
    fn new() -> Self {
        let folders = vec![
            Fixtures::root_folder(),
            Fixtures::folder(2, "Scans", Some(ROOT_FOLDER_ID)),
        ];

        let uploads = vec![Fixtures::upload(
            2,
            ROOT_FOLDER_ID,
            "base-files_11.tar.xz",
            "2023-01-31 10:02:11.1234+00",
        )];

        let jobs = vec![Fixtures::job(
            3,
            2,
            JobStatus::Completed,
            "2023-01-31 10:02:15.5678+00",
        )];

        let groups = vec![Fixtures::group(3, "fossy")];

        let licenses = vec![
            Fixtures::license(1, "MIT", "MIT License", 1),
            Fixtures::license(2, "Apache-2.0", "Apache License 2.0", 2),
            Fixtures::license(3, "GPL-2.0-only", "GNU General Public License v2.0 only", 4),
        ];

        Self {
            folders,
            uploads,
            jobs,
            groups,
            licenses,
        }
    }
}
