//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{Folder, Group, Job, License, Summary, Upload};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

fn header(title: String) -> Vec<String> {
    let divider = "─".repeat(title.chars().count().max(30));
    vec![title, divider]
}

impl PrettyPrint for Folder {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Folder: {}", self.name));
        lines.push(format!("ID:             {}", self.id));

        if let Some(parent) = self.parent {
            lines.push(format!("Parent:         {}", parent));
        }

        if let Some(ref description) = self.description {
            if !description.is_empty() {
                lines.push(format!("Description:    {}", description));
            }
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Upload {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Upload: {}", self.upload_name));
        lines.push(format!("ID:             {}", self.id));

        match self.folder_name {
            Some(ref name) => lines.push(format!("Folder:         {} ({})", name, self.folder_id)),
            None => lines.push(format!("Folder:         {}", self.folder_id)),
        }

        match self.uploaded_at() {
            Some(date) => lines.push(format!(
                "Uploaded:       {}",
                date.format("%Y-%m-%d %H:%M:%S %:z")
            )),
            None => lines.push(format!("Uploaded:       {}", self.upload_date)),
        }

        if let Some(size) = self.size() {
            lines.push(format!("Size:           {} bytes", size));
        }

        if let Some(sha1) = self.hash.as_ref().and_then(|h| h.sha1.as_ref()) {
            lines.push(format!("SHA1:           {}", sha1));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Summary {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Summary: {}", self.upload_name));

        if let Some(ref main) = self.main_license {
            lines.push(format!("Main License:   {}", main));
        }

        // Scanner findings vs. concluded licenses
        lines.push(format!(
            "Licenses:       {} unique, {} total",
            self.unique_licenses, self.total_licenses
        ));
        lines.push(format!(
            "Concluded:      {} unique, {} total",
            self.unique_concluded_licenses, self.total_concluded_licenses
        ));
        lines.push(format!(
            "Clearing:       {} of {} files cleared",
            self.files_cleared, self.files_to_be_cleared
        ));

        if let Some(status) = self.clearing_status {
            lines.push(format!("Status:         {}", status));
        }

        lines.push(format!("Copyrights:     {}", self.copyright_count));

        lines.join("\n")
    }
}

impl PrettyPrint for Job {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Job #{}", self.id));
        lines.push(format!("Name:           {}", self.name));
        lines.push(format!("Status:         {}", self.status));
        lines.push(format!("Queued:         {}", self.queue_date));

        if let Some(upload) = self.upload_id {
            lines.push(format!("Upload:         {}", upload));
        }

        if let Some(eta) = self.eta.filter(|eta| *eta > 0) {
            lines.push(format!("ETA:            {}s", eta));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for License {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("License: {}", self.short_name));

        if let Some(ref full_name) = self.full_name {
            lines.push(format!("Full Name:      {}", full_name));
        }

        if let Some(ref url) = self.url {
            if !url.is_empty() {
                lines.push(format!("URL:            {}", url));
            }
        }

        if let Some(risk) = self.risk {
            lines.push(format!("Risk:           {}", risk));
        }

        if self.is_candidate {
            lines.push("Candidate:      yes".to_string());
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Group {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Group: {}", self.name));
        lines.push(format!("ID:             {}", self.id));
        lines.join("\n")
    }
}
