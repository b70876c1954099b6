//! Enumerations shared by several endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Visibility of an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    #[default]
    Protected,
    Public,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::Protected => "protected",
            AccessLevel::Public => "public",
        }
    }
}

/// Report formats the server can generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    #[serde(rename = "dep5")]
    #[value(name = "dep5")]
    Dep5,
    #[serde(rename = "spdx2")]
    #[value(name = "spdx2")]
    Spdx2,
    #[serde(rename = "spdx2tv")]
    #[value(name = "spdx2tv")]
    Spdx2Tv,
    #[default]
    #[serde(rename = "readmeoss")]
    #[value(name = "readmeoss")]
    ReadmeOss,
    #[serde(rename = "unifiedreport")]
    #[value(name = "unifiedreport")]
    UnifiedReport,
    #[serde(rename = "clixml")]
    #[value(name = "clixml")]
    CliXml,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Dep5 => "dep5",
            ReportFormat::Spdx2 => "spdx2",
            ReportFormat::Spdx2Tv => "spdx2tv",
            ReportFormat::ReadmeOss => "readmeoss",
            ReportFormat::UnifiedReport => "unifiedreport",
            ReportFormat::CliXml => "clixml",
        }
    }
}

/// Kind of item a search is limited to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    AllFiles,
    Containers,
    Directory,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::AllFiles => "allfiles",
            SearchType::Containers => "containers",
            SearchType::Directory => "directory",
        }
    }
}

/// Scope of an API token.
///
/// `Read` tokens are limited to GET calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    #[default]
    Read,
    Write,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Read => "read",
            TokenScope::Write => "write",
        }
    }
}

/// Clearing progress of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearingStatus {
    Open,
    InProgress,
    Closed,
    Rejected,
}

impl ClearingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClearingStatus::Open => "Open",
            ClearingStatus::InProgress => "InProgress",
            ClearingStatus::Closed => "Closed",
            ClearingStatus::Rejected => "Rejected",
        }
    }
}

/// State of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Completed,
    Failed,
    Queued,
    Processing,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Queued => "Queued",
            JobStatus::Processing => "Processing",
            JobStatus::Unknown => "Unknown",
        }
    }
}

/// License category filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Candidate,
    Main,
    #[default]
    All,
}

impl LicenseType {
    pub fn as_str(self) -> &'static str {
        match self {
            LicenseType::Candidate => "candidate",
            LicenseType::Main => "main",
            LicenseType::All => "all",
        }
    }
}

/// Role of a group member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberPerm {
    #[default]
    User,
    Admin,
    Advisor,
}

impl MemberPerm {
    /// Numeric value expected by the API.
    pub fn value(self) -> u8 {
        match self {
            MemberPerm::User => 0,
            MemberPerm::Admin => 1,
            MemberPerm::Advisor => 2,
        }
    }
}

/// Permission level on an upload or for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "0")]
    None,
    #[serde(rename = "1")]
    ReadOnly,
    #[serde(rename = "3")]
    ReadWrite,
    #[serde(rename = "5")]
    ClearingAdmin,
    #[serde(rename = "10")]
    Admin,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::None => "0",
            Permission::ReadOnly => "1",
            Permission::ReadWrite => "3",
            Permission::ClearingAdmin => "5",
            Permission::Admin => "10",
        }
    }
}

/// Whether a copyright finding is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyrightStatus {
    #[default]
    Active,
    Inactive,
}

impl CopyrightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CopyrightStatus::Active => "active",
            CopyrightStatus::Inactive => "inactive",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    AccessLevel,
    ReportFormat,
    SearchType,
    TokenScope,
    ClearingStatus,
    JobStatus,
    LicenseType,
    Permission,
    CopyrightStatus,
);
