//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! `foss-cli` binary. Every subcommand and option also accepts the
//! snake_case spelling (`start_workflow`, `--folder_name`).

mod config;
mod prompt;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::error::{FossologyError, Result};
use crate::models::{AccessLevel, ReportFormat, TokenScope};
use crate::workflow::DEFAULT_RESULT_DIR;

pub use config::{CliConfig, ServerConfig, CONFIG_FILE_NAME};
pub use prompt::{prompt_config, ConfigAnswers};

/// Server used by `config` when `--server` is not given.
pub const DEFAULT_CONFIG_SERVER: &str = "http://fossology/repo";

/// Default name of the log file inside the result directory.
pub const DEFAULT_LOG_FILE_NAME: &str = ".foss_cli.log";

/// FOSSology command-line interface.
#[derive(Parser, Debug)]
#[command(name = "foss-cli", about = "FOSSology command-line interface", version)]
pub struct Cli {
    /// The token to be used (overrides the config file and FOSS_TOKEN).
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// URL of the FOSSology server (overrides the config file and FOSS_SERVER).
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Increase verbosity level (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Send detailed logging output to console.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Send logging output to console (default).
    #[arg(long, global = true, alias = "log_to_console", overrides_with = "no_log_to_console")]
    pub log_to_console: bool,

    /// Do not send logging output to console.
    #[arg(long, global = true, alias = "no_log_to_console", overrides_with = "log_to_console")]
    pub no_log_to_console: bool,

    /// Send logging output to a file in the result directory.
    #[arg(long, global = true, alias = "log_to_file")]
    pub log_to_file: bool,

    /// Name of the log file.
    #[arg(long, global = true, alias = "log_file_name", default_value = DEFAULT_LOG_FILE_NAME)]
    pub log_file_name: String,

    /// Directory where foss-cli writes results.
    #[arg(long, global = true, alias = "result_dir", default_value = DEFAULT_RESULT_DIR)]
    pub result_dir: PathBuf,

    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Whether log events go to the console.
    pub fn console_logging(&self) -> bool {
        !self.no_log_to_console
    }

    /// `EnvFilter` directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            return "debug";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Whether the command talks to the server with an existing token.
    pub fn needs_client(&self) -> bool {
        !matches!(self.command, Command::Config { .. } | Command::Log { .. })
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update the foss-cli config file.
    ///
    /// The server is taken from `--server`, defaulting to
    /// `http://fossology/repo`.
    Config {
        /// Username on the FOSSology server.
        #[arg(long, default_value = "fossy")]
        username: String,

        /// Password of the user.
        #[arg(long, default_value = "fossy")]
        password: String,

        /// Access scope of the generated token.
        #[arg(long, alias = "token_scope", value_enum, default_value_t = TokenScope::Read)]
        token_scope: TokenScope,

        /// Read the config values from stdin instead of the options.
        #[arg(long = "no-interactive", alias = "nointeractive", action = ArgAction::SetFalse)]
        interactive: bool,
    },

    /// Add a message to the log.
    ///
    /// Level 0 is debug, 1 info and 2 warning; whether it is printed depends
    /// on the global verbosity.
    Log {
        /// Level of the message (0, 1, 2).
        #[arg(long, alias = "log_level", default_value_t = 0)]
        log_level: u8,

        /// Text of the log message.
        #[arg(long, alias = "message_text", default_value = "log message")]
        message_text: String,
    },

    /// Create a folder below the root folder.
    #[command(alias = "create_folder")]
    CreateFolder {
        folder_name: String,

        /// Description of the folder.
        #[arg(long, alias = "folder_description")]
        folder_description: Option<String>,

        /// Name of the group owning the folder.
        #[arg(long, alias = "folder_group")]
        folder_group: Option<String>,
    },

    /// Create a group; an existing group is not an error.
    #[command(alias = "create_group")]
    CreateGroup { group_name: String },

    /// Upload a file.
    #[command(alias = "upload_file")]
    UploadFile {
        upload_file: PathBuf,

        /// Name of the upload folder, empty for the root folder.
        #[arg(long, alias = "folder_name", default_value = "")]
        folder_name: String,

        /// Description of the upload.
        #[arg(long, default_value = "")]
        description: String,

        /// Access level of the upload.
        #[arg(long, alias = "access_level", value_enum, default_value_t = AccessLevel::Public)]
        access_level: AccessLevel,

        /// Reuse the newest upload of the file if available.
        #[arg(long, alias = "reuse_newest_upload")]
        reuse_newest_upload: bool,

        /// Print the summary of the upload.
        #[arg(long)]
        summary: bool,
    },

    /// Delete a folder by name.
    #[command(alias = "delete_folder")]
    DeleteFolder { folder_name: String },

    /// Delete an upload by name.
    #[command(alias = "delete_upload")]
    DeleteUpload { upload_name: String },

    /// Upload a file, scan it and download a report.
    #[command(alias = "start_workflow")]
    StartWorkflow {
        file_name: PathBuf,

        /// Name of the folder to upload to, empty for the root folder.
        #[arg(long, alias = "folder_name", default_value = "")]
        folder_name: String,

        /// Description of the upload.
        #[arg(long, alias = "file_description", default_value = "Upload via foss-cli")]
        file_description: String,

        /// Do not upload, only show what would be done.
        #[arg(long, alias = "dry_run")]
        dry_run: bool,

        /// Reuse the newest upload of the file if available.
        #[arg(long, alias = "reuse_newest_upload")]
        reuse_newest_upload: bool,

        /// Reuse the newest job of the upload if available.
        #[arg(long, alias = "reuse_newest_job")]
        reuse_newest_job: bool,

        /// Format of the generated report.
        #[arg(
            long,
            alias = "report_format",
            value_enum,
            default_value_t = ReportFormat::UnifiedReport
        )]
        report_format: ReportFormat,

        /// Access level of the upload.
        #[arg(long, alias = "access_level", value_enum, default_value_t = AccessLevel::Protected)]
        access_level: AccessLevel,
    },

    /// List entities with pagination.
    List {
        /// The type of entity to list.
        entity: Entity,

        /// Page number (1-indexed).
        #[arg(long)]
        page: Option<u32>,

        /// Number of items per page.
        #[arg(long, alias = "page_size")]
        page_size: Option<u32>,

        /// Fetch every page.
        #[arg(long, alias = "all_pages")]
        all_pages: bool,
    },
}

/// Entity types that can be listed.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    #[value(alias = "folder")]
    Folders,
    #[value(alias = "upload")]
    Uploads,
    #[value(alias = "job")]
    Jobs,
    #[value(alias = "group")]
    Groups,
    #[value(alias = "license")]
    Licenses,
}

/// Emit `text` at the level selected by the `log` command.
///
/// # Errors
///
/// [`FossologyError::InvalidArgument`] for a level other than 0, 1 or 2.
pub fn log_message(level: u8, text: &str) -> Result<()> {
    match level {
        0 => tracing::debug!("{text}"),
        1 => tracing::info!("{text}"),
        2 => tracing::warn!("{text}"),
        _ => {
            return Err(FossologyError::InvalidArgument(
                "Impossible Log Level in Log command.".to_string(),
            ))
        }
    }
    Ok(())
}
