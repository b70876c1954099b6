//! FOSSology CLI binary.
//!
//! A command-line interface for uploading files to a FOSSology server,
//! scanning them and downloading reports.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use fossology::cli::{
    log_message, prompt_config, Cli, CliConfig, Command, ConfigAnswers, Entity, ServerConfig,
    CONFIG_FILE_NAME, DEFAULT_CONFIG_SERVER,
};
use fossology::output::PrettyPrint;
use fossology::workflow::{
    find_newest_upload, resolve_folder, run_workflow, WorkflowOptions, UPLOAD_WAIT_SECS,
};
use fossology::{
    create_folder, delete_folder, delete_upload, ensure_group, fossology_token, get_self,
    list_folders, list_groups, upload_summary, Folder, FossologyClient, FossologyError, Group,
    Job, License, List, Page, PageRequest, TokenRequest, TokenScope, Upload, UploadOptions,
    UploadSource, DEFAULT_PAGE_SIZE, DEFAULT_SERVER_URL,
};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = std::fs::create_dir_all(&cli.result_dir) {
        eprintln!("Error: unable to create {}: {e}", cli.result_dir.display());
        return ExitCode::FAILURE;
    }

    let _guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: unable to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose >= 2 {
        tracing::debug!(args = ?std::env::args().collect::<Vec<_>>(), "foss-cli called");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "foss-cli failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install console and file layers; the guard flushes the file on drop.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let level = cli.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,fossology={level},foss_cli={level}")));

    let console_layer = cli
        .console_logging()
        .then(|| fmt::layer().with_writer(io::stderr).with_target(false));

    let (file_layer, guard) = if cli.log_to_file {
        let appender = tracing_appender::rolling::never(&cli.result_dir, &cli.log_file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

async fn run(cli: Cli) -> fossology::Result<()> {
    match &cli.command {
        Command::Config {
            username,
            password,
            token_scope,
            interactive,
        } => {
            let server = cli
                .server
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_SERVER.to_string());
            handle_config(server, username, password, *token_scope, *interactive).await
        }
        Command::Log {
            log_level,
            message_text,
        } => log_message(*log_level, message_text),
        _ => {
            let client = connect(&cli).await?;
            dispatch(&client, &cli).await
        }
    }
}

/// Build a client from `--token`/`--server`, the config file, or the environment.
async fn connect(cli: &Cli) -> fossology::Result<FossologyClient> {
    let config = CliConfig::load(Path::new(CONFIG_FILE_NAME))?.map(|c| c.fossology);

    let token = cli
        .token
        .clone()
        .or_else(|| config.as_ref().map(|c| c.token.clone()))
        .or_else(|| std::env::var("FOSS_TOKEN").ok())
        .ok_or_else(|| {
            FossologyError::ConfigMissing(
                "No Token provided. Either provide FOSS_TOKEN in environment or use the -t option."
                    .to_string(),
            )
        })?;

    let server = cli
        .server
        .clone()
        .or_else(|| config.as_ref().map(|c| c.server_url.clone()))
        .or_else(|| std::env::var("FOSS_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let client = FossologyClient::connect(&token, &server).await?;
    let user = get_self(&client).await?;
    tracing::debug!(user = %user.name, server = %client.host(), "Logged in");
    if cli.debug {
        tracing::debug!(
            api = %client.api_url(),
            version = ?client.server_version(),
            "Started in debug mode"
        );
    }
    Ok(client)
}

async fn dispatch(client: &FossologyClient, cli: &Cli) -> fossology::Result<()> {
    match &cli.command {
        Command::CreateFolder {
            folder_name,
            folder_description,
            folder_group,
        } => {
            let root = resolve_folder(client, "").await?;
            let folder = create_folder(
                client,
                &root,
                folder_name,
                folder_description.as_deref(),
                folder_group.as_deref(),
            )
            .await?;
            output_single(&folder, cli.json)
        }
        Command::CreateGroup { group_name } => ensure_group(client, group_name).await,
        Command::UploadFile {
            upload_file,
            folder_name,
            description,
            access_level,
            reuse_newest_upload,
            summary,
        } => {
            let folder = resolve_folder(client, folder_name).await?;
            let reused = if *reuse_newest_upload {
                find_newest_upload(client, upload_file, &folder).await?
            } else {
                None
            };
            let upload = match reused {
                Some(upload) => upload,
                None => {
                    let description = if description.is_empty() {
                        "upload via foss-cli".to_string()
                    } else {
                        description.clone()
                    };
                    let options = UploadOptions {
                        description: Some(description),
                        access_level: Some(*access_level),
                        wait_time: UPLOAD_WAIT_SECS,
                        ..Default::default()
                    };
                    let source = UploadSource::File(upload_file.clone());
                    fossology::upload_file(client, &folder, &source, &options).await?
                }
            };
            output_single(&upload, cli.json)?;

            if *summary {
                let summary = upload_summary(client, &upload, None).await?;
                output_single(&summary, cli.json)?;
            }
            Ok(())
        }
        Command::DeleteFolder { folder_name } => {
            let folder = list_folders(client, None)
                .await?
                .into_iter()
                .find(|f| &f.name == folder_name)
                .ok_or_else(|| {
                    FossologyError::InvalidArgument(format!("Unable to find folder {folder_name}."))
                })?;
            delete_folder(client, &folder).await?;
            tracing::debug!(%folder, server = %client.host(), "Delete command was sent");
            Ok(())
        }
        Command::DeleteUpload { upload_name } => {
            let upload = Upload::list_all(client, &Default::default())
                .await?
                .into_iter()
                .find(|u| &u.upload_name == upload_name)
                .ok_or_else(|| {
                    FossologyError::InvalidArgument(format!("Unable to find upload {upload_name}."))
                })?;
            delete_upload(client, &upload, None).await?;
            tracing::debug!(%upload, server = %client.host(), "Delete command was sent");
            Ok(())
        }
        Command::StartWorkflow {
            file_name,
            folder_name,
            file_description,
            dry_run,
            reuse_newest_upload,
            reuse_newest_job,
            report_format,
            access_level,
        } => {
            let options = WorkflowOptions {
                folder_name: folder_name.clone(),
                file_description: file_description.clone(),
                dry_run: *dry_run,
                reuse_newest_upload: *reuse_newest_upload,
                reuse_newest_job: *reuse_newest_job,
                report_format: *report_format,
                access_level: *access_level,
                result_dir: cli.result_dir.clone(),
                ..Default::default()
            };
            let outcome = run_workflow(client, file_name, &options).await?;
            if cli.json {
                let summary = WorkflowSummary {
                    upload_id: outcome.upload.id,
                    job_id: outcome.job.id,
                    report_id: outcome.report_id,
                    report_path: outcome.report_path,
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Report written to {}", outcome.report_path.display());
            }
            Ok(())
        }
        Command::List {
            entity,
            page,
            page_size,
            all_pages,
        } => {
            let request = if *all_pages {
                PageRequest::all(page_size.unwrap_or(DEFAULT_PAGE_SIZE))
            } else {
                PageRequest::page(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
            };
            handle_list(client, *entity, &request, cli.json).await
        }
        Command::Config { .. } | Command::Log { .. } => Ok(()),
    }
}

async fn handle_config(
    server: String,
    username: &str,
    password: &str,
    token_scope: TokenScope,
    interactive: bool,
) -> fossology::Result<()> {
    let ConfigAnswers {
        server,
        username,
        password,
        token_scope,
    } = if interactive {
        prompt_config()?
    } else {
        ConfigAnswers {
            server,
            username: username.to_string(),
            password: password.to_string(),
            token_scope,
        }
    };

    tracing::warn!(%username, %server, scope = %token_scope, "Create a new config");

    let simple = uuid::Uuid::new_v4().simple().to_string();
    let token_name = format!("foss-cli-{}", &simple[..8]);
    let request = TokenRequest::new(&username, &password, &token_name, token_scope, None);
    let token = fossology_token(&server, &request).await?;

    let path = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    if path.exists() {
        tracing::info!(path = %path.display(), "Found existing config file, updating the values");
    }
    let config = CliConfig {
        fossology: ServerConfig {
            server_url: server,
            username,
            token,
        },
    };
    config.save(&path)?;
    tracing::warn!(path = %path.display(), "New config has been generated");
    Ok(())
}

async fn handle_list(
    client: &FossologyClient,
    entity: Entity,
    request: &PageRequest,
    json: bool,
) -> fossology::Result<()> {
    match entity {
        Entity::Folders => {
            let folders = list_folders(client, None).await?;
            output_items(&folders, json, |item| FolderRow::from(item))?;
        }
        Entity::Uploads => {
            let uploads = Upload::list(client, &Default::default(), request).await?;
            output_page(&uploads, json, |item| UploadRow::from(item))?;
        }
        Entity::Jobs => {
            let jobs = Job::list(client, &Default::default(), request).await?;
            output_page(&jobs, json, |item| JobRow::from(item))?;
        }
        Entity::Groups => {
            let groups = list_groups(client).await?;
            output_items(&groups, json, |item| GroupRow::from(item))?;
        }
        Entity::Licenses => {
            let licenses = License::list(client, &Default::default(), request).await?;
            output_page(&licenses, json, |item| LicenseRow::from(item))?;
        }
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> fossology::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_items<T, R, F>(items: &[T], json: bool, to_row: F) -> fossology::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn output_page<T, R, F>(page: &Page<T>, json: bool, to_row: F) -> fossology::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    output_items(&page.items, json, to_row)?;
    if !json {
        if page.has_more() {
            println!("\nPage {}/{} (more available)", page.page, page.total_pages);
        } else {
            println!("\nPage {}/{} ({} items)", page.page, page.total_pages, page.len());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct WorkflowSummary {
    upload_id: u64,
    job_id: u64,
    report_id: u64,
    report_path: PathBuf,
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct FolderRow {
    id: u64,
    name: String,
    parent: String,
    description: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            parent: f.parent.map(|p| p.to_string()).unwrap_or_default(),
            description: f.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct UploadRow {
    id: u64,
    name: String,
    folder: String,
    uploaded: String,
}

impl From<&Upload> for UploadRow {
    fn from(u: &Upload) -> Self {
        Self {
            id: u.id,
            name: u.upload_name.clone(),
            folder: u
                .folder_name
                .clone()
                .unwrap_or_else(|| u.folder_id.to_string()),
            uploaded: u.upload_date.clone(),
        }
    }
}

#[derive(Tabled)]
struct JobRow {
    id: u64,
    name: String,
    status: String,
    queued: String,
    upload: String,
}

impl From<&Job> for JobRow {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id,
            name: j.name.clone(),
            status: j.status.to_string(),
            queued: j.queue_date.clone(),
            upload: j.upload_id.map(|u| u.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    id: u64,
    name: String,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id,
            name: g.name.clone(),
        }
    }
}

#[derive(Tabled)]
struct LicenseRow {
    #[tabled(rename = "short name")]
    short_name: String,
    #[tabled(rename = "full name")]
    full_name: String,
    risk: String,
    candidate: bool,
}

impl From<&License> for LicenseRow {
    fn from(l: &License) -> Self {
        Self {
            short_name: l.short_name.clone(),
            full_name: l.full_name.clone().unwrap_or_default(),
            risk: l.risk.map(|r| r.to_string()).unwrap_or_default(),
            candidate: l.is_candidate,
        }
    }
}
