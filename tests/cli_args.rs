//! CLI argument parsing tests
//!
//! These tests pin the foss-cli interface, including the snake_case
//! spellings accepted for every subcommand and option.

use std::path::PathBuf;

use clap::Parser;
use fossology::cli::{Cli, Command, Entity};
use fossology::{AccessLevel, ReportFormat, TokenScope};

#[test]
fn test_cli_parses_start_workflow_defaults() {
    let cli = Cli::parse_from(["foss-cli", "start-workflow", "base-files_11.tar.xz"]);

    assert!(!cli.json);
    match cli.command {
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
            assert_eq!(file_name, PathBuf::from("base-files_11.tar.xz"));
            assert_eq!(folder_name, "");
            assert_eq!(file_description, "Upload via foss-cli");
            assert!(!dry_run);
            assert!(!reuse_newest_upload);
            assert!(!reuse_newest_job);
            assert_eq!(report_format, ReportFormat::UnifiedReport);
            assert_eq!(access_level, AccessLevel::Protected);
        }
        _ => panic!("Expected StartWorkflow command"),
    }
}

#[test]
fn test_snake_case_spellings() {
    let cli = Cli::parse_from([
        "foss-cli",
        "start_workflow",
        "a.zip",
        "--folder_name",
        "Scans",
        "--reuse_newest_upload",
        "--reuse_newest_job",
        "--report_format",
        "spdx2",
    ]);

    match cli.command {
        Command::StartWorkflow {
            folder_name,
            reuse_newest_upload,
            reuse_newest_job,
            report_format,
            ..
        } => {
            assert_eq!(folder_name, "Scans");
            assert!(reuse_newest_upload);
            assert!(reuse_newest_job);
            assert_eq!(report_format, ReportFormat::Spdx2);
        }
        _ => panic!("Expected StartWorkflow command"),
    }

    let cli = Cli::parse_from(["foss-cli", "create_folder", "Scans"]);
    assert!(matches!(cli.command, Command::CreateFolder { .. }));
}

#[test]
fn test_upload_file_defaults() {
    let cli = Cli::parse_from(["foss-cli", "upload-file", "a.zip", "--summary"]);

    match cli.command {
        Command::UploadFile {
            upload_file,
            folder_name,
            access_level,
            summary,
            reuse_newest_upload,
            ..
        } => {
            assert_eq!(upload_file, PathBuf::from("a.zip"));
            assert_eq!(folder_name, "");
            assert_eq!(access_level, AccessLevel::Public);
            assert!(summary);
            assert!(!reuse_newest_upload);
        }
        _ => panic!("Expected UploadFile command"),
    }
}

#[test]
fn test_config_defaults_and_no_interactive() {
    let cli = Cli::parse_from(["foss-cli", "config"]);
    match cli.command {
        Command::Config {
            username,
            password,
            token_scope,
            interactive,
        } => {
            assert_eq!(username, "fossy");
            assert_eq!(password, "fossy");
            assert_eq!(token_scope, TokenScope::Read);
            assert!(interactive);
        }
        _ => panic!("Expected Config command"),
    }

    let cli = Cli::parse_from([
        "foss-cli",
        "--server",
        "http://localhost/repo",
        "config",
        "--no-interactive",
        "--token_scope",
        "write",
    ]);
    assert_eq!(cli.server.as_deref(), Some("http://localhost/repo"));
    match cli.command {
        Command::Config {
            token_scope,
            interactive,
            ..
        } => {
            assert_eq!(token_scope, TokenScope::Write);
            assert!(!interactive);
        }
        _ => panic!("Expected Config command"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["foss-cli", "list", "uploads", "--json", "-t", "abc", "-vv"]);
    assert!(cli.json);
    assert_eq!(cli.token.as_deref(), Some("abc"));
    assert_eq!(cli.verbose, 2);
    assert!(cli.needs_client());
}

#[test]
fn test_logging_options() {
    let cli = Cli::parse_from(["foss-cli", "log"]);
    assert!(!cli.log_to_file);
    assert_eq!(cli.log_file_name, ".foss_cli.log");
    assert_eq!(cli.result_dir, PathBuf::from(".foss_cli_results"));

    let cli = Cli::parse_from([
        "foss-cli",
        "--log_to_file",
        "--log_file_name",
        "run.log",
        "--no-log-to-console",
        "--log-to-console",
        "log",
        "--log_level",
        "2",
        "--message_text",
        "hello",
    ]);
    assert!(cli.log_to_file);
    assert_eq!(cli.log_file_name, "run.log");
    // the last of the two console flags wins
    assert!(cli.console_logging());
    match cli.command {
        Command::Log {
            log_level,
            message_text,
        } => {
            assert_eq!(log_level, 2);
            assert_eq!(message_text, "hello");
        }
        _ => panic!("Expected Log command"),
    }
}

#[test]
fn test_list_pagination_args() {
    let cli = Cli::parse_from([
        "foss-cli",
        "list",
        "uploads",
        "--page",
        "2",
        "--page_size",
        "50",
    ]);

    match cli.command {
        Command::List {
            entity,
            page,
            page_size,
            all_pages,
        } => {
            assert_eq!(entity, Entity::Uploads);
            assert_eq!(page, Some(2));
            assert_eq!(page_size, Some(50));
            assert!(!all_pages);
        }
        _ => panic!("Expected List command"),
    }
}

#[test]
fn test_entity_variants() {
    let cli = Cli::parse_from(["foss-cli", "list", "folder"]);
    assert!(matches!(cli.command, Command::List { entity: Entity::Folders, .. }));

    let cli = Cli::parse_from(["foss-cli", "list", "jobs", "--all-pages"]);
    assert!(matches!(
        cli.command,
        Command::List { entity: Entity::Jobs, all_pages: true, .. }
    ));

    let cli = Cli::parse_from(["foss-cli", "list", "group"]);
    assert!(matches!(cli.command, Command::List { entity: Entity::Groups, .. }));

    let cli = Cli::parse_from(["foss-cli", "list", "licenses"]);
    assert!(matches!(cli.command, Command::List { entity: Entity::Licenses, .. }));
}

#[test]
fn test_unknown_report_format_is_rejected() {
    let result = Cli::try_parse_from([
        "foss-cli",
        "start-workflow",
        "a.zip",
        "--report-format",
        "pdf",
    ]);
    assert!(result.is_err());
}
