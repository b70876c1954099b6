//! FOSSology API client library.
//!
//! A Rust library for the FOSSology REST API. Single entities and listings
//! are fetched through the [`Get`] and [`List`] traits implemented by the
//! entity types; every other endpoint is a free function taking a
//! [`FossologyClient`].
//!
//! # Quick Start
//!
//! ```no_run
//! use fossology::{FossologyClient, Folder, Get, List, Upload, PageRequest};
//!
//! #[tokio::main]
//! async fn main() -> fossology::Result<()> {
//!     // Create client from environment variables and learn the server version
//!     let client = FossologyClient::from_env()?;
//!     let info = fossology::get_info(&client).await?;
//!     let client = client.with_server_version(info.version);
//!
//!     // Get a folder by ID
//!     let folder = Folder::get(&client, 1).await?;
//!     println!("Folder: {folder}");
//!
//!     // List every upload, page by page
//!     let uploads = Upload::list(&client, &Default::default(), &PageRequest::all(100)).await?;
//!     println!("Found {} uploads", uploads.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Long-running server work
//!
//! Unpacking, analysis and report generation happen on the server. Endpoints
//! whose results are not ready yet answer `503 Service Unavailable` with a
//! `Retry-After` header; those endpoints are driven by [`poll::poll`] with a
//! bounded number of attempts. Jobs are waited for with
//! [`detail_job`], which re-checks once after a fixed delay.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `FOSS_TOKEN` (required) - Bearer token, see [`fossology_token`]
//! - `FOSS_SERVER` (optional) - Server URL (defaults to `http://localhost/repo`)

mod client;
mod error;
mod models;
mod pagination;
mod traits;

pub mod cli;
pub mod output;
pub mod poll;
pub mod version;
pub mod workflow;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::{ApiVersion, FossologyClient, DEFAULT_SERVER_URL};
pub use error::{FossologyError, Result};
pub use output::PrettyPrint;
pub use pagination::{
    paginate, Page, PageRequest, PageResponse, DEFAULT_PAGE_SIZE, TOTAL_PAGES_HEADER,
};
pub use version::ServerVersion;

// Re-export traits
pub use traits::{Get, List};

// Re-export models
pub use models::*;
