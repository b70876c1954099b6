//! FOSSology API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Higher-level operations are implemented as traits on entity types and as
//! free functions in the model modules.

use std::env;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{FossologyError, Result};
use crate::poll::{Attempt, NOT_READY};
use crate::version::ServerVersion;

/// Server used when neither a flag, a config file nor `FOSS_SERVER` names one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost/repo";
const USER_AGENT: &str = concat!("fossology-rs/", env!("CARGO_PKG_VERSION"));

/// Header used to act on behalf of a specific group.
pub(crate) const GROUP_HEADER: &str = "groupName";

/// REST API generation exposed by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiVersion {
    /// `/api/v1`: pagination through `page`/`limit` headers.
    #[default]
    V1,
    /// `/api/v2`: pagination through `page`/`limit` query parameters.
    V2,
}

impl ApiVersion {
    fn path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "api/v1/",
            ApiVersion::V2 => "api/v2/",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V1 => f.write_str("v1"),
            ApiVersion::V2 => f.write_str("v2"),
        }
    }
}

/// Low-level FOSSology API client.
///
/// Holds the server URL, the bearer token and the server version learned at
/// connection time. The configuration is read-only once built.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use fossology::FossologyClient;
///
/// # async fn example() -> fossology::Result<()> {
/// // Offline construction, no request is sent
/// let client = FossologyClient::new("my-token", "http://fossology/repo")?;
///
/// // Or connect and learn the server version from /info
/// let client = FossologyClient::connect("my-token", "http://fossology/repo").await?;
/// println!("{:?}", client.server_version());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FossologyClient {
    http: Client,
    host: Arc<Url>,
    api_url: Arc<Url>,
    api_version: ApiVersion,
    server_version: Option<ServerVersion>,
    token: String,
}

impl fmt::Debug for FossologyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FossologyClient")
            .field("api_url", &self.api_url.as_str())
            .field("server_version", &self.server_version)
            .finish_non_exhaustive()
    }
}

impl FossologyClient {
    /// Create a client from environment variables.
    ///
    /// Uses `FOSS_TOKEN` for authentication and optionally `FOSS_SERVER` for
    /// the server URL (defaults to `http://localhost/repo`).
    ///
    /// # Errors
    ///
    /// Returns an error if `FOSS_TOKEN` is not set.
    pub fn from_env() -> Result<Self> {
        let token = env::var("FOSS_TOKEN").map_err(|_| {
            FossologyError::ConfigMissing("FOSS_TOKEN environment variable not set".to_string())
        })?;

        let server = env::var("FOSS_SERVER").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        Self::new(&token, &server)
    }

    /// Create a new client for `server_url` (e.g. `http://fossology/repo`).
    ///
    /// No request is sent; use [`FossologyClient::connect`] to also learn the
    /// server version.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL is invalid.
    pub fn new(token: &str, server_url: &str) -> Result<Self> {
        let host = parse_server_url(server_url)?;
        let api_url = host.join(ApiVersion::V1.path())?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(FossologyError::HttpError)?;

        Ok(Self {
            http,
            host: Arc::new(host),
            api_url: Arc::new(api_url),
            api_version: ApiVersion::V1,
            server_version: None,
            token: token.to_string(),
        })
    }

    /// Create a client and fetch `/info` to record the server's API version.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or `/info` cannot be fetched.
    pub async fn connect(token: &str, server_url: &str) -> Result<Self> {
        let client = Self::new(token, server_url)?;
        let info = crate::models::get_info(&client).await?;
        tracing::info!(
            server = %client.host(),
            version = %info.version,
            "Connected to FOSSology API"
        );
        Ok(client.with_server_version(info.version))
    }

    /// Switch the API generation used for all subsequent requests.
    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        // Both paths are static relative segments, so the join cannot fail.
        if let Ok(url) = self.host.join(version.path()) {
            self.api_url = Arc::new(url);
        }
        self
    }

    /// Record the server version used for endpoint gating.
    #[must_use]
    pub fn with_server_version(mut self, version: ServerVersion) -> Self {
        self.server_version = Some(version);
        self
    }

    /// The server URL (with trailing slash).
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// The API root, e.g. `http://fossology/repo/api/v1/`.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The configured API generation.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// The server version, if known.
    pub fn server_version(&self) -> Option<&ServerVersion> {
        self.server_version.as_ref()
    }

    /// Fail with [`FossologyError::Unsupported`] when the connected server is
    /// older than `minimum`. An unknown server version is assumed current.
    pub fn require_version(&self, minimum: &str, endpoint: &str) -> Result<()> {
        match &self.server_version {
            Some(version) => version.require(minimum, endpoint),
            None => Ok(()),
        }
    }

    /// Whether the server is known to be at least `minimum` (or its version is unknown).
    pub fn supports(&self, minimum: &str) -> bool {
        self.require_version(minimum, "").is_ok()
    }

    /// Build an authenticated request against the configured API root.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.api_url.join(path)?;
        Ok(self.http.request(method, url).bearer_auth(&self.token))
    }

    /// Attach the `page`/`limit` pagination fields the way the API generation expects.
    pub(crate) fn paged(&self, request: RequestBuilder, page: u32, limit: u32) -> RequestBuilder {
        match self.api_version {
            ApiVersion::V1 => request
                .header("page", page.to_string())
                .header("limit", limit.to_string()),
            ApiVersion::V2 => request.query(&[("page", page), ("limit", limit)]),
        }
    }

    /// Send a request, mapping transport failures.
    #[tracing::instrument(skip(self, request))]
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(FossologyError::HttpError)
    }

    /// Send a request and require the `ok` status.
    ///
    /// Any other status is converted with [`error_for`], using `describe` to
    /// produce the error description.
    pub(crate) async fn expect<D>(
        &self,
        request: RequestBuilder,
        ok: StatusCode,
        describe: D,
    ) -> Result<Response>
    where
        D: FnOnce(StatusCode) -> String,
    {
        let response = self.execute(request).await?;
        if response.status() == ok {
            return Ok(response);
        }
        Err(error_for(response, describe).await)
    }

    /// Run one attempt of a polled request and classify the outcome.
    ///
    /// `ok` parses into [`Attempt::Ready`], HTTP 503 into
    /// [`Attempt::NotReady`], everything else into [`Attempt::Failed`].
    pub(crate) async fn attempt<T, D, F, Fut>(
        &self,
        request: Result<RequestBuilder>,
        ok: StatusCode,
        describe: D,
        parse: F,
    ) -> Attempt<T>
    where
        D: FnOnce(StatusCode) -> String,
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let response = match request {
            Ok(request) => match self.execute(request).await {
                Ok(response) => response,
                Err(e) => return Attempt::Failed(e),
            },
            Err(e) => return Attempt::Failed(e),
        };

        let status = response.status();
        if status == ok {
            return match parse(response).await {
                Ok(value) => Attempt::Ready(value),
                Err(e) => Attempt::Failed(e),
            };
        }
        if status == NOT_READY {
            return Attempt::NotReady {
                retry_after: retry_after(response.headers()),
            };
        }
        Attempt::Failed(error_for(response, describe).await)
    }
}

/// Parse a JSON response body.
pub(crate) async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    Ok(response.json().await?)
}

/// Add the `groupName` header when a group is given.
pub(crate) fn with_group(request: RequestBuilder, group: Option<&str>) -> RequestBuilder {
    match group {
        Some(group) => request.header(GROUP_HEADER, group),
        None => request,
    }
}

/// Convert a failed response into a typed error.
///
/// 403 becomes [`FossologyError::Authorization`], 404
/// [`FossologyError::NotFound`], anything else [`FossologyError::ApiError`].
pub(crate) async fn error_for<D>(response: Response, describe: D) -> FossologyError
where
    D: FnOnce(StatusCode) -> String,
{
    let status = response.status();
    let description = describe(status);
    let message = extract_error_message(response, status).await;
    tracing::debug!(status = status.as_u16(), %description, %message, "Request failed");

    match status {
        StatusCode::FORBIDDEN => FossologyError::Authorization {
            description,
            message,
            status_code: status.as_u16(),
        },
        StatusCode::NOT_FOUND => FossologyError::NotFound {
            description,
            message,
        },
        _ => FossologyError::ApiError {
            description,
            message,
            status_code: status.as_u16(),
        },
    }
}

/// Extract the server's error message from a failed response.
async fn extract_error_message(response: Response, status: StatusCode) -> String {
    let body = match response.text().await {
        Ok(b) if !b.trim().is_empty() => b,
        _ => return format!("HTTP {status}"),
    };

    // Try to parse as JSON and extract message field
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
        if let Some(err) = json.get("error").and_then(|m| m.as_str()) {
            return err.to_string();
        }
    }

    body
}

/// Parse the advisory `Retry-After` delay in whole seconds.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Extract the file name from a `Content-Disposition` header.
pub(crate) fn attachment_name(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Parse a server URL, making sure it ends with a slash so joins append.
pub(crate) fn parse_server_url(server_url: &str) -> Result<Url> {
    if server_url.ends_with('/') {
        Ok(Url::parse(server_url)?)
    } else {
        Ok(Url::parse(&format!("{server_url}/"))?)
    }
}
