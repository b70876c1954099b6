//! Server version parsing and endpoint gating.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FossologyError, Result};

/// Upload listing honours `page`/`limit` from this version on.
pub const UPLOAD_PAGINATION_SINCE: &str = "1.0.16";

/// The `/groups` endpoints exist from this version on.
pub const GROUPS_SINCE: &str = "1.2.1";

/// The `/license` endpoints exist from this version on.
pub const LICENSES_SINCE: &str = "1.1.3";

/// A dotted API version such as `1.2.1`.
///
/// Versions compare component by component as integers; missing trailing
/// components count as zero, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion {
    parts: Vec<u32>,
}

impl ServerVersion {
    /// Returns true if this version is at least `minimum`.
    pub fn at_least(&self, minimum: &ServerVersion) -> bool {
        self >= minimum
    }

    /// Fail with [`FossologyError::Unsupported`] if this version is below `minimum`.
    pub fn require(&self, minimum: &str, endpoint: &str) -> Result<()> {
        let minimum: ServerVersion = minimum.parse()?;
        if self.at_least(&minimum) {
            Ok(())
        } else {
            Err(FossologyError::Unsupported(format!(
                "Endpoint {endpoint} is not supported by your FOSSology API version {self}"
            )))
        }
    }

    fn component(&self, idx: usize) -> u32 {
        self.parts.get(idx).copied().unwrap_or(0)
    }
}

impl PartialEq for ServerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl FromStr for ServerVersion {
    type Err = FossologyError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('v');
        if trimmed.is_empty() {
            return Err(FossologyError::InvalidArgument(format!(
                "invalid server version '{s}'"
            )));
        }
        let parts = trimmed
            .split('.')
            .map(|p| {
                p.parse::<u32>().map_err(|_| {
                    FossologyError::InvalidArgument(format!("invalid server version '{s}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parts })
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = FossologyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ServerVersion> for String {
    fn from(v: ServerVersion) -> Self {
        v.to_string()
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}
