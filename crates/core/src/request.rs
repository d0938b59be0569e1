//! Action and request parameters

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default expiration of a signed artifact, in seconds
pub const DEFAULT_EXPIRES_SECS: u64 = 30;

/// Longest expiration SigV4 accepts for presigned requests (7 days)
pub const MAX_EXPIRES_SECS: u64 = 604_800;

/// Operation a signed artifact authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    Download,
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Upload => "upload",
            Action::Download => "download",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upload" => Ok(Action::Upload),
            "download" => Ok(Action::Download),
            other => Err(Error::InvalidInput(format!(
                "Unknown action '{}' (expected upload or download)",
                other
            ))),
        }
    }
}

/// Strip every leading `/` from an object name
pub fn normalize_object_key(object_name: &str) -> &str {
    object_name.trim_start_matches('/')
}

/// Validated parameters for a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRequest {
    bucket: String,
    key: String,
    local_file: Option<PathBuf>,
    expires: Duration,
}

impl ObjectRequest {
    /// Build a request, normalizing the object key and checking the expiration
    pub fn new(
        bucket: impl Into<String>,
        object_name: &str,
        local_file: Option<PathBuf>,
        expires_secs: u64,
    ) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(Error::InvalidInput("Bucket name cannot be empty".to_string()));
        }

        let key = normalize_object_key(object_name);
        if key.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Object name '{}' is empty once leading slashes are removed",
                object_name
            )));
        }

        if expires_secs == 0 {
            return Err(Error::InvalidInput("Expiration must be a positive number of seconds".to_string()));
        }
        if expires_secs > MAX_EXPIRES_SECS {
            return Err(Error::InvalidInput(format!(
                "Expiration cannot exceed 7 days ({} seconds)",
                MAX_EXPIRES_SECS
            )));
        }

        Ok(Self {
            bucket,
            key: key.to_string(),
            local_file,
            expires: Duration::from_secs(expires_secs),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Storage key, never starting with `/`
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn local_file(&self) -> Option<&PathBuf> {
        self.local_file.as_ref()
    }

    pub fn expires(&self) -> Duration {
        self.expires
    }
}
