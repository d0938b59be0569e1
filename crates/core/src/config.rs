//! Configuration management for s3presign
//!
//! Credentials and the endpoint are read from an s3cmd-style INI file
//! (`~/.s3cfg`). Only the `default` section is consulted.

use crate::error::{Error, Result};
use dirs::home_dir;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration file name, relative to the home directory
const CONFIG_FILE: &str = ".s3cfg";

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "S3CFG";

/// Section holding the credentials
const DEFAULT_SECTION: &str = "default";

/// Region used when `bucket_location` is unset or `US`
const DEFAULT_REGION: &str = "us-east-1";

/// Storage endpoint and credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub access_key: String,
    pub secret_key: String,
    pub host_base: String,
    pub bucket_location: Option<String>,
    pub use_https: bool,
}

impl S3Config {
    /// Endpoint URL derived from `host_base`.
    ///
    /// A bare host gets a scheme prefixed according to `use_https`.
    pub fn endpoint_url(&self) -> Result<Url> {
        let host_base = self.host_base.trim().trim_end_matches('/');
        let raw = if host_base.contains("://") {
            host_base.to_string()
        } else {
            let scheme = if self.use_https { "https" } else { "http" };
            format!("{}://{}", scheme, host_base)
        };

        let url = Url::parse(&raw)
            .map_err(|e| Error::InvalidConfig(format!("Invalid host_base '{}': {}", self.host_base, e)))?;

        if url.host_str().is_none() {
            return Err(Error::InvalidConfig(format!(
                "host_base '{}' has no host",
                self.host_base
            )));
        }

        Ok(url)
    }

    /// Signing region
    pub fn region(&self) -> &str {
        match self.bucket_location.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REGION,
            Some(location) if location.eq_ignore_ascii_case("us") => DEFAULT_REGION,
            Some(location) => location,
        }
    }
}

/// Get the configuration file path.
///
/// `S3CFG` takes precedence over `~/.s3cfg`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(CONFIG_FILE))
}

/// Load configuration from the default location
pub fn load_config() -> Result<S3Config> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from a specific file
pub fn load_config_from(path: &Path) -> Result<S3Config> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), host_base = %config.host_base, "loaded configuration");

    Ok(config)
}

/// Parse the contents of an s3cmd configuration file
pub fn parse_config(content: &str) -> Result<S3Config> {
    let sections = parse_sections(content)?;

    let default = sections.get(DEFAULT_SECTION).ok_or_else(|| {
        Error::InvalidConfig(format!("No [{}] section in configuration", DEFAULT_SECTION))
    })?;

    let required = |key: &str| -> Result<String> {
        default.get(key).cloned().ok_or_else(|| {
            Error::InvalidConfig(format!("Missing '{}' in [{}] section", key, DEFAULT_SECTION))
        })
    };

    let use_https = match default.get("use_https") {
        Some(value) => parse_bool(value).ok_or_else(|| {
            Error::InvalidConfig(format!("Invalid boolean for use_https: '{}'", value))
        })?,
        None => true,
    };

    Ok(S3Config {
        access_key: required("access_key")?,
        secret_key: required("secret_key")?,
        host_base: required("host_base")?,
        bucket_location: default.get("bucket_location").cloned(),
        use_https,
    })
}

type Section = HashMap<String, String>;

fn parse_sections(content: &str) -> Result<HashMap<String, Section>> {
    let mut sections: HashMap<String, Section> = HashMap::new();
    let mut current: Option<String> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or_else(|| {
                Error::InvalidConfig(format!("Malformed section header on line {}", index + 1))
            })?;
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        // Whichever delimiter comes first separates key from value
        let (key, value) = line
            .find(['=', ':'])
            .map(|at| (&line[..at], &line[at + 1..]))
            .ok_or_else(|| Error::InvalidConfig(format!("Expected 'key = value' on line {}", index + 1)))?;

        let section = current.as_ref().ok_or_else(|| {
            Error::InvalidConfig(format!("Entry outside of any section on line {}", index + 1))
        })?;

        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_lowercase(), value.trim().to_string());
    }

    Ok(sections)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
