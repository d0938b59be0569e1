//! Multipart POST upload against a presigned form

use crate::error::Result;
use crate::presigned::PresignedPost;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Fixed timeout for the upload request
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Form field carrying the file content
const FILE_FIELD: &str = "file";

/// Outcome of an upload POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub status: u16,
    pub reason: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl UploadReport {
    /// Whether the storage service accepted the upload (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Display for UploadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} {}", self.status, reason),
            None => write!(f, "{}", self.status),
        }
    }
}

/// HTTP uploader for presigned POST forms
pub struct Uploader {
    http_client: Client,
}

impl Uploader {
    /// Create an uploader with the fixed request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    /// POST `local_file` to the presigned form.
    ///
    /// Every signed field is sent before the file part, which S3 requires.
    /// A non-2xx response is returned as a report, not an error.
    pub async fn upload(&self, post: &PresignedPost, object_name: &str, local_file: &Path) -> Result<UploadReport> {
        let file = File::open(local_file).await?;
        let length = file.metadata().await?.len();

        let content_type = mime_guess::from_path(local_file)
            .first_or_octet_stream()
            .to_string();
        tracing::debug!(size = length, content_type = %content_type, "streaming upload body");

        let mut form = Form::new();
        for (name, value) in &post.fields {
            form = form.text(name.clone(), value.clone());
        }

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(object_name.to_string())
            .mime_str(&content_type)?;
        form = form.part(FILE_FIELD, part);

        let response = self.http_client.post(&post.url).multipart(form).send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(UploadReport {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }
}
