//! s3presign-core - Core library for s3presign
//!
//! This library issues time-limited presigned URLs and POST forms for
//! S3-compatible object storage, and optionally performs the upload with
//! the signed form.

pub mod client;
pub mod config;
pub mod error;
pub mod presigned;
pub mod request;
pub mod session;
pub mod upload;

// Re-export commonly used types
pub use client::{S3Client, StorageClient};
pub use config::{get_config_path, load_config, load_config_from, parse_config, S3Config};
pub use error::{Error, Result};
pub use presigned::{PresignedPost, PresignedUrl, SignedArtifact};
pub use request::{normalize_object_key, Action, ObjectRequest, DEFAULT_EXPIRES_SECS, MAX_EXPIRES_SECS};
pub use session::Session;
pub use upload::{UploadReport, Uploader, UPLOAD_TIMEOUT};
