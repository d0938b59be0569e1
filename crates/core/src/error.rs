//! Error types for s3presign-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for s3presign-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for s3presign-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Bucket existence check failed
    #[error("Bucket {0} does not exist")]
    BucketNotFound(String),

    /// S3 operation errors
    #[error("S3 operation failed: {0}")]
    S3Operation(String),

    /// Presigning errors
    #[error("Presigning failed: {0}")]
    Presign(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

// Generic SdkError conversion for all S3 operations
impl<E> From<aws_sdk_s3::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_s3::error::SdkError<E>) -> Self {
        use aws_sdk_s3::error::DisplayErrorContext;
        Error::S3Operation(DisplayErrorContext(&err).to_string())
    }
}

impl From<aws_sdk_s3::presigning::PresigningConfigError> for Error {
    fn from(err: aws_sdk_s3::presigning::PresigningConfigError) -> Self {
        Error::Presign(err.to_string())
    }
}
