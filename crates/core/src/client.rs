//! S3 client implementation using the AWS S3 SDK

use crate::config::S3Config;
use crate::error::Result;
use crate::presigned::{presign_post, PostPolicyRequest, PresignedPost};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{retry::RetryConfig, BehaviorVersion, Credentials, Region},
    presigning::PresigningConfig,
    Client,
};
use chrono::Utc;
use std::time::Duration;
use url::Url;

/// Storage operations a signing session depends on
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Succeeds when the bucket exists and is reachable with the configured credentials
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    /// Signed GET URL for `bucket`/`key`
    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String>;

    /// Signed POST form for `bucket`/`key`
    async fn presign_post(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<PresignedPost>;
}

/// S3 client bound to one endpoint and one set of credentials
pub struct S3Client {
    client: Client,
    endpoint: Url,
    access_key: String,
    secret_key: String,
    region: String,
}

impl S3Client {
    /// Create a new S3 client
    pub fn new(config: &S3Config) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let region = config.region().to_string();

        tracing::info!("Creating S3 client");
        tracing::debug!(endpoint = %endpoint, region = %region, "client configuration");

        let credentials = Credentials::new(&config.access_key, &config.secret_key, None, None, "s3cfg");

        // Path-style keeps the bucket in the URL path, which custom endpoints expect
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .region(Region::new(region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            endpoint,
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region,
        })
    }
}

#[async_trait]
impl StorageClient for S3Client {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.client.head_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in)?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await?;

        Ok(presigned_request.uri().to_string())
    }

    async fn presign_post(&self, bucket: &str, key: &str, expires_in: Duration) -> Result<PresignedPost> {
        let request = PostPolicyRequest {
            access_key: &self.access_key,
            secret_key: &self.secret_key,
            region: &self.region,
            bucket,
            key,
            expires_in,
        };

        presign_post(&self.endpoint, &request, Utc::now())
    }
}
