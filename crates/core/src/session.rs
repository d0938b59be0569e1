//! One signing session: bucket check, signing call, optional upload

use crate::client::StorageClient;
use crate::error::{Error, Result};
use crate::presigned::{PresignedPost, PresignedUrl, SignedArtifact};
use crate::request::{Action, ObjectRequest};
use crate::upload::{UploadReport, Uploader};
use chrono::Utc;

/// Binds a storage client and uploader to a single validated request
pub struct Session<'a, C: StorageClient + ?Sized> {
    client: &'a C,
    uploader: &'a Uploader,
    request: ObjectRequest,
}

impl<'a, C: StorageClient + ?Sized> Session<'a, C> {
    pub fn new(client: &'a C, uploader: &'a Uploader, request: ObjectRequest) -> Self {
        Self {
            client,
            uploader,
            request,
        }
    }

    pub fn request(&self) -> &ObjectRequest {
        &self.request
    }

    /// Check the bucket, then issue exactly one signing call for `action`.
    ///
    /// Any bucket check failure becomes [`Error::BucketNotFound`] and stops
    /// the session before signing.
    pub async fn authorize(&self, action: Action) -> Result<SignedArtifact> {
        let bucket = self.request.bucket();
        let key = self.request.key();
        let expires = self.request.expires();

        if let Err(e) = self.client.head_bucket(bucket).await {
            tracing::debug!(bucket = %bucket, error = %e, "bucket check failed");
            return Err(Error::BucketNotFound(bucket.to_string()));
        }

        match action {
            Action::Download => {
                if let Some(local_file) = self.request.local_file() {
                    tracing::debug!(local_file = %local_file.display(), "local file ignored for download");
                }
                tracing::info!("Creating signed download URL");
                let issued_at = Utc::now();
                let url = self.client.presign_get(bucket, key, expires).await?;
                let lifetime = chrono::Duration::from_std(expires)
                    .map_err(|e| Error::Presign(e.to_string()))?;
                Ok(SignedArtifact::Download(PresignedUrl {
                    url,
                    expires_in: expires.as_secs(),
                    expires_at: issued_at + lifetime,
                }))
            }
            Action::Upload => {
                tracing::info!("Creating signed upload parameters");
                let post = self.client.presign_post(bucket, key, expires).await?;
                Ok(SignedArtifact::Upload(post))
            }
        }
    }

    /// Send the local file through the signed form.
    ///
    /// Returns `None`, without any HTTP traffic, when no local file was requested.
    pub async fn upload(&self, post: &PresignedPost) -> Result<Option<UploadReport>> {
        let Some(local_file) = self.request.local_file() else {
            return Ok(None);
        };

        tracing::info!(
            "Uploading {} to {} as {}",
            local_file.display(),
            self.request.bucket(),
            self.request.key()
        );

        let report = self.uploader.upload(post, self.request.key(), local_file).await?;
        if report.is_success() {
            tracing::debug!(status = report.status, "upload accepted");
        } else {
            tracing::warn!(status = report.status, "upload rejected");
        }

        Ok(Some(report))
    }
}
