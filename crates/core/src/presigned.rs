//! Presigned artifacts and SigV4 POST policy signing
//!
//! Presigned GET URLs come straight from the SDK presigner. The SDK has no
//! presigned POST support, so upload forms are signed here following
//! <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-HTTPPOSTConstructPolicy.html>.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm advertised in the form fields
pub const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

const SERVICE: &str = "s3";
const LONG_DATETIME_FMT: &str = "%Y%m%dT%H%M%SZ";
const SHORT_DATE_FMT: &str = "%Y%m%d";
const EXPIRATION_FMT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Signed GET URL for a single object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

/// Signed POST descriptor: target URL plus the form fields to submit with the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    /// Policy expiration, fixed at signing time
    pub expires_at: DateTime<Utc>,
}

/// Artifact produced for an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedArtifact {
    Download(PresignedUrl),
    Upload(PresignedPost),
}

/// Inputs to a POST policy signature
#[derive(Debug, Clone)]
pub struct PostPolicyRequest<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub bucket: &'a str,
    pub key: &'a str,
    pub expires_in: Duration,
}

/// Sign a POST policy for `bucket`/`key`, valid from `now` for `expires_in`.
///
/// The returned URL is the path-style bucket URL under `endpoint`.
pub fn presign_post(endpoint: &Url, request: &PostPolicyRequest<'_>, now: DateTime<Utc>) -> Result<PresignedPost> {
    let url = bucket_url(endpoint, request.bucket)?;

    let expires_in = i64::try_from(request.expires_in.as_secs())
        .map_err(|_| Error::Presign("expiration out of range".to_string()))?;
    let expiration = now + chrono::Duration::seconds(expires_in);

    let amz_date = now.format(LONG_DATETIME_FMT).to_string();
    let short_date = now.format(SHORT_DATE_FMT).to_string();
    let credential = format!(
        "{}/{}",
        request.access_key,
        scope_string(&short_date, request.region)
    );

    let policy = serde_json::json!({
        "expiration": expiration.format(EXPIRATION_FMT).to_string(),
        "conditions": [
            { "bucket": request.bucket },
            { "key": request.key },
            { "x-amz-algorithm": SIGNING_ALGORITHM },
            { "x-amz-credential": credential },
            { "x-amz-date": amz_date },
        ],
    });
    let encoded_policy = STANDARD.encode(serde_json::to_vec(&policy)?);

    let signing_key = derive_signing_key(request.secret_key, &short_date, request.region, SERVICE)?;
    let signature = hex::encode(hmac_sha256(&signing_key, encoded_policy.as_bytes())?);

    let mut fields = BTreeMap::new();
    fields.insert("key".to_string(), request.key.to_string());
    fields.insert("x-amz-algorithm".to_string(), SIGNING_ALGORITHM.to_string());
    fields.insert("x-amz-credential".to_string(), credential);
    fields.insert("x-amz-date".to_string(), amz_date);
    fields.insert("policy".to_string(), encoded_policy);
    fields.insert("x-amz-signature".to_string(), signature);

    Ok(PresignedPost {
        url: url.to_string(),
        fields,
        expires_at: expiration,
    })
}

/// Path-style URL of a bucket
fn bucket_url(endpoint: &Url, bucket: &str) -> Result<Url> {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| Error::Presign(format!("Endpoint {} cannot carry a path", endpoint)))?
        .pop_if_empty()
        .push(bucket);
    Ok(url)
}

fn scope_string(short_date: &str, region: &str) -> String {
    format!("{}/{}/{}/aws4_request", short_date, region, SERVICE)
}

/// Derive the SigV4 signing key:
/// `HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
fn derive_signing_key(secret: &str, short_date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let secret = format!("AWS4{}", secret);
    let k_date = hmac_sha256(secret.as_bytes(), short_date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| Error::Presign(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
