//! Action handler and output rendering for the s3presign CLI

use anyhow::Result;
use s3presign_core::{
    load_config, load_config_from, Action, ObjectRequest, PresignedPost, PresignedUrl, S3Client, Session,
    SignedArtifact, UploadReport, Uploader,
};
use std::path::PathBuf;

/// Output format
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parsed command line for one invocation
#[derive(Debug)]
pub struct ActionArgs {
    pub action: Action,
    pub bucket: String,
    pub object_name: String,
    pub local_file: Option<PathBuf>,
    pub expires: u64,
    pub config: Option<PathBuf>,
    pub output: OutputFormat,
}

/// Handle an upload or download action
pub async fn handle_action(args: ActionArgs) -> Result<()> {
    tracing::debug!(action = %args.action, bucket = %args.bucket, "handling action");

    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let request = ObjectRequest::new(args.bucket, &args.object_name, args.local_file, args.expires)?;

    let client = S3Client::new(&config)?;
    let uploader = Uploader::new()?;
    let session = Session::new(&client, &uploader, request);

    match session.authorize(args.action).await? {
        SignedArtifact::Download(presigned) => {
            match args.output {
                OutputFormat::Json => println!("{}", download_json(session.request(), &presigned)),
                OutputFormat::Text => println!("{}", presigned.url),
            }
        }
        SignedArtifact::Upload(post) => {
            // The form is shown before uploading so it stays usable if the upload fails
            if args.output == OutputFormat::Text {
                print!("{}", render_post(&post));
            }

            let upload = session.upload(&post).await;

            match (args.output, &upload) {
                (OutputFormat::Json, Ok(report)) => {
                    println!("{}", upload_json(session.request(), &post, report.as_ref(), None))
                }
                (OutputFormat::Json, Err(e)) => {
                    let error = e.to_string();
                    println!("{}", upload_json(session.request(), &post, None, Some(&error)))
                }
                (OutputFormat::Text, Ok(Some(report))) => print!("{}", render_report(report)),
                (OutputFormat::Text, _) => {}
            }

            upload?;
        }
    }

    Ok(())
}

/// Signed upload form as text
fn render_post(post: &PresignedPost) -> String {
    let mut out = format!("url: {}\nfields:\n", post.url);
    for (name, value) in &post.fields {
        out.push_str(&format!("    {}: {}\n", name, value));
    }
    out
}

/// Upload response as text; headers and body only for a rejected upload
fn render_report(report: &UploadReport) -> String {
    let mut out = format!("Upload response: {}\n", report);

    if !report.is_success() {
        out.push_str("Response headers:\n");
        for (name, value) in &report.headers {
            out.push_str(&format!("    {}: {}\n", name, value));
        }
        out.push_str(&format!("Response body:\n----\n{}\n", report.body));
    }

    out
}

fn download_json(request: &ObjectRequest, presigned: &PresignedUrl) -> serde_json::Value {
    serde_json::json!({
        "action": Action::Download.as_str(),
        "bucket": request.bucket(),
        "key": request.key(),
        "url": presigned.url,
        "expires_in": presigned.expires_in,
        "expires_at": presigned.expires_at.to_rfc3339(),
    })
}

/// Upload document; `error` is set when the upload step itself failed
fn upload_json(
    request: &ObjectRequest,
    post: &PresignedPost,
    report: Option<&UploadReport>,
    error: Option<&str>,
) -> serde_json::Value {
    let mut value = serde_json::json!({
        "action": Action::Upload.as_str(),
        "bucket": request.bucket(),
        "key": request.key(),
        "url": post.url,
        "fields": post.fields,
        "expires_in": request.expires().as_secs(),
        "expires_at": post.expires_at.to_rfc3339(),
        "upload": report,
    });
    if let Some(error) = error {
        value["error"] = serde_json::Value::from(error);
    }
    value
}
