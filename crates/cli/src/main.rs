use anyhow::Result;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;
use color_eyre::config::HookBuilder;
use s3presign_core::{Action, Error, DEFAULT_EXPIRES_SECS, MAX_EXPIRES_SECS};
use std::path::PathBuf;

mod handlers;

use handlers::{ActionArgs, OutputFormat};

/// s3presign - presigned S3 URLs for uploads and downloads
#[derive(Parser, Debug)]
#[command(name = "s3presign")]
#[command(version)]
#[command(about = "Generate time-limited presigned URLs for S3 uploads and downloads", long_about = None)]
struct Cli {
    /// Action to perform
    #[arg(value_parser = PossibleValuesParser::new(["upload", "download"]).try_map(|s| s.parse::<Action>()))]
    action: Action,

    /// Bucket name
    #[arg(short, long, value_name = "bucket-name")]
    bucket: String,

    /// S3 destination object name (file path)
    #[arg(short = 'f', long = "file-path", visible_alias = "object-name", value_name = "file-path")]
    object_name: String,

    /// Local source file to upload
    #[arg(short, long, value_name = "file")]
    local_file: Option<PathBuf>,

    /// URL expiration in seconds
    #[arg(
        short,
        long,
        value_name = "seconds",
        default_value_t = DEFAULT_EXPIRES_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_EXPIRES_SECS)
    )]
    expires: u64,

    /// Configuration file (defaults to $S3CFG, then ~/.s3cfg)
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Log to stderr so stdout carries only the signed artifact
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,s3presign=info,s3presign_core=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging();

    let args = ActionArgs {
        action: cli.action,
        bucket: cli.bucket,
        object_name: cli.object_name,
        local_file: cli.local_file,
        expires: cli.expires,
        config: cli.config,
        output: cli.output,
    };

    let result = handlers::handle_action(args).await;

    if let Err(err) = &result {
        if let Some(Error::BucketNotFound(_)) = err.downcast_ref::<Error>() {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }

    result
}
