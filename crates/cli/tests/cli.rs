use assert_cmd::Command;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Write an s3cmd config pointing at `host_base` and return its directory and path
fn write_config(host_base: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".s3cfg");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "[default]\naccess_key = AKIDEXAMPLE\nsecret_key = secret\nhost_base = {}\n",
        host_base
    )
    .unwrap();
    (dir, path)
}

/// Local S3 lookalike: every HEAD succeeds, POST `/b1` answers `reply`.
/// Returns the base URL and the number of POSTs received.
fn spawn_endpoint(reply: StatusCode) -> (String, Arc<AtomicUsize>) {
    let posts = Arc::new(AtomicUsize::new(0));
    let counter = posts.clone();
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route(
                    "/b1",
                    post(move |_body: Bytes| {
                        let counter = counter.clone();
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            if reply.is_success() {
                                (reply, "")
                            } else {
                                (reply, "<Error><Code>AccessDenied</Code></Error>")
                            }
                        }
                    })
                    .head(|| async { StatusCode::OK }),
                )
                .fallback(|| async { StatusCode::OK });

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    let addr = rx.recv().unwrap();
    (format!("http://{}", addr), posts)
}

fn s3presign() -> Command {
    let mut cmd = Command::cargo_bin("s3presign").unwrap();
    cmd.env_remove("S3CFG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_missing_config_is_fatal() {
    let home = tempfile::tempdir().unwrap();

    s3presign()
        .env("HOME", home.path())
        .args(["download", "-b", "b1", "-f", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_config_without_default_section_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s3cfg");
    std::fs::write(&path, "[other]\naccess_key = a\n").unwrap();

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["download", "-b", "b1", "-f", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[default]"));
}

#[test]
fn test_config_from_environment_variable() {
    let (_dir, path) = write_config("http://127.0.0.1:1");

    // Reachable config, unreachable endpoint: fails on the bucket check, not on loading
    s3presign()
        .env("S3CFG", &path)
        .args(["download", "-b", "b1", "-f", "a.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Bucket b1 does not exist"));
}

#[test]
fn test_config_flag_overrides_environment_variable() {
    let (base, _posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (_dir, path) = write_config(&base);

    s3presign()
        .env("S3CFG", "/nonexistent/s3cfg")
        .arg("--config")
        .arg(&path)
        .args(["download", "-b", "b1", "-f", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{}/b1/a.txt?", base)));
}

#[test]
fn test_unreachable_bucket_exits_with_status_one() {
    let (_dir, path) = write_config("http://127.0.0.1:1");

    s3presign()
        .arg("-c")
        .arg(&path)
        .args(["upload", "-b", "b1", "-f", "/a/b.txt"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error: Bucket b1 does not exist"));
}

#[test]
fn test_unknown_action_is_rejected() {
    s3presign()
        .args(["delete", "-b", "b1", "-f", "a.txt"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_expiration_is_rejected() {
    s3presign()
        .args(["download", "-b", "b1", "-f", "a.txt", "-e", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_download_prints_signed_url() {
    let (base, posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (_dir, path) = write_config(&base);

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["download", "-b", "b1", "--object-name", "/a/b.txt", "--expires", "60"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("{}/b1/a/b.txt?", base)))
        .stdout(predicate::str::contains("X-Amz-Expires=60"))
        .stdout(predicate::str::contains("X-Amz-Signature="));

    assert_eq!(posts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_download_default_expiration() {
    let (base, _posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (_dir, path) = write_config(&base);

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["download", "-b", "b1", "--file-path", "a/b.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("X-Amz-Expires=30"));
}

#[test]
fn test_download_json_output() {
    let (base, _posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (_dir, path) = write_config(&base);

    let output = s3presign()
        .arg("--config")
        .arg(&path)
        .args(["download", "-b", "b1", "-f", "/a/b.txt", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["bucket"], "b1");
    assert_eq!(value["key"], "a/b.txt");
    assert_eq!(value["expires_in"], 30);
}

#[test]
fn test_upload_without_local_file_only_prints_form() {
    let (base, posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (_dir, path) = write_config(&base);

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["upload", "-b", "b1", "-f", "/a/b.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("url: {}/b1\n", base)))
        .stdout(predicate::str::contains("    key: a/b.txt\n"))
        .stdout(predicate::str::contains("    x-amz-signature: "))
        .stdout(predicate::str::contains("Upload response").not());

    assert_eq!(posts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_upload_with_local_file() {
    let (base, posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (dir, path) = write_config(&base);
    let local = dir.path().join("b.txt");
    std::fs::write(&local, "hello").unwrap();

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["upload", "-b", "b1", "-f", "/a/b.txt", "-l"])
        .arg(&local)
        .assert()
        .success()
        .stdout(predicate::str::contains("Upload response: 204 No Content"))
        .stdout(predicate::str::contains("Response body:").not());

    assert_eq!(posts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rejected_upload_still_exits_zero() {
    let (base, posts) = spawn_endpoint(StatusCode::FORBIDDEN);
    let (dir, path) = write_config(&base);
    let local = dir.path().join("b.txt");
    std::fs::write(&local, "hello").unwrap();

    s3presign()
        .arg("--config")
        .arg(&path)
        .args(["upload", "-b", "b1", "-f", "a/b.txt", "--local-file"])
        .arg(&local)
        .assert()
        .success()
        .stdout(predicate::str::contains("Upload response: 403 Forbidden"))
        .stdout(predicate::str::contains("Response headers:"))
        .stdout(predicate::str::contains("----\n<Error><Code>AccessDenied</Code></Error>"));

    assert_eq!(posts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_upload_json_keeps_form_when_local_file_is_missing() {
    let (base, posts) = spawn_endpoint(StatusCode::NO_CONTENT);
    let (dir, path) = write_config(&base);

    let output = s3presign()
        .arg("--config")
        .arg(&path)
        .args(["upload", "-b", "b1", "-f", "a/b.txt", "-o", "json", "-l"])
        .arg(dir.path().join("missing.bin"))
        .output()
        .unwrap();
    assert!(!output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["url"], format!("{}/b1", base));
    assert_eq!(value["fields"]["key"], "a/b.txt");
    assert!(value["fields"]["x-amz-signature"].is_string());
    assert!(value["upload"].is_null());
    assert!(value["error"].is_string());

    assert_eq!(posts.load(Ordering::SeqCst), 0);
}
