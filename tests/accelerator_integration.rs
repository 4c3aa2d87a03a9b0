//! Integration tests for the external accelerator path.
//!
//! A small shell script stands in for `aria2c`: it honors `--dir` and `--out`
//! and records its arguments so the invocation contract can be checked.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use fdroid_downloader::config::ClientConfig;
use fdroid_downloader::download::{DownloadError, Downloader, FetchStrategy, HttpClient};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Fake accelerator that writes `payload` to `<dir>/<out>` and logs its args.
fn fake_accelerator(bin_dir: &Path) -> (PathBuf, PathBuf) {
    let log = bin_dir.join("args.log");
    let body = format!(
        r#"printf '%s\n' "$@" > '{log}'
while [ $# -gt 0 ]; do
  case "$1" in
    --dir) dir="$2"; shift 2 ;;
    --out) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'payload' >> "$dir/$out"
"#,
        log = log.display()
    );
    (write_script(bin_dir, "fake-aria2c", &body), log)
}

fn downloader_with(program: &Path) -> Downloader {
    let config = ClientConfig::default();
    Downloader::new(
        HttpClient::new(&config).unwrap(),
        Some(program.display().to_string()),
    )
}

#[tokio::test]
async fn test_accelerator_is_selected_when_present() {
    let bin_dir = TempDir::new().unwrap();
    let (script, _) = fake_accelerator(bin_dir.path());

    let strategy = downloader_with(&script).select_strategy();

    match strategy {
        FetchStrategy::Accelerator(accelerator) => assert_eq!(accelerator.program(), script.as_path()),
        FetchStrategy::Http => panic!("Expected accelerator strategy"),
    }
}

#[tokio::test]
async fn test_accelerator_download_finalizes_partial() {
    let bin_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let (script, log) = fake_accelerator(bin_dir.path());
    let url = "https://f-droid.org/repo/org.example.app_5.apk";

    let final_path = downloader_with(&script)
        .download(url, out_dir.path())
        .await
        .unwrap();

    assert_eq!(final_path, out_dir.path().join("org.example.app_5.apk"));
    assert_eq!(std::fs::read(&final_path).unwrap(), b"payload");
    assert!(!out_dir.path().join("org.example.app_5.apk.partial").exists());

    let args = std::fs::read_to_string(log).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"--continue=true"), "{args:?}");
    assert!(args.contains(&"--allow-overwrite=true"), "{args:?}");
    assert!(args.contains(&"--file-allocation=none"), "{args:?}");
    assert!(args.contains(&"org.example.app_5.apk.partial"), "{args:?}");
    assert_eq!(args.last(), Some(&url));
}

#[tokio::test]
async fn test_accelerator_continues_existing_partial() {
    let bin_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let (script, _) = fake_accelerator(bin_dir.path());
    std::fs::write(out_dir.path().join("app.apk.partial"), b"pre-").unwrap();

    let final_path = downloader_with(&script)
        .download("https://f-droid.org/repo/app.apk", out_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(final_path).unwrap(), b"pre-payload");
}

#[tokio::test]
async fn test_accelerator_failure_reports_exit_code_and_keeps_partial() {
    let bin_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let script = write_script(bin_dir.path(), "failing-aria2c", "echo boom >&2\nexit 3\n");
    let partial = out_dir.path().join("app.apk.partial");
    std::fs::write(&partial, b"half").unwrap();

    let result = downloader_with(&script)
        .download("https://f-droid.org/repo/app.apk", out_dir.path())
        .await;

    match result {
        Err(DownloadError::AcceleratorFailed {
            program,
            exit_code,
            stderr,
        }) => {
            assert_eq!(program, "failing-aria2c");
            assert_eq!(exit_code, Some(3));
            assert_eq!(stderr, "boom");
        }
        other => panic!("Expected AcceleratorFailed, got: {other:?}"),
    }
    assert_eq!(std::fs::read(&partial).unwrap(), b"half");
    assert!(!out_dir.path().join("app.apk").exists());
}

#[tokio::test]
async fn test_missing_accelerator_falls_back_to_http() {
    let bin_dir = TempDir::new().unwrap();
    let missing = bin_dir.path().join("no-such-aria2c");

    let strategy = downloader_with(&missing).select_strategy();

    assert!(matches!(strategy, FetchStrategy::Http));
}
