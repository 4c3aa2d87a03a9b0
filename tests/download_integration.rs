//! Integration tests for the built-in HTTP download path.
//!
//! These tests drive the partial-file state machine against mock HTTP servers.

use std::path::Path;

use fdroid_downloader::config::ClientConfig;
use fdroid_downloader::download::{DownloadError, Downloader, HttpClient};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Downloader that never probes for an accelerator.
fn http_downloader() -> Downloader {
    let config = ClientConfig {
        trust_env: false,
        ..ClientConfig::default().without_accelerator()
    };
    Downloader::new(
        HttpClient::new(&config).expect("client should build"),
        config.accelerator,
    )
}

fn has_no_range_header(request: &Request) -> bool {
    !request.headers.contains_key("range")
}

fn partial_path(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{name}.partial"))
}

#[tokio::test]
async fn test_fresh_download_writes_final_file_and_removes_partial() {
    let mock_server = MockServer::start().await;
    let content = b"APK bytes for a fresh download".to_vec();
    Mock::given(method("GET"))
        .and(path("/repo/org.example.app_3.apk"))
        .and(has_no_range_header)
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let url = format!("{}/repo/org.example.app_3.apk", mock_server.uri());
    let result = http_downloader().download(&url, temp_dir.path()).await;

    let final_path = result.expect("download should succeed");
    assert_eq!(final_path, temp_dir.path().join("org.example.app_3.apk"));
    assert_eq!(std::fs::read(&final_path).unwrap(), content);
    assert!(!partial_path(temp_dir.path(), "org.example.app_3.apk").exists());
}

#[tokio::test]
async fn test_resume_appends_remaining_range() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .and(header("range", "bytes=6-"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"world".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let partial = partial_path(temp_dir.path(), "app.apk");
    std::fs::write(&partial, b"hello ").unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let final_path = http_downloader()
        .download(&url, temp_dir.path())
        .await
        .expect("resumed download should succeed");

    assert_eq!(final_path, temp_dir.path().join("app.apk"));
    assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    assert!(!partial.exists(), "partial file must be renamed away");
}

#[tokio::test]
async fn test_range_not_satisfiable_keeps_partial_bytes_and_finalizes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .and(header("range", "bytes=11-"))
        .respond_with(ResponseTemplate::new(416).set_body_bytes(b"ignored".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let partial = partial_path(temp_dir.path(), "app.apk");
    std::fs::write(&partial, b"hello world").unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let final_path = http_downloader()
        .download(&url, temp_dir.path())
        .await
        .expect("416 on resume means complete");

    assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    assert!(!partial.exists());
}

#[tokio::test]
async fn test_ignored_range_restarts_from_fresh_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"complete body".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let partial = partial_path(temp_dir.path(), "app.apk");
    std::fs::write(&partial, b"stale").unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let final_path = http_downloader()
        .download(&url, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&final_path).unwrap(), b"complete body");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("range").unwrap().to_str().unwrap(),
        "bytes=5-",
        "a resume must have been attempted"
    );
}

#[tokio::test]
async fn test_http_error_preserves_partial_and_skips_final_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let partial = partial_path(temp_dir.path(), "app.apk");
    std::fs::write(&partial, b"half").unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let result = http_downloader().download(&url, temp_dir.path()).await;

    match result {
        Err(DownloadError::HttpStatus { status, url: err_url }) => {
            assert_eq!(status, 503);
            assert!(err_url.ends_with("/repo/app.apk"));
        }
        other => panic!("Expected HttpStatus(503), got: {other:?}"),
    }
    assert_eq!(std::fs::read(&partial).unwrap(), b"half");
    assert!(!temp_dir.path().join("app.apk").exists());
}

#[tokio::test]
async fn test_range_not_satisfiable_without_partial_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .respond_with(ResponseTemplate::new(416))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let result = http_downloader().download(&url, temp_dir.path()).await;

    assert!(matches!(
        result,
        Err(DownloadError::HttpStatus { status: 416, .. })
    ));
    assert!(!temp_dir.path().join("app.apk").exists());
}

#[tokio::test]
async fn test_download_creates_missing_destination_directory() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("apks").join("nightly");

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let final_path = http_downloader().download(&url, &nested).await.unwrap();

    assert_eq!(final_path, nested.join("app.apk"));
    assert_eq!(std::fs::read(final_path).unwrap(), b"data");
}

#[tokio::test]
async fn test_download_replaces_existing_final_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/app.apk"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new release".to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("app.apk"), b"old release").unwrap();

    let url = format!("{}/repo/app.apk", mock_server.uri());
    let final_path = http_downloader()
        .download(&url, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(final_path).unwrap(), b"new release");
}

#[tokio::test]
async fn test_large_body_is_streamed_intact() {
    let mock_server = MockServer::start().await;
    // Several write chunks' worth of data with a non-repeating pattern.
    let content: Vec<u8> = (0..(3 * 128 * 1024 + 17)).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/repo/big.apk"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/repo/big.apk", mock_server.uri());
    let final_path = http_downloader()
        .download(&url, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(final_path).unwrap(), content);
}

#[tokio::test]
async fn test_network_error_preserves_partial() {
    // Bind then drop a server so the port refuses connections.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let temp_dir = TempDir::new().unwrap();
    let partial = partial_path(temp_dir.path(), "app.apk");
    std::fs::write(&partial, b"keep me").unwrap();

    let url = format!("{uri}/repo/app.apk");
    let result = http_downloader().download(&url, temp_dir.path()).await;

    assert!(
        matches!(
            result,
            Err(DownloadError::Network { .. } | DownloadError::Timeout { .. })
        ),
        "expected network failure, got {result:?}"
    );
    assert_eq!(std::fs::read(&partial).unwrap(), b"keep me");
}

/// Serves one response that promises `declared` bytes, sends `sent`, then closes.
async fn truncating_server(declared: usize, sent: usize) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&vec![b'x'; sent]).await.unwrap();
        socket.flush().await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_interrupted_transfer_keeps_received_bytes_in_partial() {
    let base = truncating_server(1_000_000, 50_000).await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{base}/repo/app.apk");
    let result = http_downloader().download(&url, temp_dir.path()).await;

    assert!(
        matches!(result, Err(DownloadError::Network { .. })),
        "expected an incomplete body error, got {result:?}"
    );
    let partial = partial_path(temp_dir.path(), "app.apk");
    assert_eq!(std::fs::metadata(&partial).unwrap().len(), 50_000);
    assert!(!temp_dir.path().join("app.apk").exists());
}
