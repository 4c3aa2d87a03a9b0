//! HTTP client wrapper shared by page fetches and streamed APK downloads.
//!
//! One `HttpClient` is built per run and cloned wherever it is needed; clones
//! share the underlying connection pool and cookie store.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, RANGE};
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use super::constants::CHUNK_SIZE;
use super::error::DownloadError;
use crate::config::ClientConfig;
use crate::user_agent;

/// HTTP client for repository pages and streaming downloads.
///
/// # Example
///
/// ```no_run
/// use fdroid_downloader::config::ClientConfig;
/// use fdroid_downloader::download::HttpClient;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&ClientConfig::default())?;
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// How a streamed fetch left the partial file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body bytes were written to the partial file.
    Written {
        /// Bytes written by this fetch.
        bytes: u64,
        /// Whether the bytes were appended to an existing partial file.
        resumed: bool,
    },
    /// The server answered 416 to a ranged request; the partial file already
    /// holds every byte the server can offer.
    AlreadyComplete {
        /// Size of the untouched partial file.
        bytes: u64,
    },
}

impl HttpClient {
    /// Builds the shared client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] when reqwest rejects the
    /// configuration (for example when no TLS backend can be initialized).
    pub fn new(config: &ClientConfig) -> Result<Self, DownloadError> {
        let client = base_client_builder(config)
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Wraps an already configured reqwest client.
    ///
    /// The caller owns the session settings (cookies, proxies, timeouts);
    /// every page fetch and built-in download goes through this client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a text page with a total request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] for non-success responses and
    /// [`DownloadError::Network`]/[`DownloadError::Timeout`] for transport failures.
    #[instrument(level = "debug", skip(self, timeout), fields(url = %url))]
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadError::network(url, e))
    }

    /// Streams `url` into `partial`, resuming from `resume_from` bytes.
    ///
    /// `resume_from` is the current length of the partial file. When it is
    /// non-zero a `Range: bytes=<resume_from>-` request is sent
    /// and the body is appended. A 416 reply to that request means the
    /// partial file is already complete and nothing is written. A 200 reply
    /// means the server ignored the range, so the partial file is truncated
    /// and rewritten from the fresh body.
    ///
    /// Each received chunk is written to the partial file as it arrives, and
    /// the file is flushed before returning on failure, so the next call
    /// resumes after every byte already received.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for transport failures, unexpected HTTP
    /// statuses, and file system errors.
    #[instrument(skip(self, partial), fields(url = %url, partial = %partial.display()))]
    pub async fn fetch_to_partial(
        &self,
        url: &str,
        partial: &Path,
        resume_from: u64,
    ) -> Result<FetchOutcome, DownloadError> {
        let mut request = self.client.get(url).header(ACCEPT_ENCODING, "identity");
        if resume_from > 0 {
            debug!(resume_from, "requesting remaining byte range");
            request = request.header(RANGE, format!("bytes={resume_from}-"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        let status = response.status();

        if resume_from > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            info!(bytes = resume_from, "server reports partial file already complete");
            return Ok(FetchOutcome::AlreadyComplete { bytes: resume_from });
        }
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let append = resume_from > 0 && status == StatusCode::PARTIAL_CONTENT;
        if resume_from > 0 && !append {
            debug!(status = status.as_u16(), "server ignored range request; restarting download");
        }

        let file = open_partial(partial, append).await?;
        let bytes = stream_to_file(file, response, url, partial).await?;

        info!(bytes, resumed = append, "body transfer complete");
        Ok(FetchOutcome::Written {
            bytes,
            resumed: append,
        })
    }
}

async fn open_partial(partial: &Path, append: bool) -> Result<File, DownloadError> {
    let mut options = OpenOptions::new();
    if append {
        options.create(true).append(true);
    } else {
        options.create(true).write(true).truncate(true);
    }
    options
        .open(partial)
        .await
        .map_err(|e| DownloadError::io(partial, e))
}

/// Streams the response body to file, returning bytes written.
///
/// The file is flushed on every exit path; bytes received before a
/// transport error stay in the partial file.
async fn stream_to_file(
    mut file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    file.set_max_buf_size(CHUNK_SIZE);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    let transfer = loop {
        let chunk = match stream.next().await {
            None => break Ok(()),
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => break Err(DownloadError::network(url, e)),
        };
        if chunk.is_empty() {
            continue;
        }
        if let Err(e) = file.write_all(&chunk).await {
            break Err(DownloadError::io(file_path, e));
        }
        bytes_written += chunk.len() as u64;
    };

    let flushed = file
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e));
    if let Err(error) = transfer {
        warn!(bytes_written, %error, "transfer interrupted; partial file kept for resume");
        return Err(error);
    }
    flushed?;

    Ok(bytes_written)
}

fn base_client_builder(config: &ClientConfig) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.download_read_timeout)
        .gzip(true)
        .cookie_store(true)
        .user_agent(user_agent::default_user_agent());
    if !config.trust_env {
        builder = builder.no_proxy();
    }
    builder
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_default_config() {
        assert!(HttpClient::new(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_client_builds_without_env_proxies() {
        let config = ClientConfig {
            trust_env: false,
            ..ClientConfig::default()
        };
        assert!(HttpClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_open_partial_truncates_when_not_appending() {
        let temp = tempfile::TempDir::new().unwrap();
        let partial = temp.path().join("app.apk.partial");
        std::fs::write(&partial, b"stale bytes").unwrap();

        let mut file = open_partial(&partial, false).await.unwrap();
        file.write_all(b"fresh").await.unwrap();
        file.flush().await.unwrap();

        assert_eq!(std::fs::read(&partial).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_open_partial_appends_when_resuming() {
        let temp = tempfile::TempDir::new().unwrap();
        let partial = temp.path().join("app.apk.partial");
        std::fs::write(&partial, b"hello ").unwrap();

        let mut file = open_partial(&partial, true).await.unwrap();
        file.write_all(b"world").await.unwrap();
        file.flush().await.unwrap();

        assert_eq!(std::fs::read(&partial).unwrap(), b"hello world");
    }
}
