//! Download engine: picks a fetch strategy and drives the partial-file state
//! machine to completion.
//!
//! # Overview
//!
//! Each call to [`Downloader::download`] probes for the accelerator and
//! chooses one of two [`FetchStrategy`] variants. Both write into the same
//! `<name>.partial` file, both resume from whatever it already holds, and
//! both finish with the same atomic rename onto `<name>`. A failure in
//! either path leaves the partial file behind for the next run.
//!
//! # Example
//!
//! ```no_run
//! use fdroid_downloader::config::ClientConfig;
//! use fdroid_downloader::download::{Downloader, HttpClient};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let downloader = Downloader::new(HttpClient::new(&config)?, config.accelerator.clone());
//! let path = downloader
//!     .download("https://f-droid.org/repo/org.fdroid.fdroid_1019050.apk", Path::new("."))
//!     .await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use super::accelerator::Accelerator;
use super::client::{FetchOutcome, HttpClient};
use super::error::DownloadError;
use super::target::DownloadTarget;

/// The two interchangeable ways of filling a partial file.
#[derive(Debug, Clone)]
pub enum FetchStrategy {
    /// Hand the transfer to an external accelerator process.
    Accelerator(Accelerator),
    /// Stream the body with the shared HTTP client.
    Http,
}

impl FetchStrategy {
    /// Short label used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accelerator(_) => "accelerator",
            Self::Http => "http",
        }
    }
}

/// Fetches download URLs into final files with resume support.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: HttpClient,
    accelerator: Option<String>,
}

impl Downloader {
    /// Creates a downloader using `http` for the built-in path.
    ///
    /// `accelerator` names the external program to probe for on each
    /// download; `None` always uses the built-in path.
    #[must_use]
    pub fn new(http: HttpClient, accelerator: Option<String>) -> Self {
        Self { http, accelerator }
    }

    /// Probes the system and returns the strategy the next download will use.
    #[must_use]
    pub fn select_strategy(&self) -> FetchStrategy {
        self.accelerator
            .as_deref()
            .and_then(Accelerator::probe)
            .map_or(FetchStrategy::Http, FetchStrategy::Accelerator)
    }

    /// Downloads `url` into `dest_dir`, returning the final path.
    ///
    /// The file name is the last path segment of `url`. `dest_dir` is created
    /// when missing. Bytes are staged in `<name>.partial`, which is renamed to
    /// `<name>` (replacing any existing file) only after the transfer
    /// succeeds. No retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for invalid URLs, transport or status
    /// failures, accelerator failures, and file system errors. The partial
    /// file is preserved in every failure case.
    #[instrument(skip(self, dest_dir), fields(url = %url, dest_dir = %dest_dir.display()))]
    pub async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        let target = DownloadTarget::from_url(url, dest_dir)?;
        target.ensure_parent().await?;
        self.fetch_with(&self.select_strategy(), url, &target).await
    }

    /// Runs one strategy against `target` and finalizes it on success.
    ///
    /// # Errors
    ///
    /// See [`download`](Self::download).
    pub async fn fetch_with(
        &self,
        strategy: &FetchStrategy,
        url: &str,
        target: &DownloadTarget,
    ) -> Result<PathBuf, DownloadError> {
        let resume_offset = target.resume_offset().await;
        debug!(
            strategy = strategy.name(),
            resume_offset,
            partial = %target.partial().display(),
            "starting fetch"
        );

        match strategy {
            FetchStrategy::Accelerator(accelerator) => {
                accelerator.fetch_to_partial(url, target.partial()).await?;
            }
            FetchStrategy::Http => match self
                .http
                .fetch_to_partial(url, target.partial(), resume_offset)
                .await?
            {
                FetchOutcome::Written { bytes, resumed } => {
                    debug!(bytes, resumed, "partial file updated");
                }
                FetchOutcome::AlreadyComplete { bytes } => {
                    debug!(bytes, "partial file already complete");
                }
            },
        }

        let path = target.finalize().await?;
        info!(path = %path.display(), strategy = strategy.name(), "download complete");
        Ok(path)
    }
}
