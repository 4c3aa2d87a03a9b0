//! High-level client combining resolution and download.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::download::{DownloadError, Downloader, HttpClient};
use crate::resolver::{PackageInfo, PackageResolver, ResolveError, SearchResults};

/// Any failure while fetching one package.
#[derive(Debug, Error)]
pub enum FdroidError {
    /// Resolution or metadata scraping failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The APK transfer failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Client for one repository, sharing a single HTTP session between page
/// fetches and built-in downloads.
#[derive(Debug, Clone)]
pub struct FdroidClient {
    resolver: PackageResolver,
    downloader: Downloader,
}

impl FdroidClient {
    /// Builds a client and its HTTP session from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FdroidError::Download`] when the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, FdroidError> {
        let http = HttpClient::new(config)?;
        Ok(Self::with_http_client(config, http))
    }

    /// Builds a client around an existing HTTP session.
    #[must_use]
    pub fn with_http_client(config: &ClientConfig, http: HttpClient) -> Self {
        Self {
            resolver: PackageResolver::new(http.clone(), config),
            downloader: Downloader::new(http, config.accelerator.clone()),
        }
    }

    /// See [`PackageResolver::search_packages`].
    ///
    /// # Errors
    ///
    /// Returns [`FdroidError::Resolve`] when the search page cannot be loaded.
    pub async fn search_packages(&self, query: &str) -> Result<SearchResults, FdroidError> {
        Ok(self.resolver.search_packages(query).await?)
    }

    /// See [`PackageResolver::get_latest_apk_info`].
    ///
    /// # Errors
    ///
    /// Returns [`FdroidError::Resolve`] for not-found, ambiguous, and fetch failures.
    pub async fn get_latest_apk_info(
        &self,
        package: &str,
        search: bool,
    ) -> Result<PackageInfo, FdroidError> {
        Ok(self.resolver.get_latest_apk_info(package, search).await?)
    }

    /// Resolves `package` and downloads its newest APK into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FdroidError::Resolve`] or [`FdroidError::Download`]; a
    /// partially downloaded file is kept for the next attempt.
    #[instrument(skip(self, dest_dir), fields(package = %package, search))]
    pub async fn download_apk(
        &self,
        package: &str,
        dest_dir: &Path,
        search: bool,
    ) -> Result<PathBuf, FdroidError> {
        let info = self.get_latest_apk_info(package, search).await?;
        Ok(self.downloader.download(&info.download_url, dest_dir).await?)
    }
}
