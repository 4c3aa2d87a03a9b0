//! Destination and partial-file paths for a single download.
//!
//! A download is `NOT_STARTED` while neither file exists, `IN_PROGRESS` while
//! `<name>.partial` exists (its length is the resume offset), and `COMPLETE`
//! once the partial file has been renamed onto the destination. The
//! destination is only ever created by that rename.

use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use super::constants::PARTIAL_SUFFIX;
use super::error::DownloadError;

/// The pair of paths a download writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    destination: PathBuf,
    partial: PathBuf,
}

impl DownloadTarget {
    /// Derives the target from the last path segment of `url` inside `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] when the URL cannot be parsed or
    /// has no usable file name segment.
    pub fn from_url(url: &str, dest_dir: &Path) -> Result<Self, DownloadError> {
        let filename = filename_from_url(url)?;
        Ok(Self::new(dest_dir.join(filename)))
    }

    /// Builds the target for an explicit destination path.
    #[must_use]
    pub fn new(destination: PathBuf) -> Self {
        let mut partial = destination.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        Self {
            destination,
            partial: PathBuf::from(partial),
        }
    }

    /// Final path, created only by [`finalize`](Self::finalize).
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Staging path holding the bytes received so far.
    #[must_use]
    pub fn partial(&self) -> &Path {
        &self.partial
    }

    /// Creates the destination directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when the directory cannot be created.
    pub async fn ensure_parent(&self) -> Result<(), DownloadError> {
        let Some(parent) = self.destination.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))
    }

    /// Current size of the partial file, `0` when it does not exist.
    pub async fn resume_offset(&self) -> u64 {
        tokio::fs::metadata(&self.partial)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0)
    }

    /// Atomically renames the partial file onto the destination, replacing
    /// any file already there.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when the rename fails (for example when
    /// no partial file exists).
    pub async fn finalize(&self) -> Result<PathBuf, DownloadError> {
        tokio::fs::rename(&self.partial, &self.destination)
            .await
            .map_err(|e| DownloadError::io(self.partial.clone(), e))?;
        debug!(
            partial = %self.partial.display(),
            destination = %self.destination.display(),
            "finalized download"
        );
        Ok(self.destination.clone())
    }
}

/// Returns the decoded last path segment of `url`.
fn filename_from_url(url: &str) -> Result<String, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    let last = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| DownloadError::invalid_url(url))?;

    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    // Never let a decoded segment escape the destination directory.
    if decoded.contains('/') || decoded.contains('\\') || decoded == "." || decoded == ".." {
        return Err(DownloadError::invalid_url(url));
    }
    Ok(decoded)
}
