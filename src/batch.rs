//! Sequential processing of several requested packages.
//!
//! Packages are handled strictly one after another. The first failure stops
//! the batch; files completed before it stay on disk.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::fdroid::{FdroidClient, FdroidError};
use crate::resolver::PackageInfo;

/// Why a batch stopped early.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        /// Requested output directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A package failed; the remaining packages were not attempted.
    #[error("failed to process '{package}' ({} earlier package(s) completed): {source}", .completed.len())]
    Package {
        /// The package or query that failed.
        package: String,
        /// Final paths (or resolved infos) finished before the failure.
        completed: Vec<String>,
        /// The underlying failure.
        #[source]
        source: FdroidError,
    },
}

impl BatchError {
    fn package(package: &str, completed: Vec<String>, source: FdroidError) -> Self {
        Self::Package {
            package: package.to_string(),
            completed,
            source,
        }
    }
}

/// Downloads each package into `dest_dir`, in order.
///
/// # Errors
///
/// Returns [`BatchError::OutputDir`] when `dest_dir` cannot be created and
/// [`BatchError::Package`] for the first package that fails.
pub async fn download_packages(
    client: &FdroidClient,
    packages: &[String],
    dest_dir: &Path,
    search: bool,
) -> Result<Vec<PathBuf>, BatchError> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|source| BatchError::OutputDir {
            path: dest_dir.to_path_buf(),
            source,
        })?;

    let mut downloaded = Vec::with_capacity(packages.len());
    for package in packages {
        debug!(package = %package, "processing package");
        match client.download_apk(package, dest_dir, search).await {
            Ok(path) => downloaded.push(path),
            Err(source) => {
                let completed = downloaded
                    .iter()
                    .map(|p: &PathBuf| p.display().to_string())
                    .collect();
                return Err(BatchError::package(package, completed, source));
            }
        }
    }

    info!(count = downloaded.len(), "all packages downloaded");
    Ok(downloaded)
}

/// Resolves each package to its [`PackageInfo`] without downloading.
///
/// # Errors
///
/// Returns [`BatchError::Package`] for the first package that fails.
pub async fn resolve_packages(
    client: &FdroidClient,
    packages: &[String],
    search: bool,
) -> Result<Vec<PackageInfo>, BatchError> {
    let mut infos = Vec::with_capacity(packages.len());
    for package in packages {
        match client.get_latest_apk_info(package, search).await {
            Ok(info) => infos.push(info),
            Err(source) => {
                let completed = infos
                    .iter()
                    .map(|info: &PackageInfo| info.package_name.clone())
                    .collect();
                return Err(BatchError::package(package, completed, source));
            }
        }
    }
    Ok(infos)
}
