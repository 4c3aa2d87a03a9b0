//! F-Droid APK Downloader Library
//!
//! Resolves application package identifiers (optionally through the
//! repository's search page), scrapes the newest APK link from the package
//! page, and downloads it with resumable `.partial` staging.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Explicit runtime configuration (base URL, timeouts, accelerator)
//! - [`resolver`] - Search, disambiguation, and APK link scraping
//! - [`download`] - Resumable download engine (accelerator or HTTP streaming)
//! - [`fdroid`] - Client combining resolver and downloader over one HTTP session
//! - [`batch`] - Sequential multi-package processing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod download;
pub mod fdroid;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use batch::{BatchError, download_packages, resolve_packages};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use download::{DownloadError, DownloadTarget, Downloader, FetchStrategy, HttpClient};
pub use fdroid::{FdroidClient, FdroidError};
pub use resolver::{PackageInfo, PackageResolver, ResolveError, SearchResults};
